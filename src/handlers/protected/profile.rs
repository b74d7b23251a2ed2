use axum::extract::{Extension, State};

use crate::database::models::Profile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ProfileService;
use crate::state::AppState;

/// GET /api/profile - The caller's own profile, read fresh
pub async fn profile_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Profile> {
    let profile = ProfileService::new(state.store.as_ref()).get(user.id).await?;
    Ok(ApiResponse::success(profile))
}
