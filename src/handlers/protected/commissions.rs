use axum::extract::{Extension, State};

use crate::database::models::Commission;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CommissionService;
use crate::state::AppState;

/// GET /api/commissions - Commissions the caller has earned
pub async fn commissions_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Commission>> {
    let commissions = CommissionService::new(state.store.as_ref()).list(Some(user.id), None).await?;
    Ok(ApiResponse::success(commissions))
}
