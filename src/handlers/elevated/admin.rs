use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::extract::{Json, Path};
use crate::auth::MagicLink;
use crate::database::models::{Package, PackageInput, PaymentMethod, PaymentMethodInput, Profile, Role};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{ImpersonationService, PackageService, PaymentMethodService, ProfileService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub user_id: Uuid,
}

fn deleted(id: Uuid) -> Value {
    json!({ "id": id, "deleted": true })
}

// Packages

/// POST /api/admin/packages - Add a package to the catalog
pub async fn package_create(State(state): State<AppState>, Json(input): Json<PackageInput>) -> ApiResult<Package> {
    let package = PackageService::new(state.store.as_ref(), &state.config.wallet).create(input).await?;
    Ok(ApiResponse::created(package))
}

/// PUT /api/admin/packages/:id
pub async fn package_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PackageInput>,
) -> ApiResult<Package> {
    let package = PackageService::new(state.store.as_ref(), &state.config.wallet).update(id, input).await?;
    Ok(ApiResponse::success(package))
}

/// DELETE /api/admin/packages/:id
pub async fn package_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    PackageService::new(state.store.as_ref(), &state.config.wallet).delete(id).await?;
    Ok(ApiResponse::success(deleted(id)))
}

// Payment methods

/// GET /api/admin/payment-methods - All methods, hidden ones included
pub async fn payment_methods_list(State(state): State<AppState>) -> ApiResult<Vec<PaymentMethod>> {
    let methods = PaymentMethodService::new(state.store.as_ref()).list(false).await?;
    Ok(ApiResponse::success(methods))
}

/// POST /api/admin/payment-methods
///
/// ```json
/// {
///   "method_type": "bank",
///   "label": "BCA",
///   "account_name": "Cashflow Ltd",
///   "account_number": "123-456",
///   "is_default": true,
///   "qr_image_path": "qr/bca.png"
/// }
/// ```
pub async fn payment_method_create(
    State(state): State<AppState>,
    Json(input): Json<PaymentMethodInput>,
) -> ApiResult<PaymentMethod> {
    let method = PaymentMethodService::new(state.store.as_ref()).create(input).await?;
    Ok(ApiResponse::created(method))
}

/// PUT /api/admin/payment-methods/:id
pub async fn payment_method_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PaymentMethodInput>,
) -> ApiResult<PaymentMethod> {
    let method = PaymentMethodService::new(state.store.as_ref()).update(id, input).await?;
    Ok(ApiResponse::success(method))
}

/// DELETE /api/admin/payment-methods/:id
pub async fn payment_method_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    PaymentMethodService::new(state.store.as_ref()).delete(id).await?;
    Ok(ApiResponse::success(deleted(id)))
}

// Users

/// GET /api/admin/users - Every profile, newest first
pub async fn users_list(State(state): State<AppState>) -> ApiResult<Vec<Profile>> {
    let profiles = ProfileService::new(state.store.as_ref()).list().await?;
    Ok(ApiResponse::success(profiles))
}

/// PUT /api/admin/users/:id/role - Assign a role (`{ "role": "merchant" }`)
pub async fn user_role_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleUpdate>,
) -> ApiResult<Profile> {
    let profile = ProfileService::new(state.store.as_ref())
        .change_role(&user.profile, id, body.role)
        .await?;
    Ok(ApiResponse::success(profile))
}

/// POST /api/admin/impersonate - Magic link that signs the admin in as `user_id`
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "email": "target@example.com",
///     "action_link": "https://<project>.supabase.co/auth/v1/verify?token=...&type=magiclink&redirect_to=..."
///   }
/// }
/// ```
pub async fn impersonate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ImpersonateRequest>,
) -> ApiResult<MagicLink> {
    let link = ImpersonationService::new(state.store.as_ref(), state.identity.as_ref(), &state.config.auth.site_url)
        .impersonate(user.id, body.user_id)
        .await?;
    Ok(ApiResponse::success(link))
}
