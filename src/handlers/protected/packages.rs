use axum::extract::{Extension, State};
use uuid::Uuid;

use crate::api::extract::Path;
use crate::database::models::{Package, PackagePurchase};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::package_service::PurchaseReceipt;
use crate::services::PackageService;
use crate::state::AppState;

/// GET /api/packages - Active packages, cheapest first
pub async fn packages_list(State(state): State<AppState>) -> ApiResult<Vec<Package>> {
    let packages = PackageService::new(state.store.as_ref(), &state.config.wallet).list(true).await?;
    Ok(ApiResponse::success(packages))
}

/// POST /api/packages/:id/purchase - Buy a package from the caller's balance
///
/// Returns the purchase and the referral commissions it generated.
pub async fn package_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<PurchaseReceipt> {
    let receipt = PackageService::new(state.store.as_ref(), &state.config.wallet)
        .purchase(&user.profile, id)
        .await?;
    Ok(ApiResponse::created(receipt))
}

/// GET /api/purchases - The caller's package purchases
pub async fn purchases_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<PackagePurchase>> {
    let purchases = PackageService::new(state.store.as_ref(), &state.config.wallet)
        .purchases(user.id)
        .await?;
    Ok(ApiResponse::success(purchases))
}
