use axum::extract::State;

use crate::database::models::PaymentMethod;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PaymentMethodService;
use crate::state::AppState;

/// GET /api/payment-methods - Visible payment methods, default first
pub async fn payment_methods_list(State(state): State<AppState>) -> ApiResult<Vec<PaymentMethod>> {
    let methods = PaymentMethodService::new(state.store.as_ref()).list(true).await?;
    Ok(ApiResponse::success(methods))
}
