use axum::extract::{Extension, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::Json;
use crate::database::models::{BalanceRequest, RequestKind};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::WalletService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: Decimal,
    pub payment_method_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// GET /api/top-ups - The caller's top-up requests, newest first
pub async fn top_ups_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<BalanceRequest>> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    Ok(ApiResponse::success(wallet.list_own(RequestKind::TopUp, user.id).await?))
}

/// POST /api/top-ups - Ask for a balance top-up
///
/// ```json
/// { "amount": "250.00", "notes": "bank transfer ref 8812" }
/// ```
pub async fn top_ups_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<TopUpRequest>,
) -> ApiResult<BalanceRequest> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    let request = wallet.create_top_up(&user.profile, body.amount, body.notes).await?;
    Ok(ApiResponse::created(request))
}

/// GET /api/withdrawals - The caller's withdrawal requests, newest first
pub async fn withdrawals_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<BalanceRequest>> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    Ok(ApiResponse::success(wallet.list_own(RequestKind::Withdrawal, user.id).await?))
}

/// POST /api/withdrawals - Ask for a payout from the withdrawable balance
pub async fn withdrawals_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<WithdrawalRequest>,
) -> ApiResult<BalanceRequest> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    let request = wallet
        .create_withdrawal(&user.profile, body.amount, body.payment_method_id, body.notes)
        .await?;
    Ok(ApiResponse::created(request))
}
