use axum::extract::{Extension, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{Json, Path, Query};
use crate::database::models::{BalanceRequest, RequestKind, RequestStatus};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::wallet_service::RequestView;
use crate::services::{ReviewDecision, WalletService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<RequestStatus>,
}

/// Body of a review decision
///
/// ```json
/// { "decision": "approve", "notes": "transfer received" }
/// ```
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    pub notes: Option<String>,
}

async fn list(state: &AppState, kind: RequestKind, query: StatusQuery) -> ApiResult<Vec<RequestView>> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    Ok(ApiResponse::success(wallet.list_for_review(kind, query.status).await?))
}

async fn review(state: &AppState, kind: RequestKind, id: Uuid, reviewer: &AuthUser, body: ReviewBody) -> ApiResult<BalanceRequest> {
    let wallet = WalletService::new(state.store.as_ref(), &state.config.wallet);
    let settled = wallet.review(kind, id, body.decision, body.notes, &reviewer.profile).await?;
    Ok(ApiResponse::success(settled))
}

/// GET /api/review/top-ups?status= - All top-up requests with their requesters
pub async fn top_ups_list(State(state): State<AppState>, Query(query): Query<StatusQuery>) -> ApiResult<Vec<RequestView>> {
    list(&state, RequestKind::TopUp, query).await
}

/// POST /api/review/top-ups/:id - Approve (credits balance) or reject a pending top-up
pub async fn top_up_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> ApiResult<BalanceRequest> {
    review(&state, RequestKind::TopUp, id, &user, body).await
}

/// GET /api/review/withdrawals?status= - All withdrawals with requester and payment method
pub async fn withdrawals_list(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Vec<RequestView>> {
    list(&state, RequestKind::Withdrawal, query).await
}

/// POST /api/review/withdrawals/:id - Approve (debits withdrawable balance) or reject
pub async fn withdrawal_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> ApiResult<BalanceRequest> {
    review(&state, RequestKind::Withdrawal, id, &user, body).await
}
