use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{Json, Path, Query};
use crate::database::models::{Commission, CommissionStatus};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{CashflowQuery, CashflowReport, CashflowService, CommissionService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommissionQuery {
    pub status: Option<CommissionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CommissionUpdate {
    pub status: CommissionStatus,
}

/// GET /api/accounting/cashflow - Sales, payouts and revenue for a window
///
/// One of `?date=2026-01-05`, `?from=2026-01-01&to=2026-01-31` or
/// `?month=2026-01`, plus an optional `group_by=day|month`.
pub async fn cashflow_get(
    State(state): State<AppState>,
    Query(query): Query<CashflowQuery>,
) -> ApiResult<CashflowReport> {
    let report = CashflowService::new(state.store.as_ref()).report(&query).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/accounting/commissions?status= - Every commission, newest first
pub async fn commissions_list(
    State(state): State<AppState>,
    Query(query): Query<CommissionQuery>,
) -> ApiResult<Vec<Commission>> {
    let commissions = CommissionService::new(state.store.as_ref()).list(None, query.status).await?;
    Ok(ApiResponse::success(commissions))
}

/// PATCH /api/accounting/commissions/:id - Mark a pending commission paid or cancelled
pub async fn commission_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CommissionUpdate>,
) -> ApiResult<Commission> {
    let commission = CommissionService::new(state.store.as_ref()).settle(id, body.status).await?;
    Ok(ApiResponse::success(commission))
}
