use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;
use crate::database::DatabaseError;

/// Top-ups and withdrawals share one row shape but live in separate tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    TopUp,
    Withdrawal,
}

impl RequestKind {
    pub fn table(&self) -> &'static str {
        match self {
            RequestKind::TopUp => "top_up_requests",
            RequestKind::Withdrawal => "withdrawal_requests",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::TopUp => "Top-up request",
            RequestKind::Withdrawal => "Withdrawal request",
        }
    }

    /// Error for an approval whose balance update matched no profile row
    pub fn unsettled(&self) -> DatabaseError {
        match self {
            RequestKind::TopUp => DatabaseError::NotFound("Requester profile not found".to_string()),
            RequestKind::Withdrawal => DatabaseError::Conflict("Insufficient withdrawable balance".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(UnknownVariant { kind: "request status", value }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalanceRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub status_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBalanceRequest {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub status_notes: Option<String>,
}

/// Row filter for request listings; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl RequestFilter {
    pub fn matches(&self, request: &BalanceRequest) -> bool {
        self.user_id.map_or(true, |id| request.user_id == id)
            && self.status.map_or(true, |status| request.status == status)
            && self.created_from.map_or(true, |from| request.created_at >= from)
            && self.created_before.map_or(true, |before| request.created_at < before)
    }
}

/// Outcome of a review, applied to a pending request
#[derive(Debug, Clone)]
pub struct Settlement {
    pub id: Uuid,
    pub status: RequestStatus,
    pub status_notes: Option<String>,
    pub reviewed_by: Uuid,
}
