use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<String> for CommissionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(CommissionStatus::Pending),
            "paid" => Ok(CommissionStatus::Paid),
            "cancelled" => Ok(CommissionStatus::Cancelled),
            _ => Err(UnknownVariant { kind: "commission status", value }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commission {
    pub id: Uuid,
    /// Profile that earns the commission
    pub user_id: Uuid,
    /// Profile whose purchase generated it
    pub source_user_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub level: i32,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCommission {
    pub user_id: Uuid,
    pub source_user_id: Uuid,
    pub level: i32,
    pub amount: Decimal,
}
