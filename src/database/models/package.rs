use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    /// Percent of the price paid out to the referral network
    pub commission_rate: Decimal,
    pub maturity_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInput {
    pub name: String,
    pub price: Decimal,
    pub commission_rate: Decimal,
    pub maturity_days: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PackagePurchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub amount: Decimal,
    pub purchased_at: DateTime<Utc>,
    pub matures_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub amount: Decimal,
    pub purchased_at: DateTime<Utc>,
    pub matures_at: DateTime<Utc>,
}
