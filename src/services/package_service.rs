use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::commission_service::CommissionService;
use super::{validate_amount, ServiceError};
use crate::config::WalletConfig;
use crate::database::models::{Commission, NewPurchase, Package, PackageInput, PackagePurchase, Profile};
use crate::database::{DatabaseError, Store};

#[derive(Debug, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: PackagePurchase,
    pub commissions: Vec<Commission>,
}

/// Investment package catalog and purchases
pub struct PackageService<'a> {
    store: &'a dyn Store,
    config: &'a WalletConfig,
}

impl<'a> PackageService<'a> {
    pub fn new(store: &'a dyn Store, config: &'a WalletConfig) -> Self {
        Self { store, config }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Package>, ServiceError> {
        Ok(self.store.list_packages(active_only).await?)
    }

    pub async fn create(&self, input: PackageInput) -> Result<Package, ServiceError> {
        let input = validate_package(input)?;
        let package = self.store.insert_package(input).await?;
        tracing::info!("Package {} ({}) created", package.id, package.name);
        Ok(package)
    }

    pub async fn update(&self, id: Uuid, input: PackageInput) -> Result<Package, ServiceError> {
        let input = validate_package(input)?;
        Ok(self.store.update_package(id, input).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.delete_package(id).await?;
        tracing::info!("Package {} deleted", id);
        Ok(())
    }

    pub async fn purchases(&self, user_id: Uuid) -> Result<Vec<PackagePurchase>, ServiceError> {
        Ok(self.store.list_purchases(user_id).await?)
    }

    /// Buy a package from the caller's balance and pay the referral network
    pub async fn purchase(&self, buyer: &Profile, package_id: Uuid) -> Result<PurchaseReceipt, ServiceError> {
        let package = self
            .store
            .get_package(package_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::NotFound("Package not found".to_string()))?;

        if buyer.balance < package.price {
            return Err(ServiceError::BadRequest("Insufficient balance".to_string()));
        }

        let commissions = CommissionService::new(self.store)
            .plan(buyer, &package, &self.config.commission_level_shares)
            .await?;

        let purchased_at = Utc::now();
        let purchase = NewPurchase {
            user_id: buyer.id,
            package_id: package.id,
            amount: package.price,
            purchased_at,
            matures_at: purchased_at + Duration::days(i64::from(package.maturity_days)),
        };

        let (purchase, commissions) = match self.store.record_purchase(purchase, commissions).await {
            Ok(recorded) => recorded,
            // Balance moved between our check and the debit
            Err(DatabaseError::Conflict(msg)) => return Err(ServiceError::BadRequest(msg)),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "Package {} bought by {} for {} ({} commissions)",
            package.id,
            buyer.id,
            package.price,
            commissions.len()
        );

        Ok(PurchaseReceipt { purchase, commissions })
    }
}

fn validate_package(mut input: PackageInput) -> Result<PackageInput, ServiceError> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(ServiceError::invalid("name", "Name is required"));
    }
    validate_amount("price", input.price)?;
    if input.commission_rate < Decimal::ZERO || input.commission_rate > Decimal::ONE_HUNDRED {
        return Err(ServiceError::invalid("commission_rate", "Commission rate must be between 0 and 100"));
    }
    if input.maturity_days < 0 {
        return Err(ServiceError::invalid("maturity_days", "Maturity cannot be negative"));
    }
    Ok(input)
}
