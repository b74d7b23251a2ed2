use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    BalanceRequest, Commission, CommissionStatus, NewBalanceRequest, NewCommission, NewPurchase, Package,
    PackageInput, PackagePurchase, PaymentMethod, PaymentMethodInput, Profile, RequestFilter, RequestKind, Role,
    Settlement,
};

/// Everything the route handlers need from the hosted database.
///
/// Methods that move money (`settle_request`, `record_purchase`,
/// `settle_commission`) must apply their row changes atomically and only
/// touch rows that are still pending.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // profiles
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError>;
    async fn list_profiles(&self) -> Result<Vec<Profile>, DatabaseError>;
    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError>;
    async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<Profile, DatabaseError>;

    // top-up and withdrawal requests
    async fn insert_request(&self, kind: RequestKind, request: NewBalanceRequest) -> Result<BalanceRequest, DatabaseError>;
    async fn get_request(&self, kind: RequestKind, id: Uuid) -> Result<Option<BalanceRequest>, DatabaseError>;
    async fn list_requests(&self, kind: RequestKind, filter: &RequestFilter) -> Result<Vec<BalanceRequest>, DatabaseError>;
    /// Approving a top-up credits `balance`; approving a withdrawal debits
    /// `withdrawable_balance` and fails with `Conflict` if it would go negative.
    async fn settle_request(&self, kind: RequestKind, settlement: Settlement) -> Result<BalanceRequest, DatabaseError>;

    // payment methods
    async fn list_payment_methods(&self, visible_only: bool) -> Result<Vec<PaymentMethod>, DatabaseError>;
    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, DatabaseError>;
    async fn insert_payment_method(&self, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError>;
    async fn update_payment_method(&self, id: Uuid, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError>;
    async fn delete_payment_method(&self, id: Uuid) -> Result<(), DatabaseError>;

    // packages
    async fn list_packages(&self, active_only: bool) -> Result<Vec<Package>, DatabaseError>;
    async fn get_package(&self, id: Uuid) -> Result<Option<Package>, DatabaseError>;
    async fn insert_package(&self, input: PackageInput) -> Result<Package, DatabaseError>;
    async fn update_package(&self, id: Uuid, input: PackageInput) -> Result<Package, DatabaseError>;
    async fn delete_package(&self, id: Uuid) -> Result<(), DatabaseError>;

    // purchases and commissions
    /// Debits the buyer's `balance`, stores the purchase and its commissions.
    async fn record_purchase(
        &self,
        purchase: NewPurchase,
        commissions: Vec<NewCommission>,
    ) -> Result<(PackagePurchase, Vec<Commission>), DatabaseError>;
    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<PackagePurchase>, DatabaseError>;
    async fn list_commissions(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<Commission>, DatabaseError>;
    /// Moves a pending commission to `status`; `Paid` credits the earner's `withdrawable_balance`.
    async fn settle_commission(&self, id: Uuid, status: CommissionStatus) -> Result<Commission, DatabaseError>;
}
