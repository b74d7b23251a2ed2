use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::format::ProviderError;
use crate::auth::jwt::Claims;
use crate::auth::{AuthError, Identity, IdentityProvider, JwtVerifier, MagicLink};
use crate::config::AppConfig;
use crate::database::models::{
    BalanceRequest, Commission, CommissionStatus, NewBalanceRequest, NewCommission, NewPurchase, Package,
    PackageInput, PackagePurchase, PaymentMethod, PaymentMethodInput, Profile, RequestFilter, RequestKind,
    RequestStatus, Role, Settlement,
};
use crate::database::{DatabaseError, Store};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_AUDIENCE: &str = "authenticated";

/// A fresh profile with a random id, an email and empty balances
pub fn profile(role: Role) -> Profile {
    let id = Uuid::new_v4();
    Profile {
        id,
        email: Some(format!("{}@example.test", id.simple())),
        full_name: Some(format!("Test {}", role)),
        role,
        balance: Decimal::ZERO,
        withdrawable_balance: Decimal::ZERO,
        referred_by: None,
        created_at: Utc::now(),
    }
}

/// Access token for `profile`, signed with the test secret
pub fn token_for(profile: &Profile) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: profile.id,
        email: profile.email.clone(),
        aud: TEST_AUDIENCE.to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("sign test token")
}

/// Application state over an in-memory store and a stub identity provider
pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    let mut config = AppConfig::development();
    config.auth.jwt_secret = Some(TEST_JWT_SECRET.to_string());
    config.auth.site_url = "https://app.example.test".to_string();
    AppState::new(config, store, Arc::new(StubIdentity::new()))
}

/// Verifies tokens locally and mints fake magic links
pub struct StubIdentity {
    verifier: JwtVerifier,
    reject_links: bool,
}

impl StubIdentity {
    pub fn new() -> Self {
        Self {
            verifier: JwtVerifier::new(TEST_JWT_SECRET, TEST_AUDIENCE).expect("test verifier"),
            reject_links: false,
        }
    }

    /// Every magic-link request fails the way the provider reports an unknown user
    pub fn rejecting_links() -> Self {
        Self {
            reject_links: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.verifier.verify(token)
    }

    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<MagicLink, AuthError> {
        if self.reject_links {
            return Err(AuthError::Rejected(ProviderError {
                status: 404,
                code: Some("user_not_found".to_string()),
                message: "User not found".to_string(),
            }));
        }
        Ok(MagicLink {
            email: email.to_string(),
            action_link: format!(
                "https://auth.example.test/verify?token=stub&type=magiclink&redirect_to={}",
                redirect_to
            ),
        })
    }
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    top_ups: Vec<BalanceRequest>,
    withdrawals: Vec<BalanceRequest>,
    payment_methods: Vec<PaymentMethod>,
    packages: Vec<Package>,
    purchases: Vec<PackagePurchase>,
    commissions: Vec<Commission>,
}

impl Tables {
    fn requests(&mut self, kind: RequestKind) -> &mut Vec<BalanceRequest> {
        match kind {
            RequestKind::TopUp => &mut self.top_ups,
            RequestKind::Withdrawal => &mut self.withdrawals,
        }
    }
}

/// `Store` kept in memory behind one lock, so every method is atomic
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose health check fails
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub async fn add_profile(&self, profile: Profile) -> Profile {
        self.tables.write().await.profiles.insert(profile.id, profile.clone());
        profile
    }

    pub async fn add_commission(&self, commission: NewCommission) -> Commission {
        let row = Commission {
            id: Uuid::new_v4(),
            user_id: commission.user_id,
            source_user_id: commission.source_user_id,
            purchase_id: None,
            level: commission.level,
            amount: commission.amount,
            status: CommissionStatus::Pending,
            created_at: Utc::now(),
        };
        self.tables.write().await.commissions.push(row.clone());
        row
    }

    /// Insert a request as-is, for back-dated or pre-settled fixtures
    pub async fn add_request(&self, kind: RequestKind, request: BalanceRequest) -> BalanceRequest {
        self.tables.write().await.requests(kind).push(request.clone());
        request
    }
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.offline {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DatabaseError> {
        let rows = self.tables.read().await.profiles.values().cloned().collect();
        Ok(newest_first(rows, |p: &Profile| p.created_at))
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.profiles.get(id).cloned()).collect())
    }

    async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<Profile, DatabaseError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))?;
        profile.role = role;
        Ok(profile.clone())
    }

    async fn insert_request(&self, kind: RequestKind, request: NewBalanceRequest) -> Result<BalanceRequest, DatabaseError> {
        let now = Utc::now();
        let row = BalanceRequest {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            amount: request.amount,
            status: RequestStatus::Pending,
            status_notes: request.status_notes,
            reviewed_by: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.requests(kind).push(row.clone());
        Ok(row)
    }

    async fn get_request(&self, kind: RequestKind, id: Uuid) -> Result<Option<BalanceRequest>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.requests(kind).iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(&self, kind: RequestKind, filter: &RequestFilter) -> Result<Vec<BalanceRequest>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let rows = tables.requests(kind).iter().filter(|r| filter.matches(r)).cloned().collect();
        Ok(newest_first(rows, |r: &BalanceRequest| r.created_at))
    }

    async fn settle_request(&self, kind: RequestKind, settlement: Settlement) -> Result<BalanceRequest, DatabaseError> {
        let mut tables = self.tables.write().await;
        let request = tables
            .requests(kind)
            .iter()
            .find(|r| r.id == settlement.id && r.status == RequestStatus::Pending)
            .cloned()
            .ok_or_else(|| DatabaseError::Conflict(format!("{} is no longer pending", kind.label())))?;

        if settlement.status == RequestStatus::Approved {
            let profile = tables.profiles.get_mut(&request.user_id).ok_or_else(|| kind.unsettled())?;
            match kind {
                RequestKind::TopUp => profile.balance += request.amount,
                RequestKind::Withdrawal => {
                    if profile.withdrawable_balance < request.amount {
                        return Err(kind.unsettled());
                    }
                    profile.withdrawable_balance -= request.amount;
                }
            }
        }

        let row = tables
            .requests(kind)
            .iter_mut()
            .find(|r| r.id == settlement.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", kind.label())))?;
        row.status = settlement.status;
        row.status_notes = settlement.status_notes;
        row.reviewed_by = Some(settlement.reviewed_by);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_payment_methods(&self, visible_only: bool) -> Result<Vec<PaymentMethod>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PaymentMethod> = tables
            .payment_methods
            .iter()
            .filter(|m| !visible_only || m.is_visible)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.label.cmp(&b.label)));
        Ok(rows)
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, DatabaseError> {
        Ok(self.tables.read().await.payment_methods.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_payment_method(&self, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError> {
        let mut tables = self.tables.write().await;
        if input.is_default {
            tables.payment_methods.iter_mut().for_each(|m| m.is_default = false);
        }
        let row = PaymentMethod {
            id: Uuid::new_v4(),
            method_type: input.method_type,
            label: input.label,
            account_name: input.account_name,
            account_number: input.account_number,
            is_visible: input.is_visible,
            is_default: input.is_default,
            qr_image_path: input.qr_image_path,
            created_at: Utc::now(),
        };
        tables.payment_methods.push(row.clone());
        Ok(row)
    }

    async fn update_payment_method(&self, id: Uuid, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.payment_methods.iter().any(|m| m.id == id) {
            return Err(DatabaseError::NotFound("Payment method not found".to_string()));
        }
        if input.is_default {
            tables.payment_methods.iter_mut().filter(|m| m.id != id).for_each(|m| m.is_default = false);
        }
        let row = tables
            .payment_methods
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DatabaseError::NotFound("Payment method not found".to_string()))?;
        row.method_type = input.method_type;
        row.label = input.label;
        row.account_name = input.account_name;
        row.account_number = input.account_number;
        row.is_visible = input.is_visible;
        row.is_default = input.is_default;
        row.qr_image_path = input.qr_image_path;
        Ok(row.clone())
    }

    async fn delete_payment_method(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.payment_methods.len();
        tables.payment_methods.retain(|m| m.id != id);
        if tables.payment_methods.len() == before {
            return Err(DatabaseError::NotFound("Payment method not found".to_string()));
        }
        Ok(())
    }

    async fn list_packages(&self, active_only: bool) -> Result<Vec<Package>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Package> = tables
            .packages
            .iter()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(rows)
    }

    async fn get_package(&self, id: Uuid) -> Result<Option<Package>, DatabaseError> {
        Ok(self.tables.read().await.packages.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_package(&self, input: PackageInput) -> Result<Package, DatabaseError> {
        let row = Package {
            id: Uuid::new_v4(),
            name: input.name,
            price: input.price,
            commission_rate: input.commission_rate,
            maturity_days: input.maturity_days,
            is_active: input.is_active,
            created_at: Utc::now(),
        };
        self.tables.write().await.packages.push(row.clone());
        Ok(row)
    }

    async fn update_package(&self, id: Uuid, input: PackageInput) -> Result<Package, DatabaseError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .packages
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DatabaseError::NotFound("Package not found".to_string()))?;
        row.name = input.name;
        row.price = input.price;
        row.commission_rate = input.commission_rate;
        row.maturity_days = input.maturity_days;
        row.is_active = input.is_active;
        Ok(row.clone())
    }

    async fn delete_package(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.packages.len();
        tables.packages.retain(|p| p.id != id);
        if tables.packages.len() == before {
            return Err(DatabaseError::NotFound("Package not found".to_string()));
        }
        Ok(())
    }

    async fn record_purchase(
        &self,
        purchase: NewPurchase,
        commissions: Vec<NewCommission>,
    ) -> Result<(PackagePurchase, Vec<Commission>), DatabaseError> {
        let mut tables = self.tables.write().await;
        let buyer = tables
            .profiles
            .get_mut(&purchase.user_id)
            .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))?;
        if buyer.balance < purchase.amount {
            return Err(DatabaseError::Conflict("Insufficient balance".to_string()));
        }
        buyer.balance -= purchase.amount;

        let stored = PackagePurchase {
            id: Uuid::new_v4(),
            user_id: purchase.user_id,
            package_id: purchase.package_id,
            amount: purchase.amount,
            purchased_at: purchase.purchased_at,
            matures_at: purchase.matures_at,
        };
        tables.purchases.push(stored.clone());

        let now = Utc::now();
        let created: Vec<Commission> = commissions
            .into_iter()
            .map(|c| Commission {
                id: Uuid::new_v4(),
                user_id: c.user_id,
                source_user_id: c.source_user_id,
                purchase_id: Some(stored.id),
                level: c.level,
                amount: c.amount,
                status: CommissionStatus::Pending,
                created_at: now,
            })
            .collect();
        tables.commissions.extend(created.iter().cloned());

        Ok((stored, created))
    }

    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<PackagePurchase>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.purchases.iter().filter(|p| p.user_id == user_id).cloned().collect();
        Ok(newest_first(rows, |p: &PackagePurchase| p.purchased_at))
    }

    async fn list_commissions(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<Commission>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables
            .commissions
            .iter()
            .filter(|c| user_id.map_or(true, |id| c.user_id == id))
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |c: &Commission| c.created_at))
    }

    async fn settle_commission(&self, id: Uuid, status: CommissionStatus) -> Result<Commission, DatabaseError> {
        let mut tables = self.tables.write().await;
        let commission = tables
            .commissions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DatabaseError::NotFound("Commission not found".to_string()))?;
        if commission.status != CommissionStatus::Pending {
            return Err(DatabaseError::Conflict("Commission is no longer pending".to_string()));
        }
        commission.status = status;
        let settled = commission.clone();

        if status == CommissionStatus::Paid {
            if let Some(earner) = tables.profiles.get_mut(&settled.user_id) {
                earner.withdrawable_balance += settled.amount;
            }
        }
        Ok(settled)
    }
}
