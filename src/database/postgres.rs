use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    BalanceRequest, Commission, CommissionStatus, NewBalanceRequest, NewCommission, NewPurchase, Package,
    PackageInput, PackagePurchase, PaymentMethod, PaymentMethodInput, Profile, RequestFilter, RequestKind,
    RequestStatus, Role, Settlement,
};
use super::store::Store;

const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, balance, withdrawable_balance, referred_by, created_at";
const REQUEST_COLUMNS: &str =
    "id, user_id, amount, status, status_notes, reviewed_by, created_at, updated_at";
const PAYMENT_METHOD_COLUMNS: &str =
    "id, method_type, label, account_name, account_number, is_visible, is_default, qr_image_path, created_at";
const PACKAGE_COLUMNS: &str = "id, name, price, commission_rate, maturity_days, is_active, created_at";
const PURCHASE_COLUMNS: &str = "id, user_id, package_id, amount, purchased_at, matures_at";
const COMMISSION_COLUMNS: &str = "id, user_id, source_user_id, purchase_id, level, amount, status, created_at";

/// `Store` backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles ORDER BY created_at DESC", PROFILE_COLUMNS);
        let profiles = sqlx::query_as::<_, Profile>(&sql).fetch_all(&self.pool).await?;
        Ok(profiles)
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM profiles WHERE id = ANY($1)", PROFILE_COLUMNS);
        let profiles = sqlx::query_as::<_, Profile>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<Profile, DatabaseError> {
        let sql = format!("UPDATE profiles SET role = $2 WHERE id = $1 RETURNING {}", PROFILE_COLUMNS);
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))
    }

    async fn insert_request(&self, kind: RequestKind, request: NewBalanceRequest) -> Result<BalanceRequest, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (user_id, amount, status, status_notes) VALUES ($1, $2, 'pending', $3) RETURNING {}",
            kind.table(),
            REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, BalanceRequest>(&sql)
            .bind(request.user_id)
            .bind(request.amount)
            .bind(request.status_notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_request(&self, kind: RequestKind, id: Uuid) -> Result<Option<BalanceRequest>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", REQUEST_COLUMNS, kind.table());
        let row = sqlx::query_as::<_, BalanceRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_requests(&self, kind: RequestKind, filter: &RequestFilter) -> Result<Vec<BalanceRequest>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
             AND ($2::text IS NULL OR status = $2) \
             AND ($3::timestamptz IS NULL OR created_at >= $3) \
             AND ($4::timestamptz IS NULL OR created_at < $4) \
             ORDER BY created_at DESC",
            REQUEST_COLUMNS,
            kind.table()
        );
        let rows = sqlx::query_as::<_, BalanceRequest>(&sql)
            .bind(filter.user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.created_from)
            .bind(filter.created_before)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn settle_request(&self, kind: RequestKind, settlement: Settlement) -> Result<BalanceRequest, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE {} SET status = $2, status_notes = $3, reviewed_by = $4, updated_at = now() \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            kind.table(),
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, BalanceRequest>(&sql)
            .bind(settlement.id)
            .bind(settlement.status.as_str())
            .bind(&settlement.status_notes)
            .bind(settlement.reviewed_by)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::Conflict(format!("{} is no longer pending", kind.label())))?;

        if request.status == RequestStatus::Approved {
            let balance_sql = match kind {
                RequestKind::TopUp => "UPDATE profiles SET balance = balance + $2 WHERE id = $1",
                RequestKind::Withdrawal => {
                    "UPDATE profiles SET withdrawable_balance = withdrawable_balance - $2 \
                     WHERE id = $1 AND withdrawable_balance >= $2"
                }
            };
            let result = sqlx::query(balance_sql)
                .bind(request.user_id)
                .bind(request.amount)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls the status change back
                return Err(kind.unsettled());
            }
        }

        tx.commit().await?;
        Ok(request)
    }

    async fn list_payment_methods(&self, visible_only: bool) -> Result<Vec<PaymentMethod>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM payment_methods WHERE ($1 = false OR is_visible) ORDER BY is_default DESC, label",
            PAYMENT_METHOD_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(visible_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, DatabaseError> {
        let sql = format!("SELECT {} FROM payment_methods WHERE id = $1", PAYMENT_METHOD_COLUMNS);
        let row = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_payment_method(&self, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE payment_methods SET is_default = false WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO payment_methods \
             (method_type, label, account_name, account_number, is_visible, is_default, qr_image_path) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PAYMENT_METHOD_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(input.method_type)
            .bind(input.label)
            .bind(input.account_name)
            .bind(input.account_number)
            .bind(input.is_visible)
            .bind(input.is_default)
            .bind(input.qr_image_path)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn update_payment_method(&self, id: Uuid, input: PaymentMethodInput) -> Result<PaymentMethod, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE payment_methods SET is_default = false WHERE is_default AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "UPDATE payment_methods SET method_type = $2, label = $3, account_name = $4, account_number = $5, \
             is_visible = $6, is_default = $7, qr_image_path = $8 WHERE id = $1 RETURNING {}",
            PAYMENT_METHOD_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .bind(input.method_type)
            .bind(input.label)
            .bind(input.account_name)
            .bind(input.account_number)
            .bind(input.is_visible)
            .bind(input.is_default)
            .bind(input.qr_image_path)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Payment method not found".to_string()))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn delete_payment_method(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Payment method not found".to_string()));
        }
        Ok(())
    }

    async fn list_packages(&self, active_only: bool) -> Result<Vec<Package>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM packages WHERE ($1 = false OR is_active) ORDER BY price",
            PACKAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Package>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_package(&self, id: Uuid) -> Result<Option<Package>, DatabaseError> {
        let sql = format!("SELECT {} FROM packages WHERE id = $1", PACKAGE_COLUMNS);
        let row = sqlx::query_as::<_, Package>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_package(&self, input: PackageInput) -> Result<Package, DatabaseError> {
        let sql = format!(
            "INSERT INTO packages (name, price, commission_rate, maturity_days, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PACKAGE_COLUMNS
        );
        let row = sqlx::query_as::<_, Package>(&sql)
            .bind(input.name)
            .bind(input.price)
            .bind(input.commission_rate)
            .bind(input.maturity_days)
            .bind(input.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_package(&self, id: Uuid, input: PackageInput) -> Result<Package, DatabaseError> {
        let sql = format!(
            "UPDATE packages SET name = $2, price = $3, commission_rate = $4, maturity_days = $5, is_active = $6 \
             WHERE id = $1 RETURNING {}",
            PACKAGE_COLUMNS
        );
        sqlx::query_as::<_, Package>(&sql)
            .bind(id)
            .bind(input.name)
            .bind(input.price)
            .bind(input.commission_rate)
            .bind(input.maturity_days)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Package not found".to_string()))
    }

    async fn delete_package(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Package not found".to_string()));
        }
        Ok(())
    }

    async fn record_purchase(
        &self,
        purchase: NewPurchase,
        commissions: Vec<NewCommission>,
    ) -> Result<(PackagePurchase, Vec<Commission>), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let debited = sqlx::query("UPDATE profiles SET balance = balance - $2 WHERE id = $1 AND balance >= $2")
            .bind(purchase.user_id)
            .bind(purchase.amount)
            .execute(&mut *tx)
            .await?;
        if debited.rows_affected() == 0 {
            return Err(DatabaseError::Conflict("Insufficient balance".to_string()));
        }

        let sql = format!(
            "INSERT INTO package_purchases (user_id, package_id, amount, purchased_at, matures_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PURCHASE_COLUMNS
        );
        let stored = sqlx::query_as::<_, PackagePurchase>(&sql)
            .bind(purchase.user_id)
            .bind(purchase.package_id)
            .bind(purchase.amount)
            .bind(purchase.purchased_at)
            .bind(purchase.matures_at)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO commissions (user_id, source_user_id, purchase_id, level, amount, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') RETURNING {}",
            COMMISSION_COLUMNS
        );
        let mut created = Vec::with_capacity(commissions.len());
        for commission in commissions {
            let row = sqlx::query_as::<_, Commission>(&sql)
                .bind(commission.user_id)
                .bind(commission.source_user_id)
                .bind(stored.id)
                .bind(commission.level)
                .bind(commission.amount)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok((stored, created))
    }

    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<PackagePurchase>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM package_purchases WHERE user_id = $1 ORDER BY purchased_at DESC",
            PURCHASE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PackagePurchase>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_commissions(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<Commission>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM commissions \
             WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC",
            COMMISSION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Commission>(&sql)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn settle_commission(&self, id: Uuid, status: CommissionStatus) -> Result<Commission, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE commissions SET status = $2 WHERE id = $1 AND status = 'pending' RETURNING {}",
            COMMISSION_COLUMNS
        );
        let commission = sqlx::query_as::<_, Commission>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let commission = match commission {
            Some(c) => c,
            None => {
                let exists = sqlx::query("SELECT 1 FROM commissions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .is_some();
                return Err(if exists {
                    DatabaseError::Conflict("Commission is no longer pending".to_string())
                } else {
                    DatabaseError::NotFound("Commission not found".to_string())
                });
            }
        };

        if commission.status == CommissionStatus::Paid {
            sqlx::query("UPDATE profiles SET withdrawable_balance = withdrawable_balance + $2 WHERE id = $1")
                .bind(commission.user_id)
                .bind(commission.amount)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(commission)
    }
}
