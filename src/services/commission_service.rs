use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{Commission, CommissionStatus, NewCommission, Package, Profile};
use crate::database::Store;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Referral commissions: planning them on purchase, listing and paying them out
pub struct CommissionService<'a> {
    store: &'a dyn Store,
}

impl<'a> CommissionService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Walk the buyer's referral chain and price one commission per level.
    ///
    /// Level n earns `price * commission_rate% * level_shares[n-1]%`. The walk
    /// ends at the first missing referrer, after the last configured level,
    /// or when it would revisit a profile.
    pub async fn plan(
        &self,
        buyer: &Profile,
        package: &Package,
        level_shares: &[Decimal],
    ) -> Result<Vec<NewCommission>, ServiceError> {
        let mut planned = Vec::new();
        let mut visited = HashSet::from([buyer.id]);
        let mut next = buyer.referred_by;

        for (index, share) in level_shares.iter().enumerate() {
            let Some(referrer_id) = next else { break };
            if !visited.insert(referrer_id) {
                tracing::warn!("Referral cycle detected at {} while paying out for {}", referrer_id, buyer.id);
                break;
            }

            let Some(referrer) = self.store.get_profile(referrer_id).await? else { break };

            let amount = commission_amount(package.price, package.commission_rate, *share);
            if amount > Decimal::ZERO {
                planned.push(NewCommission {
                    user_id: referrer.id,
                    source_user_id: buyer.id,
                    level: index as i32 + 1,
                    amount,
                });
            }
            next = referrer.referred_by;
        }

        Ok(planned)
    }

    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<Commission>, ServiceError> {
        Ok(self.store.list_commissions(user_id, status).await?)
    }

    /// Mark a pending commission paid (crediting the earner) or cancelled
    pub async fn settle(&self, id: Uuid, status: CommissionStatus) -> Result<Commission, ServiceError> {
        if status == CommissionStatus::Pending {
            return Err(ServiceError::invalid("status", "Commission can only be marked paid or cancelled"));
        }

        let commission = self.store.settle_commission(id, status).await?;
        tracing::info!(
            "Commission {} for {} marked {} ({})",
            commission.id,
            commission.user_id,
            status.as_str(),
            commission.amount
        );
        Ok(commission)
    }
}

/// Rounded to cents, half away from zero
pub fn commission_amount(price: Decimal, rate_percent: Decimal, share_percent: Decimal) -> Decimal {
    (price * rate_percent / HUNDRED * share_percent / HUNDRED)
        .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
