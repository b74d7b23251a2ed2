use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{validate_amount, ServiceError};
use crate::config::WalletConfig;
use crate::database::models::payment_method::resolve_reference;
use crate::database::models::{
    BalanceRequest, NewBalanceRequest, PaymentMethod, Profile, RequestFilter, RequestKind, RequestStatus, Settlement,
};
use crate::database::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// The requester as shown to reviewers
#[derive(Debug, Clone, Serialize)]
pub struct RequesterSummary {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl From<&Profile> for RequesterSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
        }
    }
}

/// A request enriched with its requester and, for withdrawals, the payment method
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: BalanceRequest,
    pub requester: Option<RequesterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// Top-ups, withdrawals and their review
pub struct WalletService<'a> {
    store: &'a dyn Store,
    config: &'a WalletConfig,
}

impl<'a> WalletService<'a> {
    pub fn new(store: &'a dyn Store, config: &'a WalletConfig) -> Self {
        Self { store, config }
    }

    pub async fn create_top_up(
        &self,
        user: &Profile,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<BalanceRequest, ServiceError> {
        validate_amount("amount", amount)?;

        let request = self
            .store
            .insert_request(
                RequestKind::TopUp,
                NewBalanceRequest {
                    user_id: user.id,
                    amount,
                    status_notes: clean_notes(notes),
                },
            )
            .await?;

        tracing::info!("Top-up request {} created by {} for {}", request.id, user.id, amount);
        Ok(request)
    }

    pub async fn create_withdrawal(
        &self,
        user: &Profile,
        amount: Decimal,
        payment_method_id: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<BalanceRequest, ServiceError> {
        validate_amount("amount", amount)?;

        if amount < self.config.min_withdrawal {
            return Err(ServiceError::invalid(
                "amount",
                format!("Minimum withdrawal is {}", self.config.min_withdrawal),
            ));
        }

        // Pending withdrawals already claim part of the balance
        let pending = RequestFilter {
            user_id: Some(user.id),
            status: Some(RequestStatus::Pending),
            ..Default::default()
        };
        let reserved: Decimal = self
            .store
            .list_requests(RequestKind::Withdrawal, &pending)
            .await?
            .iter()
            .map(|r| r.amount)
            .sum();
        if amount > user.withdrawable_balance - reserved {
            let message = if reserved.is_zero() {
                "Insufficient withdrawable balance".to_string()
            } else {
                format!("Insufficient withdrawable balance, {} is already pending withdrawal", reserved)
            };
            return Err(ServiceError::invalid("amount", message));
        }

        let reference = match payment_method_id {
            Some(id) => {
                let method = self
                    .store
                    .get_payment_method(id)
                    .await?
                    .filter(|m| m.is_visible)
                    .ok_or_else(|| ServiceError::invalid("payment_method_id", "Unknown payment method"))?;
                Some(method.notes_reference())
            }
            None => None,
        };

        let status_notes = merge_notes(reference, clean_notes(notes));
        let request = self
            .store
            .insert_request(
                RequestKind::Withdrawal,
                NewBalanceRequest {
                    user_id: user.id,
                    amount,
                    status_notes,
                },
            )
            .await?;

        tracing::info!("Withdrawal request {} created by {} for {}", request.id, user.id, amount);
        Ok(request)
    }

    /// The caller's own requests, newest first
    pub async fn list_own(&self, kind: RequestKind, user_id: Uuid) -> Result<Vec<BalanceRequest>, ServiceError> {
        let filter = RequestFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        Ok(self.store.list_requests(kind, &filter).await?)
    }

    /// All requests for reviewers, enriched with requester and payment method
    pub async fn list_for_review(
        &self,
        kind: RequestKind,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestView>, ServiceError> {
        let filter = RequestFilter {
            status,
            ..Default::default()
        };
        let requests = self.store.list_requests(kind, &filter).await?;
        self.enrich(kind, requests).await
    }

    async fn enrich(&self, kind: RequestKind, requests: Vec<BalanceRequest>) -> Result<Vec<RequestView>, ServiceError> {
        let mut user_ids: Vec<Uuid> = requests.iter().map(|r| r.user_id).collect();
        user_ids.sort();
        user_ids.dedup();

        // Independent reads, fetched concurrently
        let (profiles, methods) = match kind {
            RequestKind::Withdrawal => tokio::try_join!(
                self.store.profiles_by_ids(&user_ids),
                self.store.list_payment_methods(false)
            )?,
            RequestKind::TopUp => (self.store.profiles_by_ids(&user_ids).await?, Vec::new()),
        };

        let profiles: HashMap<Uuid, Profile> = profiles.into_iter().map(|p| (p.id, p)).collect();

        Ok(requests
            .into_iter()
            .map(|request| {
                let requester = profiles.get(&request.user_id).map(RequesterSummary::from);
                let payment_method = request
                    .status_notes
                    .as_deref()
                    .and_then(|notes| resolve_reference(notes, &methods))
                    .cloned();
                RequestView {
                    request,
                    requester,
                    payment_method,
                }
            })
            .collect())
    }

    /// Approve or reject a pending request. Approval moves the money.
    pub async fn review(
        &self,
        kind: RequestKind,
        id: Uuid,
        decision: ReviewDecision,
        notes: Option<String>,
        reviewer: &Profile,
    ) -> Result<BalanceRequest, ServiceError> {
        let request = self
            .store
            .get_request(kind, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} not found", kind.label())))?;

        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "{} has already been {}",
                kind.label(),
                request.status.as_str()
            )));
        }

        if decision == ReviewDecision::Approve && kind == RequestKind::Withdrawal {
            let requester = self
                .store
                .get_profile(request.user_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Requester profile not found".to_string()))?;
            if requester.withdrawable_balance < request.amount {
                return Err(ServiceError::BadRequest(
                    "Requester no longer has enough withdrawable balance".to_string(),
                ));
            }
        }

        let status = match decision {
            ReviewDecision::Approve => RequestStatus::Approved,
            ReviewDecision::Reject => RequestStatus::Rejected,
        };

        let settled = self
            .store
            .settle_request(
                kind,
                Settlement {
                    id,
                    status,
                    status_notes: merge_notes(request.status_notes, clean_notes(notes)),
                    reviewed_by: reviewer.id,
                },
            )
            .await?;

        tracing::info!(
            "{} {} {} by {} ({})",
            kind.label(),
            id,
            status.as_str(),
            reviewer.id,
            reviewer.role
        );
        Ok(settled)
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Keep earlier notes (they may carry the payment-method reference) and append new ones
fn merge_notes(existing: Option<String>, addition: Option<String>) -> Option<String> {
    match (existing, addition) {
        (Some(existing), Some(addition)) => Some(format!("{} | {}", existing, addition)),
        (existing, addition) => existing.or(addition),
    }
}
