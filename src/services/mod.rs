pub mod cashflow_service;
pub mod commission_service;
pub mod impersonation_service;
pub mod package_service;
pub mod payment_method_service;
pub mod profile_service;
pub mod wallet_service;

use rust_decimal::Decimal;

use crate::api::format::ProviderError;
use crate::auth::AuthError;
use crate::database::DatabaseError;

pub use cashflow_service::{CashflowQuery, CashflowReport, CashflowService};
pub use commission_service::CommissionService;
pub use impersonation_service::ImpersonationService;
pub use package_service::PackageService;
pub use payment_method_service::PaymentMethodService;
pub use profile_service::ProfileService;
pub use wallet_service::{ReviewDecision, WalletService};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("identity provider error: {0}")]
    Provider(ProviderError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation { field, message: message.into() }
    }
}

/// Amounts must be positive and in whole cents
pub(crate) fn validate_amount(field: &'static str, amount: Decimal) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::invalid(field, "Amount must be greater than zero"));
    }
    if amount.normalize().scale() > 2 {
        return Err(ServiceError::invalid(field, "Amount can have at most two decimal places"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_validation() {
        assert!(validate_amount("amount", Decimal::new(1050, 2)).is_ok());
        assert!(validate_amount("amount", Decimal::new(10500, 3)).is_ok());
        assert!(validate_amount("amount", Decimal::ZERO).is_err());
        assert!(validate_amount("amount", Decimal::new(-5, 0)).is_err());
        assert!(matches!(
            validate_amount("amount", Decimal::new(1001, 3)),
            Err(ServiceError::Validation { field: "amount", .. })
        ));
    }
}
