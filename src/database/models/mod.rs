pub mod commission;
pub mod package;
pub mod payment_method;
pub mod profile;
pub mod request;

pub use commission::{Commission, CommissionStatus, NewCommission};
pub use package::{NewPurchase, Package, PackageInput, PackagePurchase};
pub use payment_method::{PaymentMethod, PaymentMethodInput};
pub use profile::{Profile, Role};
pub use request::{BalanceRequest, NewBalanceRequest, RequestFilter, RequestKind, RequestStatus, Settlement};

/// A text column held a value none of our enums know about
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
