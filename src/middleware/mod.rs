pub mod auth;
pub mod response;
pub mod role;

pub use auth::{authenticate, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use role::{require_roles, ACCOUNTANTS, ADMINS, REVIEWERS};
