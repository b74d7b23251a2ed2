use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::database::models::Role;
use crate::error::ApiError;

pub const REVIEWERS: &[Role] = &[Role::Admin, Role::Merchant];
pub const ACCOUNTANTS: &[Role] = &[Role::Admin, Role::Accounting];
pub const ADMINS: &[Role] = &[Role::Admin];

/// Role allow-list for a route group. Must run after `authenticate`.
pub async fn require_roles(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !allowed.contains(&user.role) {
        tracing::debug!("{} ({}) denied; route requires {:?}", user.id, user.role, allowed);
        return Err(ApiError::forbidden(format!("Role '{}' is not allowed to access this resource", user.role)));
    }

    Ok(next.run(request).await)
}
