use uuid::Uuid;

use super::ServiceError;
use crate::auth::{AuthError, IdentityProvider, MagicLink};
use crate::database::models::Role;
use crate::database::Store;

/// Lets an admin sign in as another user through a provider-issued magic link
pub struct ImpersonationService<'a> {
    store: &'a dyn Store,
    identity: &'a dyn IdentityProvider,
    site_url: &'a str,
}

impl<'a> ImpersonationService<'a> {
    pub fn new(store: &'a dyn Store, identity: &'a dyn IdentityProvider, site_url: &'a str) -> Self {
        Self { store, identity, site_url }
    }

    pub async fn impersonate(&self, admin_id: Uuid, target_id: Uuid) -> Result<MagicLink, ServiceError> {
        // The route gate already checked the role; re-read it in case it changed since
        let admin = self.store.get_profile(admin_id).await?;
        if !matches!(admin, Some(ref p) if p.role == Role::Admin) {
            return Err(ServiceError::Forbidden("Only admins can impersonate users".to_string()));
        }

        let target = self
            .store
            .get_profile(target_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let email = target
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("User has no email address".to_string()))?;

        let link = self
            .identity
            .generate_magic_link(email, self.site_url)
            .await
            .map_err(|e| match e {
                AuthError::Rejected(provider) => ServiceError::Provider(provider),
                other => ServiceError::Auth(other),
            })?;

        tracing::warn!("Admin {} impersonating user {} ({})", admin_id, target.id, email);
        Ok(link)
    }
}
