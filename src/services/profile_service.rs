use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{Profile, Role};
use crate::database::Store;

pub struct ProfileService<'a> {
    store: &'a dyn Store,
}

impl<'a> ProfileService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile, ServiceError> {
        self.store
            .get_profile(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Profile>, ServiceError> {
        Ok(self.store.list_profiles().await?)
    }

    /// Admins assign roles; an admin cannot take away their own admin role
    pub async fn change_role(&self, actor: &Profile, target_id: Uuid, role: Role) -> Result<Profile, ServiceError> {
        if actor.id == target_id && actor.role == Role::Admin && role != Role::Admin {
            return Err(ServiceError::BadRequest("Admins cannot remove their own admin role".to_string()));
        }

        let updated = self.store.set_profile_role(target_id, role).await?;
        tracing::info!("Profile {} role set to {} by {}", updated.id, role, actor.id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use crate::testing::{profile, MemoryStore};

    #[tokio::test]
    async fn admin_changes_roles_but_not_their_own() {
        let store = MemoryStore::new();
        let admin = store.add_profile(profile(Role::Admin)).await;
        let user = store.add_profile(profile(Role::User)).await;
        let service = ProfileService::new(&store);

        let promoted = service.change_role(&admin, user.id, Role::Accounting).await.unwrap();
        assert_eq!(promoted.role, Role::Accounting);
        assert_eq!(service.get(user.id).await.unwrap().role, Role::Accounting);

        assert!(matches!(
            service.change_role(&admin, admin.id, Role::User).await,
            Err(ServiceError::BadRequest(_))
        ));
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_profiles_are_not_found() {
        let store = MemoryStore::new();
        let admin = store.add_profile(profile(Role::Admin)).await;
        let service = ProfileService::new(&store);

        assert!(matches!(service.get(Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            service.change_role(&admin, Uuid::new_v4(), Role::Merchant).await,
            Err(ServiceError::Database(DatabaseError::NotFound(_)))
        ));
    }
}
