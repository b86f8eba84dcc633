//! Identity management (admin surface)
//!
//! Creation goes through [`AuthService::register`](crate::core::auth::AuthService::register)
//! so that hashing and uniqueness rules are shared with self-registration.

use crate::adapters::database::ClinicStore;
use crate::domain::{
    ClinicError, Identity, IdentityUpdate, Page, PageRequest, Result, Role, UserId,
};
use std::sync::Arc;

pub struct UserService {
    store: Arc<dyn ClinicStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// One page of identities; size is clamped to 1..=100
    pub async fn list(&self, request: PageRequest) -> Result<Page<Identity>> {
        self.store.list_identities(&request.normalized()).await
    }

    pub async fn get(&self, id: UserId) -> Result<Identity> {
        self.store
            .get_identity(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("User", id))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Identity> {
        self.store
            .find_identity_by_username(username)
            .await?
            .ok_or_else(|| ClinicError::not_found("User", username))
    }

    /// Identities whose first or last name contains `fragment`, ignoring case
    pub async fn search(&self, fragment: &str) -> Result<Vec<Identity>> {
        if fragment.trim().is_empty() {
            return Err(ClinicError::invalid("Search term cannot be empty"));
        }
        self.store.search_identities(fragment.trim()).await
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        self.store.list_identities_by_role(role).await
    }

    /// Updates the mutable profile fields; role and username never change
    pub async fn update(&self, id: UserId, update: IdentityUpdate) -> Result<Identity> {
        update.validate()?;
        let mut identity = self.get(id).await?;

        if let Some(email) = update.email.as_deref().map(str::trim) {
            if email != identity.email {
                if let Some(other) = self.store.find_identity_by_email(email).await? {
                    if other.id != id {
                        return Err(ClinicError::Conflict("Email already exists".to_string()));
                    }
                }
            }
        }

        update.apply(&mut identity);
        let updated = self
            .store
            .update_identity(&identity)
            .await?
            .ok_or_else(|| ClinicError::not_found("User", id))?;

        tracing::info!(user_id = %id, "Identity updated");
        Ok(updated)
    }

    /// Hard delete; the role profile and the identity's appointments go with it
    pub async fn delete(&self, id: UserId) -> Result<()> {
        if !self.store.delete_identity(id).await? {
            return Err(ClinicError::not_found("User", id));
        }
        tracing::info!(user_id = %id, "Identity deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{IdentityDraft, SortDirection, UserSortField};

    async fn seed(store: &MemoryStore, username: &str, first: &str, role: Role) -> Identity {
        store
            .insert_identity(IdentityDraft {
                username: username.to_string(),
                email: format!("{username}@clinic.test"),
                password_hash: "hash".to_string(),
                first_name: first.to_string(),
                last_name: "Smith".to_string(),
                phone: None,
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_sorted_and_paged() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "carol", "Carol", Role::Patient).await;
        seed(&store, "alice", "Alice", Role::Admin).await;
        seed(&store, "bob", "Bob", Role::Doctor).await;
        let users = UserService::new(store);

        let page = users
            .list(PageRequest {
                page: 0,
                size: 2,
                sort_by: UserSortField::FirstName,
                direction: SortDirection::Desc,
            })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<_> = page.content.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, ["Carol", "Bob"]);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", "Alice", Role::Patient).await;
        seed(&store, "bob", "Bob", Role::Patient).await;
        let users = UserService::new(store);

        let err = users
            .update(
                alice.id,
                IdentityUpdate {
                    email: Some("bob@clinic.test".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Conflict(_)));

        let updated = users
            .update(
                alice.id,
                IdentityUpdate {
                    phone: Some("555-0100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.role, Role::Patient);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let users = UserService::new(Arc::new(MemoryStore::new()));
        let err = users.delete(UserId::new(99).unwrap()).await.unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", "Alice", Role::Patient).await;
        seed(&store, "bob", "Bob", Role::Patient).await;
        let users = UserService::new(store);

        let found = users.search("ALI").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(users.search("  ").await.is_err());
    }
}
