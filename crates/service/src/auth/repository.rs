use async_trait::async_trait;

use super::domain::UserAccount;
use super::errors::AuthError;

/// Repository abstraction for credential lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AuthError>;
}

/// In-memory credential store, seeded once at startup.
pub mod memory {
    use super::*;
    use std::collections::HashMap;

    pub struct InMemoryUserRepository {
        users: HashMap<String, UserAccount>, // key: username
    }

    impl InMemoryUserRepository {
        /// Build from accounts; duplicate usernames are rejected.
        pub fn new(accounts: Vec<UserAccount>) -> Result<Self, AuthError> {
            let mut users = HashMap::with_capacity(accounts.len());
            for a in accounts {
                if users.contains_key(&a.username) {
                    return Err(AuthError::Conflict);
                }
                users.insert(a.username.clone(), a);
            }
            Ok(Self { users })
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AuthError> {
            Ok(self.users.get(username).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryUserRepository;
    use super::*;

    fn account(name: &str) -> UserAccount {
        UserAccount { username: name.into(), password_hash: "$argon2id$dummy".into(), roles: vec![] }
    }

    #[test]
    fn duplicate_usernames_conflict() {
        let res = InMemoryUserRepository::new(vec![account("a"), account("a")]);
        assert!(matches!(res, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let repo = InMemoryUserRepository::new(vec![account("kumar2")]).unwrap();
        assert!(repo.find_by_username("kumar2").await.unwrap().is_some());
        assert!(repo.find_by_username("KUMAR2").await.unwrap().is_none());
    }
}
