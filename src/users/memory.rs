use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, User};

/// Process-local user table keyed by username.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count_by_username(&self, username: &str) -> StoreResult<i64> {
        Ok(self.users.read().await.contains_key(username) as i64)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(row.username.clone(), row.clone());
        Ok(row)
    }

    async fn set_token(&self, username: &str, token: &str) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(username).map(|u| {
            u.token = Some(token.to_owned());
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            name: "Someone".into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.create(new_user("bob")).await.unwrap();
        assert!(matches!(store.create(new_user("bob")).await, Err(StoreError::Duplicate)));
        assert_eq!(store.count_by_username("bob").await.unwrap(), 1);
        assert_eq!(store.count_by_username("carol").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_token_overwrites_previous() {
        let store = MemoryUserStore::new();
        store.create(new_user("bob")).await.unwrap();

        store.set_token("bob", "t1").await.unwrap();
        store.set_token("bob", "t2").await.unwrap();
        assert!(store.find_by_token("t1").await.unwrap().is_none());
        assert_eq!(store.find_by_token("t2").await.unwrap().unwrap().username, "bob");
    }

    #[tokio::test]
    async fn set_token_on_missing_user_is_none() {
        let store = MemoryUserStore::new();
        assert!(store.set_token("ghost", "t").await.unwrap().is_none());
    }
}
