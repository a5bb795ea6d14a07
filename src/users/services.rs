use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest, UserResponse},
    password::PasswordHasher,
    repo::UserStore,
    repo_types::{NewUser, User},
    token, validation,
};
use crate::error::{AppError, USERNAME_TAKEN};

/// Registration and login workflow over a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        info!(?request, "register new user");
        let request = validation::register(request)?;

        // Fast path; the unique constraint in the store settles races.
        if self.store.count_by_username(&request.username).await? != 0 {
            warn!(username = %request.username, "username already exists");
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }

        let password_hash = self.hash(request.password).await?;
        let user = self
            .store
            .create(NewUser {
                username: request.username,
                name: request.name,
                password_hash,
            })
            .await?;

        info!(username = %user.username, "user registered");
        Ok(UserResponse::public(user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<UserResponse, AppError> {
        info!(?request, "user login");
        let request = validation::login(request)?;

        let Some(user) = self.store.find_by_username(&request.username).await? else {
            warn!(username = %request.username, "login unknown username");
            self.verify_decoy(request.password).await?;
            return Err(AppError::invalid_credentials());
        };

        if !self.verify(request.password, user.password_hash.clone()).await? {
            warn!(username = %user.username, "login invalid password");
            return Err(AppError::invalid_credentials());
        }

        let token = token::generate();
        let user = self
            .store
            .set_token(&user.username, &token)
            .await?
            // Row vanished between lookup and update.
            .ok_or_else(AppError::invalid_credentials)?;

        info!(username = %user.username, "user logged in");
        Ok(UserResponse::with_token(user))
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        match self.store.find_by_token(token).await? {
            Some(user) => {
                debug!(username = %user.username, "token accepted");
                Ok(user)
            }
            None => Err(AppError::Unauthorized("unauthorized".into())),
        }
    }

    #[cfg(test)]
    pub(crate) fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn current(&self, user: User) -> UserResponse {
        UserResponse::public(user)
    }

    async fn hash(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .context("hash task")?
    }

    async fn verify(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .context("verify task")?
    }

    async fn verify_decoy(&self, plain: String) -> anyhow::Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&plain))
            .await
            .context("verify task")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::INVALID_CREDENTIALS;
    use crate::users::{
        memory::MemoryUserStore,
        password::test_hasher,
        repo::{StoreError, StoreResult},
    };

    fn service() -> (UserService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        (UserService::new(store.clone(), test_hasher()), store)
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            name: "Alice".into(),
            password: "secret123".into(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest { username: username.into(), password: password.into() }
    }

    #[tokio::test]
    async fn register_returns_public_user() {
        let (svc, _) = service();
        let res = svc.register(alice()).await.unwrap();
        assert_eq!(
            res,
            UserResponse { username: "alice".into(), name: "Alice".into(), token: None }
        );
    }

    #[tokio::test]
    async fn register_stores_verifiable_hash() {
        let (svc, store) = service();
        svc.register(alice()).await.unwrap();

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret123");
        assert!(test_hasher().verify("secret123", &stored.password_hash).unwrap());
        assert!(stored.token.is_none());
    }

    #[tokio::test]
    async fn register_twice_conflicts() {
        let (svc, _) = service();
        svc.register(alice()).await.unwrap();
        let err = svc.register(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == USERNAME_TAKEN));
    }

    #[tokio::test]
    async fn register_empty_username_creates_nothing() {
        let (svc, store) = service();
        let mut req = alice();
        req.username.clear();
        assert!(matches!(svc.register(req).await, Err(AppError::Validation(_))));
        assert_eq!(store.count_by_username("").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_issues_token() {
        let (svc, _) = service();
        svc.register(alice()).await.unwrap();
        let res = svc.login(login_req("alice", "secret123")).await.unwrap();
        assert_eq!(res.username, "alice");
        assert_eq!(res.name, "Alice");
        assert!(!res.token.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (svc, _) = service();
        svc.register(alice()).await.unwrap();

        let wrong_pw = svc.login(login_req("alice", "wrong")).await.unwrap_err();
        let no_user = svc.login(login_req("nobody", "secret123")).await.unwrap_err();

        assert_eq!(wrong_pw.status_code(), no_user.status_code());
        assert_eq!(wrong_pw.to_string(), INVALID_CREDENTIALS);
        assert_eq!(no_user.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn each_login_rotates_token() {
        let (svc, _) = service();
        svc.register(alice()).await.unwrap();
        let first = svc.login(login_req("alice", "secret123")).await.unwrap().token.unwrap();
        let second = svc.login(login_req("alice", "secret123")).await.unwrap().token.unwrap();
        assert_ne!(first, second);

        assert!(svc.authenticate(&first).await.is_err());
        assert_eq!(svc.authenticate(&second).await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn current_resolves_token_read_only() {
        let (svc, store) = service();
        svc.register(alice()).await.unwrap();
        let token = svc.login(login_req("alice", "secret123")).await.unwrap().token.unwrap();

        let user = svc.authenticate(&token).await.unwrap();
        assert_eq!(svc.current(user).username, "alice");
        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.token.as_deref(), Some(token.as_str()));

        assert!(matches!(svc.authenticate("not-a-token").await, Err(AppError::Unauthorized(_))));
    }

    /// Store that loses the uniqueness race: the pre-check sees no row, the insert collides.
    struct RacedStore;

    #[async_trait::async_trait]
    impl UserStore for RacedStore {
        async fn count_by_username(&self, _username: &str) -> StoreResult<i64> {
            Ok(0)
        }
        async fn find_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }
        async fn find_by_token(&self, _token: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }
        async fn create(&self, _user: NewUser) -> StoreResult<User> {
            Err(StoreError::Duplicate)
        }
        async fn set_token(&self, _username: &str, _token: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn register_race_lost_in_store_conflicts() {
        let svc = UserService::new(Arc::new(RacedStore), test_hasher());
        let err = svc.register(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == USERNAME_TAKEN));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_username_still_pays_for_verification() {
        let (svc, _) = service();
        // Decoy verification must not surface as an internal error.
        let err = svc.login(login_req("nobody", "")).await;
        assert!(matches!(err, Err(AppError::Validation(_))));
        let err = svc.login(login_req("nobody", "secret123")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_internal() {
        let (svc, store) = service();
        store
            .create(NewUser {
                username: "mallory".into(),
                name: "Mallory".into(),
                password_hash: "plaintext?".into(),
            })
            .await
            .unwrap();
        let err = svc.login(login_req("mallory", "x")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
