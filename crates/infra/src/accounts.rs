//! User registration, login and bearer-token authorization.
//!
//! Password hashing and token encoding are pluggable: the service only relies
//! on [`PasswordHasher`] and [`TokenIssuer`]. Unknown users and wrong
//! passwords are reported with the same error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{info, instrument, warn};

use appointly_core::{AccessToken, BearerToken, Credentials, DomainError, User};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

pub trait TokenIssuer: Send + Sync {
    /// Issue a token identifying `subject` (the username).
    fn issue(&self, subject: &str) -> Result<BearerToken, AuthError>;

    /// Subject of a token this issuer produced; `None` if invalid or expired.
    fn subject(&self, token: &BearerToken) -> Result<Option<String>, AuthError>;
}

pub trait UserRepository: Send + Sync {
    fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Store a new user. Fails with [`AuthError::UserExists`] if the username is taken.
    fn insert(&self, user: User) -> Result<User, AuthError>;
}

/// In-memory user store keyed by username (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, User>>, AuthError> {
        self.users
            .read()
            .map_err(|_| AuthError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, User>>, AuthError> {
        self.users
            .write()
            .map_err(|_| AuthError::Storage("lock poisoned".to_string()))
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.read()?.get(username).cloned())
    }

    fn insert(&self, user: User) -> Result<User, AuthError> {
        let mut users = self.write()?;
        if users.contains_key(&user.username) {
            return Err(AuthError::UserExists);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Create a user with the default role and log them in.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub fn register(&self, credentials: Credentials) -> Result<AccessToken, AuthError> {
        credentials.validate()?;
        if self.users.find_by_username(&credentials.username)?.is_some() {
            return Err(AuthError::UserExists);
        }

        let hash = self.hasher.hash(&credentials.password)?;
        let user = self.users.insert(User::new(credentials.username, hash))?;
        info!(user_id = %user.id, "user registered");
        self.issue_for(&user)
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let Some(user) = self.users.find_by_username(&credentials.username)? else {
            warn!("login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.hasher.verify(&credentials.password, &user.password_hash)? {
            warn!("login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_for(&user)
    }

    /// Resolve the caller of a protected operation.
    pub fn authorize(&self, token: Option<&BearerToken>) -> Result<User, AuthError> {
        let token = token.ok_or(AuthError::Unauthenticated)?;
        let subject = self
            .tokens
            .subject(token)?
            .ok_or(AuthError::Unauthenticated)?;
        self.users
            .find_by_username(&subject)?
            .ok_or(AuthError::Unauthenticated)
    }

    fn issue_for(&self, user: &User) -> Result<AccessToken, AuthError> {
        let token = self.tokens.issue(&user.username)?;
        Ok(AccessToken::bearer(&token))
    }
}
