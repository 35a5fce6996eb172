//! Accounts: users, login credentials and the token handed back on success.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::UserId;
use crate::token::BearerToken;

/// Role given to self-registered users.
pub const DEFAULT_ROLE: &str = "user";

/// A registered user. Only the password hash is stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash: password_hash.into(),
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Username/password pair used for both registration and login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Registration rules: a non-blank username and a non-empty password.
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `{"access_token": "...", "token_type": "bearer"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: &BearerToken) -> Self {
        Self {
            access_token: token.expose().to_string(),
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_username_or_empty_password_is_rejected() {
        assert!(Credentials::new(" ", "secret").validate().is_err());
        assert!(Credentials::new("alice", "").validate().is_err());
        assert!(Credentials::new("alice", "secret").validate().is_ok());
    }

    #[test]
    fn secrets_stay_out_of_debug_and_json() {
        let creds = Credentials::new("alice", "secret");
        assert!(!format!("{creds:?}").contains("secret"));

        let user = User::new("alice", "hashed-value");
        assert!(!format!("{user:?}").contains("hashed-value"));
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], json!("user"));
    }

    #[test]
    fn access_token_has_bearer_type() {
        let token = BearerToken::new("abc").unwrap();
        assert_eq!(
            serde_json::to_value(AccessToken::bearer(&token)).unwrap(),
            json!({"access_token": "abc", "token_type": "bearer"})
        );
    }
}
