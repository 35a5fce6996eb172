//! Bearer credential forwarded to the backend API.

/// Opaque bearer token.
///
/// Construction rejects empty/blank values, so holding a `BearerToken` means a
/// usable credential is present. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn from_optional(value: Option<String>) -> Option<Self> {
        value.and_then(Self::new)
    }

    /// The raw credential, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_absent() {
        assert!(BearerToken::new("").is_none());
        assert!(BearerToken::new("   ").is_none());
        assert!(BearerToken::from_optional(None).is_none());
        assert!(BearerToken::from_optional(Some(String::new())).is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let token = BearerToken::new("s3cret").unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("s3cret"));
        assert_eq!(token.expose(), "s3cret");
    }
}
