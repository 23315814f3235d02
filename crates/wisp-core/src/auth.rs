//! Access credential seam.
//!
//! The engine only consumes a valid access credential; issuance, storage and
//! refresh-on-expiry live behind `CredentialProvider`.

use crate::error::{Error, Result};

/// A usable remote access credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// Identity the token is scoped to, used for cache keying by providers
    pub scope_key: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, scope_key: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            scope_key: scope_key.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("scope_key", &self.scope_key)
            .finish()
    }
}

/// Source of valid credentials for a given owner identity
#[allow(async_fn_in_trait)]
pub trait CredentialProvider {
    /// Return a credential valid for immediate use, refreshing if needed
    async fn valid_credential(&self, owner: &str) -> Result<Credential>;
}

/// Provider backed by a single pre-issued token, for CLI use and tests
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(access_token, "static"),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    async fn valid_credential(&self, _owner: &str) -> Result<Credential> {
        if self.credential.access_token.trim().is_empty() {
            return Err(Error::Credential("no access token configured".to_string()));
        }
        Ok(self.credential.clone())
    }
}
