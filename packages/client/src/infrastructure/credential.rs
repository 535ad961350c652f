//! Credential providers injected into the connection manager.

use std::sync::{Arc, RwLock};

use crate::domain::BearerToken;

/// Source of the bearer token used to open a channel.
///
/// Called on every connection attempt, including reconnects, so a provider
/// may hand out a refreshed token or stop handing one out after logout.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider {
    fn bearer_token(&self) -> Option<BearerToken>;
}

/// A token fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<BearerToken>);

impl StaticCredential {
    pub fn new(token: Option<BearerToken>) -> Self {
        Self(token)
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<BearerToken> {
        self.0.clone()
    }
}

/// A token that can be replaced at runtime (login, refresh, logout).
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    token: Arc<RwLock<Option<BearerToken>>>,
}

impl SharedCredential {
    pub fn new(token: Option<BearerToken>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn set(&self, token: Option<BearerToken>) {
        let mut slot = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = token;
    }
}

impl CredentialProvider for SharedCredential {
    fn bearer_token(&self) -> Option<BearerToken> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
