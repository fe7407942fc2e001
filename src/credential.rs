//! API credentials and the gate that makes sure one is selected.

use crate::error::{GenLabError, Result};
use async_trait::async_trait;
use std::fmt;

/// Environment variables consulted for a credential, in order.
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// An API key for the generative service. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a key. Any non-empty string is accepted as-is.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(GenLabError::Auth("API key is empty".into()));
        }
        Ok(Self(key))
    }

    /// Reads the first non-empty variable of [`CREDENTIAL_ENV_VARS`].
    pub fn from_env() -> Result<Self> {
        CREDENTIAL_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().and_then(|v| Self::new(v).ok()))
            .ok_or_else(|| {
                GenLabError::Auth(format!(
                    "no API key found; set one of {}",
                    CREDENTIAL_ENV_VARS.join(", ")
                ))
            })
    }

    /// Returns the raw key.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Host capability for selecting a credential (e.g. a key picker dialog).
#[async_trait]
pub trait CredentialHost: Send + Sync {
    /// Whether a credential is already selected.
    async fn has_credential(&self) -> Result<bool>;

    /// Opens the host's selection flow and waits for it to close.
    async fn request_credential(&self) -> Result<()>;

    /// Whether [`request_credential`](Self::request_credential) can do anything.
    ///
    /// Hosts without a selection flow return `false`; the gate then only
    /// checks [`has_credential`](Self::has_credential).
    fn supports_selection(&self) -> bool {
        true
    }
}

/// Host for environments without a selection flow: a credential is present
/// when one of [`CREDENTIAL_ENV_VARS`] is non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialHost;

#[async_trait]
impl CredentialHost for EnvCredentialHost {
    async fn has_credential(&self) -> Result<bool> {
        Ok(Credential::from_env().is_ok())
    }

    async fn request_credential(&self) -> Result<()> {
        Ok(())
    }

    fn supports_selection(&self) -> bool {
        false
    }
}

/// Checks for a credential before any operation runs.
pub struct CredentialGate<H> {
    host: H,
    verify_after_request: bool,
}

impl<H: CredentialHost> CredentialGate<H> {
    /// Creates a gate that trusts the host once its selection flow returns.
    pub fn new(host: H) -> Self {
        Self {
            host,
            verify_after_request: false,
        }
    }

    /// Re-query the host after the selection flow instead of assuming success.
    pub fn verify_after_request(mut self, verify: bool) -> Self {
        self.verify_after_request = verify;
        self
    }

    /// Returns the wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Reports whether operations may proceed. Host failures count as not ready.
    pub async fn ensure_ready(&self) -> bool {
        match self.check().await {
            Ok(ready) => ready,
            Err(e) => {
                tracing::warn!("credential selection failed: {e}");
                false
            }
        }
    }

    async fn check(&self) -> Result<bool> {
        if self.host.has_credential().await? {
            return Ok(true);
        }
        if !self.host.supports_selection() {
            return Ok(false);
        }

        tracing::debug!("no credential selected, opening host selection");
        self.host.request_credential().await?;

        // The host is expected to have stored the choice by the time the
        // selection flow returns.
        if self.verify_after_request {
            self.host.has_credential().await
        } else {
            Ok(true)
        }
    }
}

impl Default for CredentialGate<EnvCredentialHost> {
    fn default() -> Self {
        Self::new(EnvCredentialHost)
    }
}
