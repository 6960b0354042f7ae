//! Identity-attestation lookup seam.
//!
//! The attestation service is an external collaborator; only its client
//! boundary lives here. The cache in [`crate::MirrorService`] consults
//! this trait on a miss and never lets a lookup failure escape the update
//! pipeline.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use tally_types::Attestation;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("attestation service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Resolves a ledger address to a messaging-platform identity.
#[async_trait]
pub trait AttestationLookup: Send + Sync {
    /// `Ok(None)` means the address has no attestation; an error is a
    /// transient service failure.
    async fn lookup(&self, address: &str) -> Result<Option<Attestation>, LookupError>;
}

/// HTTP client for the attestation service.
pub struct HttpAttestationClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAttestationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AttestationLookup for HttpAttestationClient {
    async fn lookup(&self, address: &str) -> Result<Option<Attestation>, LookupError> {
        let url = format!(
            "{}/attestations/{address}",
            self.base_url.trim_end_matches('/')
        );
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let attestation = response.error_for_status()?.json().await?;
        Ok(Some(attestation))
    }
}

/// Lookup used when no attestation service is configured: every address
/// is unattested.
pub struct DisabledLookup;

#[async_trait]
impl AttestationLookup for DisabledLookup {
    async fn lookup(&self, _address: &str) -> Result<Option<Attestation>, LookupError> {
        Ok(None)
    }
}
