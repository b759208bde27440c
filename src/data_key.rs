//! Tenant data key management.
//!
//! A TDK is drawn fresh for every envelope and wrapped under the plaintext
//! TMK with the envelope cipher. The TDK itself never reaches the authority.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::trace;
use zeroize::Zeroizing;

use crate::authority::KeyAuthority;
use crate::cipher;
use crate::crypto::KEY_LEN;
use crate::error::EnvelopeError;
use crate::keys::{PlaintextKey, TenantDataKey};

/// Where TDK randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKeySource {
    /// The authority's random generator. Costs one extra round trip.
    Authority,
    /// The local system CSPRNG.
    #[default]
    Local,
}

/// Creates and unwraps TDKs.
pub struct TenantDataKeyManager<A: KeyAuthority + ?Sized> {
    authority: Arc<A>,
    source: DataKeySource,
}

impl<A: KeyAuthority + ?Sized> Clone for TenantDataKeyManager<A> {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
            source: self.source,
        }
    }
}

impl<A: KeyAuthority + ?Sized> TenantDataKeyManager<A> {
    pub fn new(authority: Arc<A>, source: DataKeySource) -> Self {
        Self { authority, source }
    }

    pub fn source(&self) -> DataKeySource {
        self.source
    }

    /// Draw a new TDK and wrap it under `tmk`.
    pub async fn create_data_key(&self, tmk: &PlaintextKey) -> Result<TenantDataKey, EnvelopeError> {
        let plaintext = match self.source {
            DataKeySource::Local => PlaintextKey::generate()?,
            DataKeySource::Authority => {
                let bytes = Zeroizing::new(
                    self.authority
                        .generate_random(KEY_LEN)
                        .await
                        .map_err(EnvelopeError::from_generate)?,
                );
                PlaintextKey::from_slice(&bytes)?
            }
        };

        let wrapped = cipher::wrap_bytes(tmk, plaintext.as_bytes())?;
        trace!(source = ?self.source, "tenant data key created");

        Ok(TenantDataKey {
            plaintext,
            wrapped,
            created_at: Utc::now(),
        })
    }

    /// Recover a TDK from its wrap under `tmk`.
    pub fn unwrap_data_key(
        &self,
        tmk: &PlaintextKey,
        wrapped: &str,
    ) -> Result<PlaintextKey, EnvelopeError> {
        let bytes = Zeroizing::new(cipher::unwrap_bytes(tmk, wrapped)?);
        // A wrap that authenticates but is the wrong size was not made by us.
        PlaintextKey::from_slice(&bytes).map_err(|_| EnvelopeError::UnwrapFailed)
    }
}
