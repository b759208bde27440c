//! Tenant master key management.
//!
//! TMKs are minted and opened by the key authority under a root key. The
//! manager keeps no state between calls; each operation is one round trip.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::authority::{GenerateDataKeyRequest, KeyAuthority, KeySpec};
use crate::crypto::KEY_LEN;
use crate::encoding;
use crate::error::EnvelopeError;
use crate::keys::{PlaintextKey, TenantMasterKey, UnwrappedMasterKey};

/// Creates and unwraps TMKs through a key authority.
pub struct TenantMasterKeyManager<A: KeyAuthority + ?Sized> {
    authority: Arc<A>,
    key_spec: KeySpec,
}

impl<A: KeyAuthority + ?Sized> Clone for TenantMasterKeyManager<A> {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
            key_spec: self.key_spec,
        }
    }
}

impl<A: KeyAuthority + ?Sized> TenantMasterKeyManager<A> {
    pub fn new(authority: Arc<A>) -> Self {
        Self::with_key_spec(authority, KeySpec::Aes256)
    }

    pub fn with_key_spec(authority: Arc<A>, key_spec: KeySpec) -> Self {
        Self {
            authority,
            key_spec,
        }
    }

    /// Ask the authority for a new TMK under `root_key_id`.
    ///
    /// The returned key carries both the plaintext (for immediate use) and the
    /// wrapped blob (for the caller to persist).
    pub async fn create_tenant_master_key(
        &self,
        root_key_id: &str,
    ) -> Result<TenantMasterKey, EnvelopeError> {
        if root_key_id.trim().is_empty() {
            return Err(EnvelopeError::InvalidRootKey("empty root key id".into()));
        }
        if self.key_spec.key_len() != KEY_LEN {
            return Err(EnvelopeError::CipherError(format!(
                "tenant master keys must be {KEY_LEN} bytes"
            )));
        }

        let generated = self
            .authority
            .generate_data_key(GenerateDataKeyRequest {
                key_id: root_key_id.to_string(),
                key_spec: self.key_spec,
            })
            .await
            .map_err(EnvelopeError::from_generate)?;

        if generated.ciphertext_blob.is_empty() {
            warn!(root_key_id, "authority returned an empty wrapped key");
            return Err(EnvelopeError::AuthorityUnavailable(
                "empty ciphertext blob".into(),
            ));
        }
        let plaintext = PlaintextKey::from_slice(&generated.plaintext)?;

        debug!(
            root_key_id,
            owner_key_id = %generated.key_id,
            "tenant master key created"
        );

        Ok(TenantMasterKey {
            plaintext,
            wrapped: encoding::b64_encode(&generated.ciphertext_blob),
            owner_key_id: generated.key_id,
            created_at: Utc::now(),
        })
    }

    /// Ask the authority to open a wrapped TMK.
    pub async fn unwrap_tenant_master_key(
        &self,
        wrapped: &str,
    ) -> Result<UnwrappedMasterKey, EnvelopeError> {
        let blob = encoding::b64_decode(wrapped).map_err(|_| EnvelopeError::UnwrapFailed)?;
        if blob.is_empty() {
            return Err(EnvelopeError::UnwrapFailed);
        }

        let decrypted = self
            .authority
            .decrypt(&blob)
            .await
            .map_err(EnvelopeError::from_decrypt)?;

        let plaintext = PlaintextKey::from_slice(&decrypted.plaintext)?;
        debug!(owner_key_id = %decrypted.key_id, "tenant master key unwrapped");

        Ok(UnwrappedMasterKey {
            plaintext,
            owner_key_id: decrypted.key_id,
        })
    }
}
