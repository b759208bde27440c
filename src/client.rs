//! Envelope encryption and decryption pipelines.
//!
//! Encrypt:
//! 1. Unwrap the TMK through the authority
//! 2. Create a TDK and wrap it under the TMK
//! 3. Wrap the payload under the TDK
//! 4. Assemble the envelope
//!
//! Decrypt runs the chain backwards. Each stage feeds the next; a failure
//! anywhere aborts the call and nothing partial is returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::authority::KeyAuthority;
use crate::cipher;
use crate::config::EnvelopeConfig;
use crate::data_key::{DataKeySource, TenantDataKeyManager};
use crate::encoding::{self, Encoding};
use crate::envelope::{DecryptedEnvelope, Envelope};
use crate::error::EnvelopeError;
use crate::keys::{is_key_arn, TenantMasterKey, UnwrappedMasterKey};
use crate::master_key::TenantMasterKeyManager;

/// Entry point for the key hierarchy.
///
/// Stateless apart from the shared authority handle; clone it freely and use
/// it from as many tasks as needed.
pub struct EnvelopeClient<A: KeyAuthority + ?Sized> {
    master_keys: TenantMasterKeyManager<A>,
    data_keys: TenantDataKeyManager<A>,
}

impl<A: KeyAuthority + ?Sized> Clone for EnvelopeClient<A> {
    fn clone(&self) -> Self {
        Self {
            master_keys: self.master_keys.clone(),
            data_keys: self.data_keys.clone(),
        }
    }
}

impl<A: KeyAuthority + ?Sized> EnvelopeClient<A> {
    /// Client with default settings: AES-256 TMKs, locally drawn TDKs.
    pub fn new(authority: Arc<A>) -> Self {
        Self {
            master_keys: TenantMasterKeyManager::new(Arc::clone(&authority)),
            data_keys: TenantDataKeyManager::new(authority, DataKeySource::default()),
        }
    }

    /// Client built from `config`. Settings the key hierarchy cannot honour
    /// are refused here, before any authority call.
    pub fn with_config(
        authority: Arc<A>,
        config: &EnvelopeConfig,
    ) -> Result<Self, EnvelopeError> {
        config.validate()?;
        Ok(Self {
            master_keys: TenantMasterKeyManager::with_key_spec(
                Arc::clone(&authority),
                config.key_spec,
            ),
            data_keys: TenantDataKeyManager::new(authority, config.data_key_source),
        })
    }

    pub fn master_keys(&self) -> &TenantMasterKeyManager<A> {
        &self.master_keys
    }

    pub fn data_keys(&self) -> &TenantDataKeyManager<A> {
        &self.data_keys
    }

    pub fn data_key_source(&self) -> DataKeySource {
        self.data_keys.source()
    }

    /// Issue a new TMK under `root_key_id`.
    pub async fn create_tenant_master_key(
        &self,
        root_key_id: &str,
    ) -> Result<TenantMasterKey, EnvelopeError> {
        self.master_keys.create_tenant_master_key(root_key_id).await
    }

    /// Bind a tenant identity; the returned encryptor seals payloads for it.
    pub fn encryptor(
        &self,
        root_key_id: impl Into<String>,
        tmk_wrapped: impl Into<String>,
    ) -> TenantEncryptor<'_, A> {
        TenantEncryptor {
            client: self,
            root_key_id: root_key_id.into(),
            tmk_wrapped: tmk_wrapped.into(),
        }
    }

    /// Single-call form of `encryptor(..).encrypt(..)`.
    pub async fn encrypt_envelope(
        &self,
        root_key_id: &str,
        tmk_wrapped: &str,
        plaintext: &str,
        input_encoding: Encoding,
    ) -> Result<Envelope, EnvelopeError> {
        self.encryptor(root_key_id, tmk_wrapped)
            .encrypt(plaintext, input_encoding)
            .await
    }

    /// Open `envelope` and render the payload in `output_encoding`.
    pub async fn decrypt_envelope(
        &self,
        envelope: &Envelope,
        output_encoding: Encoding,
    ) -> Result<DecryptedEnvelope, EnvelopeError> {
        let start = Instant::now();
        let (owner_key_id, bytes) = self.open(envelope).await?;
        let data_plain_text = encoding::encode_output(&bytes, output_encoding)?;

        debug!(
            owner_key_id = %owner_key_id,
            output_encoding = %output_encoding,
            payload_len = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "envelope decrypted"
        );

        Ok(DecryptedEnvelope {
            owner_key_id,
            data_plain_text,
            decrypted_at: Utc::now(),
        })
    }

    /// Open `envelope` and return the raw payload bytes.
    pub async fn decrypt_envelope_bytes(&self, envelope: &Envelope) -> Result<Vec<u8>, EnvelopeError> {
        let (_, bytes) = self.open(envelope).await?;
        Ok(bytes)
    }

    async fn open(&self, envelope: &Envelope) -> Result<(String, Vec<u8>), EnvelopeError> {
        let tmk = self
            .master_keys
            .unwrap_tenant_master_key(&envelope.tmk_wrapped)
            .await?;
        check_recorded_owner(&envelope.owner_key_id, &tmk)?;

        let tdk = self
            .data_keys
            .unwrap_data_key(&tmk.plaintext, &envelope.tdk_wrapped)?;
        let bytes = cipher::unwrap_bytes(&tdk, &envelope.data_cipher_text)?;

        Ok((tmk.owner_key_id, bytes))
    }
}

/// A client bound to one root key and one wrapped TMK.
///
/// Each `encrypt` call unwraps the TMK afresh and draws a new TDK, so
/// envelopes produced by the same encryptor share nothing but the TMK blob.
pub struct TenantEncryptor<'a, A: KeyAuthority + ?Sized> {
    client: &'a EnvelopeClient<A>,
    root_key_id: String,
    tmk_wrapped: String,
}

impl<A: KeyAuthority + ?Sized> TenantEncryptor<'_, A> {
    pub fn root_key_id(&self) -> &str {
        &self.root_key_id
    }

    /// Seal payload text read per `input_encoding`.
    pub async fn encrypt(
        &self,
        plaintext: &str,
        input_encoding: Encoding,
    ) -> Result<Envelope, EnvelopeError> {
        let bytes = encoding::decode_input(plaintext, input_encoding)?;
        self.encrypt_bytes(&bytes).await
    }

    /// Seal raw payload bytes.
    pub async fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Envelope, EnvelopeError> {
        let start = Instant::now();

        let tmk = self
            .client
            .master_keys
            .unwrap_tenant_master_key(&self.tmk_wrapped)
            .await?;
        check_bound_root(&self.root_key_id, &tmk)?;

        let tdk = self.client.data_keys.create_data_key(&tmk.plaintext).await?;
        let data_cipher_text = cipher::wrap_bytes(&tdk.plaintext, plaintext)?;

        debug!(
            root_key_id = %self.root_key_id,
            owner_key_id = %tmk.owner_key_id,
            payload_len = plaintext.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "envelope encrypted"
        );

        Ok(Envelope {
            owner_key_id: tmk.owner_key_id,
            tmk_wrapped: self.tmk_wrapped.clone(),
            tdk_wrapped: tdk.wrapped,
            data_cipher_text,
            created_at: Utc::now(),
        })
    }
}

/// Encrypt side: the caller's id may be an alias or a bare id the authority
/// resolves, so it is only compared when it is a full ARN.
fn check_bound_root(bound: &str, tmk: &UnwrappedMasterKey) -> Result<(), EnvelopeError> {
    if !is_key_arn(bound) || bound == tmk.owner_key_id {
        return Ok(());
    }
    Err(owner_mismatch(bound, tmk))
}

/// Decrypt side: the envelope records the id the authority reported at
/// encryption, which must come back unchanged.
fn check_recorded_owner(
    recorded: &str,
    tmk: &UnwrappedMasterKey,
) -> Result<(), EnvelopeError> {
    if recorded == tmk.owner_key_id {
        return Ok(());
    }
    Err(owner_mismatch(recorded, tmk))
}

fn owner_mismatch(expected: &str, tmk: &UnwrappedMasterKey) -> EnvelopeError {
    warn!(
        expected,
        reported = %tmk.owner_key_id,
        "tenant master key belongs to a different root key"
    );
    EnvelopeError::InvalidRootKey(format!(
        "tenant master key is owned by {}",
        tmk.owner_key_id
    ))
}
