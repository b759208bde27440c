//! The remote key authority boundary.
//!
//! The root key never leaves the authority. The crate consumes exactly three
//! of its operations, all asynchronous because every one is a network round
//! trip in production (AWS KMS, Cloud KMS, an HSM front end, ...).
//!
//! Buffers cross this boundary as raw bytes; the managers above base64-encode
//! them for storage and transport.

pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

pub use local::LocalKeyAuthority;

/// Size of key the authority is asked to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeySpec {
    #[default]
    #[serde(rename = "AES_256")]
    Aes256,
    #[serde(rename = "AES_128")]
    Aes128,
}

impl KeySpec {
    /// Number of key bytes this spec produces.
    pub fn key_len(&self) -> usize {
        match self {
            Self::Aes256 => 32,
            Self::Aes128 => 16,
        }
    }
}

/// Arguments to `generate_data_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateDataKeyRequest {
    pub key_id: String,
    pub key_spec: KeySpec,
}

/// Key material returned by `generate_data_key`.
pub struct GeneratedDataKey {
    /// Fully qualified id of the root key that wrapped `plaintext`.
    pub key_id: String,
    /// Opaque wrapped blob; only the authority can open it.
    pub ciphertext_blob: Vec<u8>,
    pub plaintext: Zeroizing<Vec<u8>>,
}

/// Result of `decrypt`.
pub struct DecryptedDataKey {
    pub key_id: String,
    pub plaintext: Zeroizing<Vec<u8>>,
}

/// Failures reported by an authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key disabled: {0}")]
    KeyDisabled(String),

    #[error("access denied for key: {0}")]
    AccessDenied(String),

    #[error("invalid key id: {0}")]
    InvalidKeyId(String),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// The capability set the key hierarchy needs from a key management service.
///
/// Implementations must be safe to share between concurrent envelope calls.
#[async_trait]
pub trait KeyAuthority: Send + Sync {
    /// Generate new key material under the root key `request.key_id`,
    /// returning it both in plaintext and wrapped under the root key.
    async fn generate_data_key(
        &self,
        request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError>;

    /// Open a blob produced by `generate_data_key`.
    async fn decrypt(&self, ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError>;

    /// Return `number_of_bytes` bytes from the authority's random source.
    async fn generate_random(&self, number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_spec_wire_names() {
        assert_eq!(serde_json::to_string(&KeySpec::Aes256).unwrap(), "\"AES_256\"");
        assert_eq!(KeySpec::default(), KeySpec::Aes256);
        assert_eq!(KeySpec::Aes128.key_len(), 16);
    }
}
