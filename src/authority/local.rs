//! An in-process key authority.
//!
//! Holds root keys in memory and wraps generated key material under them
//! with the crate's AES-256-GCM primitive. Useful wherever a real KMS is not
//! reachable: demos, benches and tests that need more than one root key.
//!
//! ## Blob layout
//! ```text
//! [ version (1) ][ id len (u16 BE) ][ root key id ][ nonce | ciphertext | tag ]
//! ```
//! The root key id is bound as additional authenticated data, so a blob whose
//! header is rewritten to name another key fails to open.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    AuthorityError, DecryptedDataKey, GenerateDataKeyRequest, GeneratedDataKey, KeyAuthority,
};
use crate::crypto;
use crate::keys::PlaintextKey;

const BLOB_VERSION: u8 = 1;
const HEADER_LEN: usize = 3;
const MAX_KEY_ID_LEN: usize = u16::MAX as usize;

struct RootKey {
    material: PlaintextKey,
    enabled: bool,
}

/// Root keys kept in process memory, addressed by bare id or by ARN.
pub struct LocalKeyAuthority {
    region: String,
    keys: RwLock<HashMap<String, RootKey>>,
}

impl LocalKeyAuthority {
    /// Create an authority with no root keys.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Fully qualified id reported for a root key.
    pub fn arn_for(&self, key_id: &str) -> String {
        format!("arn:local:kms:{}:key/{}", self.region, key_id)
    }

    /// Create a root key with fresh random material and return its ARN.
    ///
    /// Creating an id that already exists keeps the existing material. The id
    /// must be non-empty and fit the blob header's 16-bit length field.
    pub fn create_root_key(&self, key_id: impl Into<String>) -> Result<String, AuthorityError> {
        let key_id = key_id.into();
        if key_id.is_empty() || key_id.len() > MAX_KEY_ID_LEN {
            return Err(AuthorityError::InvalidKeyId(format!(
                "root key ids must be 1 to {MAX_KEY_ID_LEN} bytes, got {}",
                key_id.len()
            )));
        }
        let material = PlaintextKey::generate()
            .map_err(|_| AuthorityError::Unavailable("randomness source failed".into()))?;
        let mut keys = self.write_keys()?;
        keys.entry(key_id.clone()).or_insert(RootKey {
            material,
            enabled: true,
        });
        debug!(key_id = %key_id, "root key created");
        Ok(self.arn_for(&key_id))
    }

    /// Stop the key from generating or decrypting until re-enabled.
    pub fn disable_root_key(&self, key_id: &str) -> Result<(), AuthorityError> {
        self.set_enabled(key_id, false)
    }

    pub fn enable_root_key(&self, key_id: &str) -> Result<(), AuthorityError> {
        self.set_enabled(key_id, true)
    }

    /// Destroy a root key. Blobs wrapped under it can never be opened again.
    pub fn delete_root_key(&self, key_id: &str) -> Result<(), AuthorityError> {
        let bare = self.bare_id(key_id).to_string();
        self.write_keys()?
            .remove(&bare)
            .map(|_| ())
            .ok_or(AuthorityError::KeyNotFound(bare))
    }

    fn set_enabled(&self, key_id: &str, enabled: bool) -> Result<(), AuthorityError> {
        let bare = self.bare_id(key_id).to_string();
        let mut keys = self.write_keys()?;
        let root = keys
            .get_mut(&bare)
            .ok_or_else(|| AuthorityError::KeyNotFound(bare.clone()))?;
        root.enabled = enabled;
        Ok(())
    }

    fn bare_id<'a>(&self, key_id: &'a str) -> &'a str {
        let prefix = format!("arn:local:kms:{}:key/", self.region);
        key_id.strip_prefix(prefix.as_str()).unwrap_or(key_id)
    }

    fn write_keys(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, RootKey>>, AuthorityError> {
        self.keys
            .write()
            .map_err(|_| AuthorityError::Unavailable("key store lock poisoned".into()))
    }

    fn generate_sync(
        &self,
        request: &GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        let bare = self.bare_id(&request.key_id).to_string();
        let keys = self
            .keys
            .read()
            .map_err(|_| AuthorityError::Unavailable("key store lock poisoned".into()))?;
        let root = keys
            .get(&bare)
            .ok_or_else(|| AuthorityError::KeyNotFound(request.key_id.clone()))?;
        if !root.enabled {
            return Err(AuthorityError::KeyDisabled(request.key_id.clone()));
        }

        let plaintext = Zeroizing::new(
            crypto::random_bytes(request.key_spec.key_len())
                .map_err(|_| AuthorityError::Unavailable("randomness source failed".into()))?,
        );
        let sealed = crypto::seal(root.material.as_bytes(), &plaintext, bare.as_bytes())
            .map_err(|_| AuthorityError::Unavailable("wrap failed".into()))?;

        Ok(GeneratedDataKey {
            key_id: self.arn_for(&bare),
            ciphertext_blob: encode_blob(&bare, &sealed)?,
            plaintext,
        })
    }

    fn decrypt_sync(&self, ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        let (key_id, sealed) = decode_blob(ciphertext_blob)?;
        let keys = self
            .keys
            .read()
            .map_err(|_| AuthorityError::Unavailable("key store lock poisoned".into()))?;
        let root = keys
            .get(key_id)
            .ok_or_else(|| AuthorityError::KeyNotFound(key_id.to_string()))?;
        if !root.enabled {
            return Err(AuthorityError::KeyDisabled(key_id.to_string()));
        }

        let plaintext = crypto::open(root.material.as_bytes(), sealed, key_id.as_bytes())
            .map_err(|_| AuthorityError::InvalidCiphertext("authentication failed".into()))?;

        Ok(DecryptedDataKey {
            key_id: self.arn_for(key_id),
            plaintext: Zeroizing::new(plaintext),
        })
    }
}

impl Default for LocalKeyAuthority {
    fn default() -> Self {
        Self::new("local")
    }
}

#[async_trait]
impl KeyAuthority for LocalKeyAuthority {
    async fn generate_data_key(
        &self,
        request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        self.generate_sync(&request)
    }

    async fn decrypt(&self, ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        self.decrypt_sync(ciphertext_blob)
    }

    async fn generate_random(&self, number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError> {
        crypto::random_bytes(number_of_bytes)
            .map_err(|_| AuthorityError::Unavailable("randomness source failed".into()))
    }
}

fn encode_blob(key_id: &str, sealed: &[u8]) -> Result<Vec<u8>, AuthorityError> {
    let id_len = u16::try_from(key_id.len())
        .map_err(|_| AuthorityError::InvalidKeyId(format!("{} bytes", key_id.len())))?;
    let mut blob = Vec::with_capacity(HEADER_LEN + key_id.len() + sealed.len());
    blob.push(BLOB_VERSION);
    blob.extend_from_slice(&id_len.to_be_bytes());
    blob.extend_from_slice(key_id.as_bytes());
    blob.extend_from_slice(sealed);
    Ok(blob)
}

fn decode_blob(blob: &[u8]) -> Result<(&str, &[u8]), AuthorityError> {
    if blob.len() < HEADER_LEN {
        return Err(AuthorityError::InvalidCiphertext("blob too short".into()));
    }
    if blob[0] != BLOB_VERSION {
        return Err(AuthorityError::InvalidCiphertext(format!(
            "unsupported blob version {}",
            blob[0]
        )));
    }
    let id_len = u16::from_be_bytes([blob[1], blob[2]]) as usize;
    let rest = &blob[HEADER_LEN..];
    if rest.len() < id_len {
        return Err(AuthorityError::InvalidCiphertext("blob truncated".into()));
    }
    let (id_bytes, sealed) = rest.split_at(id_len);
    let key_id = std::str::from_utf8(id_bytes)
        .map_err(|_| AuthorityError::InvalidCiphertext("key id is not UTF-8".into()))?;
    Ok((key_id, sealed))
}
