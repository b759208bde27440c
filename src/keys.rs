//! Key material ownership.
//!
//! Plaintext TMK and TDK bytes live only inside `PlaintextKey`, which is
//! opaque, non-cloneable and zeroised on drop. Wrapped forms are plain base64
//! strings: they are safe to store, log and transmit.
//!
//! ## Hierarchy
//!
//! ```text
//! root key (CMK, remote) --wraps--> TMK --wraps--> TDK --wraps--> payload
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, KEY_LEN};
use crate::encoding;
use crate::error::EnvelopeError;

// ---------------------------------------------------------------------------
// Plaintext key
// ---------------------------------------------------------------------------

/// Raw 256-bit key material for a TMK or TDK.
///
/// - Not `Clone`. A copy must be made explicitly through `to_base64`.
/// - Zeroised on drop.
/// - `Debug` never prints the bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlaintextKey {
    bytes: [u8; KEY_LEN],
}

impl PlaintextKey {
    /// Take ownership of key bytes, rejecting anything but exactly `KEY_LEN`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            EnvelopeError::CipherError(format!(
                "key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a base64 key as exchanged at component boundaries.
    pub fn from_base64(text: &str) -> Result<Self, EnvelopeError> {
        let decoded = Zeroizing::new(
            encoding::b64_decode(text)
                .map_err(|_| EnvelopeError::CipherError("key is not valid base64".into()))?,
        );
        Self::from_slice(&decoded)
    }

    /// Fresh key from the local CSPRNG.
    pub fn generate() -> Result<Self, EnvelopeError> {
        let mut bytes = [0u8; KEY_LEN];
        crypto::fill_random(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Base64 form of the key. The returned string is zeroised on drop.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(encoding::b64_encode(&self.bytes))
    }

    /// Borrow the raw bytes for a cipher call.
    ///
    /// Raw bytes never leave the crate.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for PlaintextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// Tenant master key
// ---------------------------------------------------------------------------

/// A freshly issued TMK.
///
/// `wrapped` is the durable form and the only one the caller should keep.
/// `plaintext` is for immediate local use and is wiped when this value drops.
#[derive(Debug)]
pub struct TenantMasterKey {
    pub plaintext: PlaintextKey,
    /// Base64 ciphertext blob produced by the authority.
    pub wrapped: String,
    /// Root key that wrapped this TMK, as reported by the authority.
    pub owner_key_id: String,
    pub created_at: DateTime<Utc>,
}

impl TenantMasterKey {
    /// Drop the plaintext half and keep the storable blob.
    pub fn into_wrapped(self) -> String {
        self.wrapped
    }
}

/// A TMK recovered from its wrapped form.
#[derive(Debug)]
pub struct UnwrappedMasterKey {
    pub plaintext: PlaintextKey,
    pub owner_key_id: String,
}

// ---------------------------------------------------------------------------
// Tenant data key
// ---------------------------------------------------------------------------

/// A per-message data key and its wrap under the issuing TMK.
#[derive(Debug)]
pub struct TenantDataKey {
    pub plaintext: PlaintextKey,
    /// Base64 of the key sealed under the TMK.
    pub wrapped: String,
    pub created_at: DateTime<Utc>,
}

/// Whether `id` is a fully qualified key ARN.
///
/// Bare ids and aliases are resolved by the authority, so only an ARN can be
/// compared with the id the authority reports.
pub fn is_key_arn(id: &str) -> bool {
    id.strip_prefix("arn:")
        .and_then(|rest| rest.rsplit_once(":key/"))
        .is_some_and(|(_, key)| !key.is_empty())
}
