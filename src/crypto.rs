//! Low-level cryptographic operations.
//!
//! This module is the only place in the crate that imports `ring`. Everything
//! else encrypts and decrypts through `seal` and `open`, including the local
//! authority's root-key wraps.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)
//! - **Tag**: 128 bits (16 bytes)

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::EnvelopeError;

/// The AEAD algorithm used for every wrap in the hierarchy.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of a TMK, TDK or local root key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Describes the one cipher suite in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub name: &'static str,
    pub key_len: usize,
    pub nonce_len: usize,
    pub tag_len: usize,
}

impl CipherSuite {
    /// Smallest byte length a well-formed ciphertext can have.
    pub const fn min_ciphertext_len(&self) -> usize {
        self.nonce_len + self.tag_len
    }
}

/// The cipher suite applied to payloads and data keys alike.
pub const CIPHER_SUITE: CipherSuite = CipherSuite {
    name: "AES-256-GCM",
    key_len: KEY_LEN,
    nonce_len: NONCE_LEN,
    tag_len: TAG_LEN,
};

fn bind_key(key_bytes: &[u8; KEY_LEN]) -> Result<LessSafeKey, EnvelopeError> {
    let unbound = UnboundKey::new(ALGORITHM, key_bytes)
        .map_err(|_| EnvelopeError::CipherError("key rejected by AEAD".into()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Fill `buf` from the system CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), EnvelopeError> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| EnvelopeError::CipherError("randomness source failed".into()))
}

/// Encrypt `plaintext` under `key_bytes`, binding `aad`.
///
/// A fresh nonce is drawn for every call, so sealing the same input twice
/// yields different output.
///
/// # Layout of returned bytes
/// ```text
/// [ nonce (12 bytes) ][ ciphertext ][ GCM tag (16 bytes) ]
/// ```
pub(crate) fn seal(
    key_bytes: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let key = bind_key(key_bytes)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    fill_random(&mut nonce_bytes)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| EnvelopeError::CipherError("encryption failed".into()))?;

    let mut output = Vec::with_capacity(NONCE_LEN + in_out.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&in_out);
    Ok(output)
}

/// Decrypt bytes produced by `seal`.
///
/// A wrong key, different `aad`, truncated input or any flipped bit fails the
/// GCM check and returns `UnwrapFailed`. No partial plaintext is ever returned.
pub(crate) fn open(
    key_bytes: &[u8; KEY_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if ciphertext.len() < CIPHER_SUITE.min_ciphertext_len() {
        return Err(EnvelopeError::UnwrapFailed);
    }

    let (nonce_part, sealed) = ciphertext.split_at(NONCE_LEN);
    let nonce_bytes: [u8; NONCE_LEN] = nonce_part
        .try_into()
        .map_err(|_| EnvelopeError::UnwrapFailed)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let key = bind_key(key_bytes)?;
    let mut payload = sealed.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::from(aad), &mut payload)
        .map_err(|_| EnvelopeError::UnwrapFailed)?;

    Ok(plaintext.to_vec())
}

/// Generate `len` cryptographically secure random bytes.
pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, EnvelopeError> {
    let mut buf = vec![0u8; len];
    fill_random(&mut buf)?;
    Ok(buf)
}
