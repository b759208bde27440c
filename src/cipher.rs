//! The envelope cipher.
//!
//! One primitive serves every level below the root key: a TDK is wrapped
//! under a TMK exactly the way a payload is wrapped under a TDK. Keys and
//! ciphertexts are base64 text at this boundary; only the payload may arrive
//! as UTF-8.

use crate::crypto;
use crate::encoding::{self, Encoding};
use crate::error::EnvelopeError;
use crate::keys::PlaintextKey;

/// Encrypt `plaintext` (read per `input_encoding`) under the base64 `key`.
///
/// Returns base64 ciphertext. Output is randomized: two wraps of the same
/// input under the same key differ.
pub fn wrap(key: &str, plaintext: &str, input_encoding: Encoding) -> Result<String, EnvelopeError> {
    let key = PlaintextKey::from_base64(key)?;
    let bytes = encoding::decode_input(plaintext, input_encoding)?;
    wrap_bytes(&key, &bytes)
}

/// Decrypt base64 `cipher_text` under the base64 `key`.
///
/// Always returns base64; callers decode to the encoding they need.
pub fn unwrap(key: &str, cipher_text: &str) -> Result<String, EnvelopeError> {
    let key = PlaintextKey::from_base64(key)?;
    let bytes = unwrap_bytes(&key, cipher_text)?;
    Ok(encoding::b64_encode(&bytes))
}

/// Seal raw bytes under a key already in hand.
pub fn wrap_bytes(key: &PlaintextKey, plaintext: &[u8]) -> Result<String, EnvelopeError> {
    let sealed = crypto::seal(key.as_bytes(), plaintext, &[])?;
    Ok(encoding::b64_encode(&sealed))
}

/// Open base64 ciphertext to raw bytes.
///
/// Ciphertext that is not base64 is treated like any other corruption.
pub fn unwrap_bytes(key: &PlaintextKey, cipher_text: &str) -> Result<Vec<u8>, EnvelopeError> {
    let sealed = encoding::b64_decode(cipher_text).map_err(|_| EnvelopeError::UnwrapFailed)?;
    crypto::open(key.as_bytes(), &sealed, &[])
}
