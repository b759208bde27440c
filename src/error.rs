//! Error types for tenant-envelope.
//!
//! Every variant is a distinct failure mode of the key hierarchy. Messages
//! name *what* failed and never carry key material or payload bytes.

use thiserror::Error;

use crate::authority::AuthorityError;

/// The single error type for all envelope operations.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The authority rejected the root key identifier (not found, disabled,
    /// unauthorised), or the key it reported does not match the one requested.
    #[error("invalid root key: {0}")]
    InvalidRootKey(String),

    /// The authority call could not complete.
    #[error("key authority unavailable: {0}")]
    AuthorityUnavailable(String),

    /// A key or payload failed to unwrap: wrong key, tampered or truncated
    /// ciphertext, or a wrapped blob the authority would not decrypt.
    #[error("unwrap failed")]
    UnwrapFailed,

    /// Malformed key material handed to the symmetric primitive.
    #[error("cipher error: {0}")]
    CipherError(String),

    /// The requested text encoding cannot represent the bytes.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// Envelope JSON could not be produced or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EnvelopeError {
    /// Map an authority failure raised while generating key material.
    ///
    /// Only a transport failure is reported as such; anything the authority
    /// answered with is a rejection of the root key the caller named.
    pub(crate) fn from_generate(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Unavailable(reason) => Self::AuthorityUnavailable(reason),
            AuthorityError::KeyNotFound(id)
            | AuthorityError::KeyDisabled(id)
            | AuthorityError::AccessDenied(id)
            | AuthorityError::InvalidKeyId(id)
            | AuthorityError::InvalidCiphertext(id) => Self::InvalidRootKey(id),
        }
    }

    /// Map an authority failure raised while decrypting a wrapped blob.
    ///
    /// A blob the authority cannot open is an unwrap failure whatever the cause.
    pub(crate) fn from_decrypt(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Unavailable(reason) => Self::AuthorityUnavailable(reason),
            _ => Self::UnwrapFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_errors_point_at_root_key() {
        let err = EnvelopeError::from_generate(AuthorityError::KeyDisabled("cmk-1".into()));
        assert!(matches!(err, EnvelopeError::InvalidRootKey(ref id) if id == "cmk-1"));

        let err = EnvelopeError::from_generate(AuthorityError::Unavailable("timeout".into()));
        assert!(matches!(err, EnvelopeError::AuthorityUnavailable(_)));
    }

    #[test]
    fn test_generate_rejections_are_not_transport_failures() {
        for err in [
            AuthorityError::InvalidCiphertext("cmk-1".into()),
            AuthorityError::InvalidKeyId("cmk-1".into()),
            AuthorityError::AccessDenied("cmk-1".into()),
        ] {
            assert!(matches!(
                EnvelopeError::from_generate(err),
                EnvelopeError::InvalidRootKey(ref id) if id == "cmk-1"
            ));
        }
    }

    #[test]
    fn test_decrypt_errors_are_unwrap_failures() {
        for err in [
            AuthorityError::KeyNotFound("gone".into()),
            AuthorityError::AccessDenied("cmk".into()),
            AuthorityError::InvalidCiphertext("short".into()),
        ] {
            assert!(matches!(
                EnvelopeError::from_decrypt(err),
                EnvelopeError::UnwrapFailed
            ));
        }
    }

    #[test]
    fn test_unwrap_message_is_minimal() {
        assert_eq!(EnvelopeError::UnwrapFailed.to_string(), "unwrap failed");
    }
}
