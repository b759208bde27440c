//! Text encodings at component boundaries.
//!
//! Keys and ciphertexts always cross boundaries as standard, padded base64.
//! Only the user payload may be given or requested as UTF-8 text.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// How a payload string maps to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// The string's UTF-8 bytes are the payload.
    Utf8,
    /// The string is base64 of the payload bytes.
    Base64,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf8"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

impl FromStr for Encoding {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "base64" => Ok(Self::Base64),
            other => Err(EnvelopeError::EncodingError(format!(
                "unsupported encoding: {other}"
            ))),
        }
    }
}

pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text, reporting failure as an `EncodingError`.
///
/// Callers that treat bad base64 as a different failure (an unwrap failure for
/// ciphertexts, say) map the error themselves.
pub(crate) fn b64_decode(text: &str) -> Result<Vec<u8>, EnvelopeError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| EnvelopeError::EncodingError(format!("invalid base64: {e}")))
}

/// Turn user-supplied payload text into bytes.
pub fn decode_input(text: &str, encoding: Encoding) -> Result<Vec<u8>, EnvelopeError> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Base64 => b64_decode(text),
    }
}

/// Render decrypted payload bytes in the requested encoding.
pub fn encode_output(bytes: &[u8], encoding: Encoding) -> Result<String, EnvelopeError> {
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|_| EnvelopeError::EncodingError("payload is not valid UTF-8".into())),
        Encoding::Base64 => Ok(b64_encode(bytes)),
    }
}
