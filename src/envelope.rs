//! The envelope record.
//!
//! An envelope carries everything needed to decrypt a payload except access
//! to the root key, which the authority grants by `owner_key_id`. Only
//! wrapped key material ever appears in it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// A self-describing encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Root key that wraps the TMK.
    #[serde(alias = "cmkId")]
    pub owner_key_id: String,
    /// TMK wrapped by the root key (base64).
    #[serde(rename = "tmkCipherText")]
    pub tmk_wrapped: String,
    /// TDK wrapped by the TMK (base64).
    #[serde(rename = "tdkCipherText")]
    pub tdk_wrapped: String,
    /// Payload wrapped by the TDK (base64).
    pub data_cipher_text: String,
    pub created_at: DateTime<Utc>,
}

impl Envelope {
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The result of opening an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedEnvelope {
    /// Root key id as reported by the authority while unwrapping the TMK.
    pub owner_key_id: String,
    /// Payload rendered in the requested output encoding.
    pub data_plain_text: String,
    pub decrypted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Envelope {
        Envelope {
            owner_key_id: "arn:local:kms:local:key/root".into(),
            tmk_wrapped: "dG1r".into(),
            tdk_wrapped: "dGRr".into(),
            data_cipher_text: "ZGF0YQ==".into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_wire_field_names() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for field in [
            "ownerKeyId",
            "tmkCipherText",
            "tdkCipherText",
            "dataCipherText",
            "createdAt",
        ] {
            assert!(obj.contains_key(field), "missing {field}");
        }
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["createdAt"], "2024-03-01T12:30:00Z");
    }

    #[test]
    fn test_json_roundtrip_is_lossless() {
        let envelope = sample();
        assert_eq!(Envelope::from_json(&envelope.to_json().unwrap()).unwrap(), envelope);
        assert_eq!(
            Envelope::from_json(&envelope.to_json_pretty().unwrap()).unwrap(),
            envelope
        );
    }

    #[test]
    fn test_accepts_cmk_id_alias() {
        let json = r#"{
            "cmkId": "legacy-root",
            "tmkCipherText": "a",
            "tdkCipherText": "b",
            "dataCipherText": "c",
            "createdAt": "2017-06-01T00:00:00.000Z"
        }"#;
        let envelope = Envelope::from_json(json).unwrap();
        assert_eq!(envelope.owner_key_id, "legacy-root");
    }

    #[test]
    fn test_missing_field_is_serialization_error() {
        assert!(matches!(
            Envelope::from_json(r#"{"ownerKeyId":"x"}"#),
            Err(EnvelopeError::Serialization(_))
        ));
    }
}
