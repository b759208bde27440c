//! Client configuration.
//!
//! The root key id and region are opaque here: they are handed to the key
//! authority untouched.

use serde::{Deserialize, Serialize};

use crate::authority::KeySpec;
use crate::crypto::KEY_LEN;
use crate::data_key::DataKeySource;
use crate::error::EnvelopeError;

/// Environment variable naming the root key.
pub const ROOT_KEY_ENV: &str = "CMKID";

/// Environment variable naming the authority region.
pub const REGION_ENV: &str = "AWSREGION";

pub const DEFAULT_REGION: &str = "us-west-2";

/// Settings for an `EnvelopeClient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Root key new TMKs are generated under.
    pub root_key_id: Option<String>,

    /// Authority region or endpoint name.
    pub region: String,

    /// Key size requested from the authority for TMKs.
    pub key_spec: KeySpec,

    /// Where per-message data keys get their randomness.
    pub data_key_source: DataKeySource,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            root_key_id: None,
            region: DEFAULT_REGION.to_string(),
            key_spec: KeySpec::Aes256,
            data_key_source: DataKeySource::Local,
        }
    }
}

impl EnvelopeConfig {
    /// Read `CMKID` and `AWSREGION`; everything else keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        Self {
            root_key_id: non_blank(ROOT_KEY_ENV),
            region: non_blank(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            ..Self::default()
        }
    }

    /// Refuse settings the key hierarchy cannot work with.
    ///
    /// TMKs wrap data keys with AES-256, so the authority must hand back
    /// 32-byte keys.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.key_spec.key_len() != KEY_LEN {
            return Err(EnvelopeError::Config(format!(
                "key spec {:?} yields {}-byte keys, {KEY_LEN} required",
                self.key_spec,
                self.key_spec.key_len()
            )));
        }
        Ok(())
    }

    /// The configured root key, or a `Config` error naming the variable to set.
    pub fn require_root_key_id(&self) -> Result<&str, EnvelopeError> {
        self.root_key_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                EnvelopeError::Config(format!("root key id not set (export {ROOT_KEY_ENV})"))
            })
    }
}
