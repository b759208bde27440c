//! # tenant-envelope
//!
//! Envelope encryption over a three-tier key hierarchy.
//!
//! A root key (CMK) lives in a remote key authority and is never exported.
//! Under it, the authority mints a per-tenant master key (TMK) that the
//! caller stores only in wrapped form. Every message then gets its own data
//! key (TDK), drawn locally and wrapped under the TMK, so the authority is
//! contacted once per message regardless of payload size.
//!
//! ```text
//! CMK (authority) ──wraps──▶ TMK ──wraps──▶ TDK ──wraps──▶ payload
//! ```
//!
//! ## Public API
//!
//! - [`EnvelopeClient`]: issue TMKs, bind a tenant with
//!   [`EnvelopeClient::encryptor`], open envelopes.
//! - [`Envelope`]: the serialisable record holding wrapped keys and payload.
//! - [`KeyAuthority`]: the trait a KMS client implements;
//!   [`LocalKeyAuthority`] is an in-process implementation.
//! - [`cipher`]: the symmetric wrap/unwrap primitive on base64 text.

pub mod authority;
pub mod cipher;
pub mod client;
pub mod config;
pub(crate) mod crypto;
pub mod data_key;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod master_key;

pub use authority::{KeyAuthority, KeySpec, LocalKeyAuthority};
pub use client::{EnvelopeClient, TenantEncryptor};
pub use config::EnvelopeConfig;
pub use crypto::{CipherSuite, CIPHER_SUITE, KEY_LEN};
pub use data_key::{DataKeySource, TenantDataKeyManager};
pub use encoding::Encoding;
pub use envelope::{DecryptedEnvelope, Envelope};
pub use error::EnvelopeError;
pub use keys::{PlaintextKey, TenantDataKey, TenantMasterKey, UnwrappedMasterKey};
pub use master_key::TenantMasterKeyManager;
