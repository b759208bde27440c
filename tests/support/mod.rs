//! Shared authority fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ring::rand::{SecureRandom, SystemRandom};
use tenant_envelope::authority::{
    AuthorityError, DecryptedDataKey, GenerateDataKeyRequest, GeneratedDataKey, KeyAuthority,
};
use zeroize::Zeroizing;

pub const FIXTURE_KEY_ARN: &str =
    "arn:aws:kms:us-west-2:123456789:key/c7e52f9e-6e58-489d-bed7-363660bff277";

/// A wrapped blob captured from a real KMS `GenerateDataKey` call.
pub const FIXTURE_CIPHERTEXT_BLOB: &str = concat!(
    "AQIDAHiKTWxtOUEeUjwjaNKh1r6z+E+MX1KoPAJuULn8uXauugErWloWc0AeQQd3E681O5bzAAAAfjB8Bgkqhki",
    "G9w0BBwagbzBtAgEAMGgGCSqGSIb3DQEHATAeBglghkgBZQMEAS4wEQQMZasGbqo1T6QVtMSjAgEQgDtDKOiUsYc31LvKYF0RfO7ba3m2qrB12Cf",
    "SN5X6bH/P3Bb03JX3wtdMhTAAbtFrQEgYjjYNK3Y+2peqqg==",
);

/// The plaintext TMK matching `FIXTURE_CIPHERTEXT_BLOB`.
pub const FIXTURE_PLAINTEXT: &str = "ZAsPrKgyKAyZ+9pKNqRsXlC0luk5uO9t5ekA8KFDwrg=";

fn decode(text: &str) -> Vec<u8> {
    STANDARD.decode(text).expect("fixture must be valid base64")
}

/// Returns the same key material for every request, whatever it names.
pub struct StaticAuthority {
    key_id: String,
}

impl StaticAuthority {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl KeyAuthority for StaticAuthority {
    async fn generate_data_key(
        &self,
        _request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        Ok(GeneratedDataKey {
            key_id: self.key_id.clone(),
            ciphertext_blob: decode(FIXTURE_CIPHERTEXT_BLOB),
            plaintext: Zeroizing::new(decode(FIXTURE_PLAINTEXT)),
        })
    }

    async fn decrypt(&self, _ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        Ok(DecryptedDataKey {
            key_id: self.key_id.clone(),
            plaintext: Zeroizing::new(decode(FIXTURE_PLAINTEXT)),
        })
    }

    async fn generate_random(&self, number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError> {
        let mut buf = vec![0u8; number_of_bytes];
        SystemRandom::new()
            .fill(&mut buf)
            .map_err(|_| AuthorityError::Unavailable("rng".into()))?;
        Ok(buf)
    }
}

/// Every call fails as if the network were down.
pub struct UnavailableAuthority;

#[async_trait]
impl KeyAuthority for UnavailableAuthority {
    async fn generate_data_key(
        &self,
        _request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        Err(AuthorityError::Unavailable("connection refused".into()))
    }

    async fn decrypt(&self, _ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        Err(AuthorityError::Unavailable("connection refused".into()))
    }

    async fn generate_random(&self, _number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError> {
        Err(AuthorityError::Unavailable("connection refused".into()))
    }
}

/// Which response a `FaultyAuthority` gets wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `generate_data_key` returns the key but an empty wrapped blob.
    EmptyBlob,
    /// `generate_random` returns 16 bytes whatever was asked for.
    ShortRandom,
}

/// Behaves like `StaticAuthority` except for one malformed response.
pub struct FaultyAuthority {
    inner: StaticAuthority,
    fault: Fault,
}

impl FaultyAuthority {
    pub fn new(key_id: impl Into<String>, fault: Fault) -> Self {
        Self {
            inner: StaticAuthority::new(key_id),
            fault,
        }
    }
}

#[async_trait]
impl KeyAuthority for FaultyAuthority {
    async fn generate_data_key(
        &self,
        request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        let mut generated = self.inner.generate_data_key(request).await?;
        if self.fault == Fault::EmptyBlob {
            generated.ciphertext_blob.clear();
        }
        Ok(generated)
    }

    async fn decrypt(&self, ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        self.inner.decrypt(ciphertext_blob).await
    }

    async fn generate_random(&self, number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError> {
        let len = match self.fault {
            Fault::ShortRandom => 16,
            Fault::EmptyBlob => number_of_bytes,
        };
        self.inner.generate_random(len).await
    }
}

/// Counts calls per operation before delegating.
pub struct CountingAuthority<A> {
    inner: Arc<A>,
    pub generate_data_key_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
    pub generate_random_calls: AtomicUsize,
}

impl<A: KeyAuthority> CountingAuthority<A> {
    pub fn new(inner: Arc<A>) -> Self {
        Self {
            inner,
            generate_data_key_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
            generate_random_calls: AtomicUsize::new(0),
        }
    }

    /// Total round trips made so far.
    pub fn round_trips(&self) -> usize {
        self.generate_data_key_calls.load(Ordering::SeqCst)
            + self.decrypt_calls.load(Ordering::SeqCst)
            + self.generate_random_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<A: KeyAuthority> KeyAuthority for CountingAuthority<A> {
    async fn generate_data_key(
        &self,
        request: GenerateDataKeyRequest,
    ) -> Result<GeneratedDataKey, AuthorityError> {
        self.generate_data_key_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_data_key(request).await
    }

    async fn decrypt(&self, ciphertext_blob: &[u8]) -> Result<DecryptedDataKey, AuthorityError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt(ciphertext_blob).await
    }

    async fn generate_random(&self, number_of_bytes: usize) -> Result<Vec<u8>, AuthorityError> {
        self.generate_random_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_random(number_of_bytes).await
    }
}

/// Flip one bit of the decoded bytes behind a base64 string.
pub fn flip_byte(b64: &str, index: usize) -> String {
    let mut raw = decode(b64);
    raw[index] ^= 0x01;
    STANDARD.encode(raw)
}

pub fn decoded_len(b64: &str) -> usize {
    decode(b64).len()
}
