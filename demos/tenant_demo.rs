//! Drive the full key hierarchy against the in-process authority.
//!
//! Run with: `cargo run --example tenant_demo`
//!
//! `CMKID` names the root key to create (default `demo-root`) and
//! `AWSREGION` the region reported in key ARNs. Set `RUST_LOG=debug` to see
//! the pipeline's log events.

use std::sync::Arc;

use tenant_envelope::{Encoding, EnvelopeClient, EnvelopeConfig, LocalKeyAuthority};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Setup
    let mut config = EnvelopeConfig::from_env();
    if config.root_key_id.is_none() {
        config.root_key_id = Some("demo-root".to_string());
    }
    let root_key_id = config.require_root_key_id()?.to_string();

    let authority = Arc::new(LocalKeyAuthority::new(config.region.clone()));
    authority.create_root_key(root_key_id.clone())?;
    let client = EnvelopeClient::with_config(authority, &config)?;

    // 2. Issue a tenant master key; only its wrapped form is kept.
    let tmk_wrapped = client
        .create_tenant_master_key(&root_key_id)
        .await?
        .into_wrapped();

    // 3. Encrypt
    let data = "this is a secret";
    println!("\nPlaintext data: {data}");
    let envelope = client
        .encryptor(root_key_id.as_str(), tmk_wrapped)
        .encrypt(data, Encoding::Utf8)
        .await?;
    println!("\nEncrypted envelope:\n{}", envelope.to_json_pretty()?);

    // 4. Decrypt
    let decrypted = client.decrypt_envelope(&envelope, Encoding::Utf8).await?;
    println!(
        "\nDecrypted envelope:\n{}",
        serde_json::to_string_pretty(&decrypted)?
    );

    assert_ne!(envelope.data_cipher_text, data);
    assert_eq!(decrypted.data_plain_text, data);
    Ok(())
}
