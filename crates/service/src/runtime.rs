//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binaries can prepare storage
//! through the service crate alone.

/// Ensure the provider's data directory exists.
pub async fn ensure_env(data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(data_dir).await
}
