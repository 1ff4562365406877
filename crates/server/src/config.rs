//! Configuration loading and validation for the RPC server binary.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is present but invalid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cert::MIN_KEY_BITS;
use crate::server::lifecycle::MIN_PORT;
use crate::server::ListenConfig;

/// Validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host the RPC endpoint binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port the RPC endpoint listens on (1024–65535).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// PEM certificate path. Generated on first start if missing.
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: String,

    /// PEM private key path. Generated on first start if missing.
    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: String,

    /// RSA modulus size for a generated key.
    #[serde(default = "default_tls_key_bits")]
    pub tls_key_bits: usize,

    /// Tracing log level (e.g. `"info"`, `"debug"`), used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP endpoint for span export. Spans are not exported when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_rpc_host() -> String {
    "localhost".into()
}
fn default_rpc_port() -> u16 {
    8886
}
fn default_tls_cert_path() -> String {
    "tls.cert".into()
}
fn default_tls_key_path() -> String {
    "tls.key".into()
}
fn default_tls_key_bits() -> usize {
    crate::cert::DEFAULT_KEY_BITS
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// What [`crate::RpcServer::listen`] needs from this configuration.
    pub fn listen_config(&self) -> ListenConfig {
        ListenConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
            tls_cert_path: PathBuf::from(&self.tls_cert_path),
            tls_key_path: PathBuf::from(&self.tls_key_path),
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.rpc_host, "RPC_HOST")?;
        ensure_non_empty(&self.tls_cert_path, "TLS_CERT_PATH")?;
        ensure_non_empty(&self.tls_key_path, "TLS_KEY_PATH")?;

        if self.rpc_port < MIN_PORT {
            anyhow::bail!("RPC_PORT must be between {MIN_PORT} and 65535");
        }
        if self.tls_key_bits < MIN_KEY_BITS {
            anyhow::bail!("TLS_KEY_BITS must be at least {MIN_KEY_BITS}");
        }
        if self.tls_cert_path == self.tls_key_path {
            anyhow::bail!("TLS_CERT_PATH and TLS_KEY_PATH must differ");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
