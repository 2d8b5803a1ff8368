//! Settings for a single check.
//!
//! A check is configured entirely from command-line arguments; there is no
//! file or environment layer. [`CheckConfig::default`] gives the values used
//! when no flag overrides them.
//!
//! # Defaults
//!
//! - `timeout`: 10 seconds, applied to the TCP connect and to every socket
//!   read and write during the handshake
//! - `trust`: the platform's default certificate store

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use openssl::x509::X509;

use crate::error::TLSCheckError;

/// Default bound on connect and handshake, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Certificates a handshake may chain up to.
#[derive(Clone)]
pub enum TrustAnchors {
    /// OpenSSL's default verify paths.
    System,
    /// Only these roots are trusted; the platform store is not consulted.
    Custom(Vec<X509>),
}

impl TrustAnchors {
    /// Loads every PEM certificate in `path` as a custom trust store.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the file could not be read or holds no PEM certificate
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self, TLSCheckError> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(|e| TLSCheckError::InvalidInput {
            field: "ca-file".to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        let certs = X509::stack_from_pem(&pem).map_err(|e| TLSCheckError::InvalidInput {
            field: "ca-file".to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        if certs.is_empty() {
            return Err(TLSCheckError::InvalidInput {
                field: "ca-file".to_string(),
                reason: format!("{} contains no PEM certificate", path.display()),
            });
        }
        Ok(TrustAnchors::Custom(certs))
    }
}

impl fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustAnchors::System => write!(f, "System"),
            TrustAnchors::Custom(certs) => write!(f, "Custom({} certificates)", certs.len()),
        }
    }
}

/// Connection settings for one check.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub timeout: Duration,
    pub trust: TrustAnchors,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            trust: TrustAnchors::System,
        }
    }
}

impl CheckConfig {
    /// Builds a config from command-line values.
    ///
    /// `timeout_secs` must be positive; `ca_file`, when given, replaces the
    /// platform trust store.
    pub fn from_cli_args(
        timeout_secs: Option<u64>,
        ca_file: Option<&Path>,
    ) -> Result<Self, TLSCheckError> {
        let mut config = CheckConfig::default();
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                return Err(TLSCheckError::InvalidInput {
                    field: "timeout".to_string(),
                    reason: "must be at least one second".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = ca_file {
            config.trust = TrustAnchors::from_pem_file(path)?;
        }
        Ok(config)
    }
}
