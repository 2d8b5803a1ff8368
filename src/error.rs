//! Error types for TLS session checks.
//!
//! This module defines the error types that can occur while connecting to a
//! host, negotiating TLS, and extracting or reporting certificate fields.
//! Every error is terminal for a check; nothing is retried.

use std::fmt;
use std::io;

/// Error type for TLS check failures.
///
/// Each variant belongs to one failure category (see [`TLSCheckError::exit_code`]),
/// so the command line can report a distinct process status per kind.
#[derive(Debug)]
pub enum TLSCheckError {
    /// Invalid input provided to the API or the command line
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Network operation timeout
    Timeout {
        /// Description of which operation timed out
        operation: String,
    },

    /// TLS negotiation, trust chain or hostname verification failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// Malformed validity timestamp or issuer structure
    CertificateParse {
        /// Description of what could not be parsed
        reason: String,
    },

    /// A required issuer attribute is absent
    MissingIssuerField {
        /// Attribute type that was looked up, e.g. `organizationName`
        attribute: String,
    },

    /// OpenSSL error occurred outside of the handshake itself
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl TLSCheckError {
    /// Process exit status for this error kind.
    ///
    /// | kind | code |
    /// |---|---|
    /// | usage | 2 |
    /// | connection / DNS | 3 |
    /// | timeout | 4 |
    /// | handshake | 5 |
    /// | certificate parse | 6 |
    /// | missing issuer field | 7 |
    /// | anything else | 1 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput { .. } => 2,
            Self::DnsResolution { .. } | Self::ConnectionFailed { .. } => 3,
            Self::Timeout { .. } => 4,
            Self::HandshakeFailed { .. } => 5,
            Self::CertificateParse { .. } => 6,
            Self::MissingIssuerField { .. } => 7,
            Self::OpenSSLError { .. } | Self::IoError { .. } => 1,
        }
    }

    pub(crate) fn certificate_parse<S: Into<String>>(reason: S) -> Self {
        Self::CertificateParse {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TLSCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::DnsResolution { hostname, source } => {
                write!(
                    f,
                    "Failed to resolve hostname: {} ({}). Check that the hostname is spelled correctly and your DNS configuration is working.",
                    hostname, source
                )
            }
            Self::ConnectionFailed { address, source } => {
                write!(
                    f,
                    "Connection failed to: {} ({}). Verify the host is running a TLS service and is reachable.",
                    address, source
                )
            }
            Self::Timeout { operation } => {
                write!(f, "Operation timed out: {}", operation)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::CertificateParse { reason } => {
                write!(f, "Certificate parse error: {}", reason)
            }
            Self::MissingIssuerField { attribute } => {
                write!(f, "Issuer attribute '{}' is not present in the certificate", attribute)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for TLSCheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for TLSCheckError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<openssl::error::ErrorStack> for TLSCheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl<S> From<openssl::ssl::HandshakeError<S>> for TLSCheckError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        use openssl::ssl::HandshakeError;
        use openssl::x509::X509VerifyResult;

        match e {
            HandshakeError::SetupFailure(stack) => Self::HandshakeFailed {
                details: format!("could not set up the TLS session: {}", stack),
            },
            // Blocking sockets only report WouldBlock once the read/write timeout elapsed.
            HandshakeError::WouldBlock(_) => Self::Timeout {
                operation: "TLS handshake".to_string(),
            },
            HandshakeError::Failure(mid) => {
                let timed_out = mid
                    .error()
                    .io_error()
                    .map(|io| {
                        matches!(
                            io.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        )
                    })
                    .unwrap_or(false);
                if timed_out {
                    return Self::Timeout {
                        operation: "TLS handshake".to_string(),
                    };
                }

                let verify = mid.ssl().verify_result();
                let details = if verify != X509VerifyResult::OK {
                    format!("certificate verify failed: {}", verify.error_string())
                } else {
                    mid.error().to_string()
                };
                Self::HandshakeFailed { details }
            }
        }
    }
}
