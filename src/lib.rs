//! Inspects the TLS session a host negotiates.
//!
//! A check opens one connection to a [`Target`], completes a verified TLS
//! handshake and copies what reports need into an owned [`Session`]: the
//! leaf certificate's validity window and names, the protocol version and
//! the cipher suite. The connection is closed before [`Connector::connect`]
//! returns. [`report::report`] then turns a session into printable lines.
//!
//! ```no_run
//! use tlsinfo::report::{report, FieldSet};
//! use tlsinfo::time::SystemClock;
//! use tlsinfo::{CheckConfig, Connector, Target};
//!
//! let target = Target::new("example.com", 443)?;
//! let session = Connector::new(CheckConfig::default()).connect(&target)?;
//! for line in report(&session, FieldSet::all(), &SystemClock)?.lines {
//!     println!("{}", line.to_line());
//! }
//! # Ok::<(), tlsinfo::TLSCheckError>(())
//! ```

use log::{debug, info};
use openssl::ssl::{SslCipherRef, SslConnector, SslMethod, SslRef};
use openssl::x509::X509Ref;
use serde::Serialize;
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};

pub mod config;
pub mod error;
pub mod name;
pub mod report;
pub mod time;

pub use config::{CheckConfig, TrustAnchors};
pub use error::TLSCheckError;
pub use name::DistinguishedName;

/// Host and port to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
}

impl Target {
    /// Validates a hostname (DNS name or IP literal) and a non-zero port.
    pub fn new<S: Into<String>>(hostname: S, port: u16) -> Result<Target, TLSCheckError> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(TLSCheckError::InvalidInput {
                field: "hostname".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if hostname.parse::<IpAddr>().is_err() {
            url::Host::parse(&hostname).map_err(|e| TLSCheckError::InvalidInput {
                field: "hostname".to_string(),
                reason: format!("'{}' is not a valid host: {}", hostname, e),
            })?;
        }
        if port == 0 {
            return Err(TLSCheckError::InvalidInput {
                field: "port".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        Ok(Target { hostname, port })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.contains(':') {
            write!(f, "[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "{}:{}", self.hostname, self.port)
        }
    }
}

/// Negotiated cipher suite: OpenSSL name, protocol it belongs to and secret key bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherSuite {
    pub name: String,
    pub protocol: String,
    pub secret_bits: i32,
}

impl From<&SslCipherRef> for CipherSuite {
    fn from(cipher: &SslCipherRef) -> Self {
        CipherSuite {
            name: cipher.name().to_string(),
            protocol: cipher.version().to_string(),
            secret_bits: cipher.bits().secret,
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}', {})", self.name, self.protocol, self.secret_bits)
    }
}

/// The fields of the peer's leaf certificate that reports use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub not_before: chrono::DateTime<chrono::Utc>,
    pub not_after: chrono::DateTime<chrono::Utc>,
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
}

impl Certificate {
    pub fn from_x509(cert: &X509Ref) -> Result<Certificate, TLSCheckError> {
        Ok(Certificate {
            not_before: time::parse_asn1_time(&cert.not_before().to_string())?,
            not_after: time::parse_asn1_time(&cert.not_after().to_string())?,
            issuer: DistinguishedName::from_x509_name(cert.issuer_name())?,
            subject: DistinguishedName::from_x509_name(cert.subject_name())?,
        })
    }
}

/// Everything extracted from one completed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub target: Target,
    pub certificate: Certificate,
    pub protocol_version: String,
    pub cipher: CipherSuite,
}

impl Session {
    fn from_ssl(target: &Target, ssl: &SslRef) -> Result<Session, TLSCheckError> {
        let peer = ssl
            .peer_certificate()
            .ok_or_else(|| TLSCheckError::HandshakeFailed {
                details: "server presented no certificate".to_string(),
            })?;
        let cipher = ssl
            .current_cipher()
            .map(CipherSuite::from)
            .ok_or_else(|| TLSCheckError::HandshakeFailed {
                details: "no cipher suite was negotiated".to_string(),
            })?;

        Ok(Session {
            target: target.clone(),
            certificate: Certificate::from_x509(&peer)?,
            protocol_version: ssl.version_str().to_string(),
            cipher,
        })
    }
}

/// Opens verified TLS connections under a [`CheckConfig`].
#[derive(Debug, Clone, Default)]
pub struct Connector {
    config: CheckConfig,
}

impl Connector {
    pub fn new(config: CheckConfig) -> Self {
        Connector { config }
    }

    /// Connects to `target`, completes the handshake and extracts a [`Session`].
    ///
    /// Peer certificate chain and hostname are verified against the configured
    /// trust anchors. The connection is shut down and dropped before this
    /// returns, whether extraction succeeded or not.
    ///
    /// # Errors
    ///
    /// * `DnsResolution` / `ConnectionFailed` - the host could not be reached
    /// * `Timeout` - connect or handshake exceeded the configured timeout
    /// * `HandshakeFailed` - negotiation, chain or hostname verification failed
    /// * `CertificateParse` - the leaf certificate could not be decoded
    pub fn connect(&self, target: &Target) -> Result<Session, TLSCheckError> {
        let connector = self.ssl_connector()?;
        let tcp_stream = self.open_tcp(target)?;

        debug!("starting TLS handshake with {}", target);
        let mut stream = connector.connect(&target.hostname, tcp_stream)?;
        info!(
            "negotiated {} with {}",
            stream.ssl().version_str(),
            target
        );

        let session = Session::from_ssl(target, stream.ssl());
        if let Err(e) = stream.shutdown() {
            debug!("close_notify to {} failed: {}", target, e);
        }
        session
    }

    fn ssl_connector(&self) -> Result<SslConnector, TLSCheckError> {
        let mut builder = SslConnector::builder(SslMethod::tls())?;
        if let TrustAnchors::Custom(roots) = &self.config.trust {
            let mut store = openssl::x509::store::X509StoreBuilder::new()?;
            for root in roots {
                store.add_cert(root.clone())?;
            }
            builder.set_cert_store(store.build());
            debug!("using {} custom trust anchors", roots.len());
        }
        Ok(builder.build())
    }

    fn open_tcp(&self, target: &Target) -> Result<TcpStream, TLSCheckError> {
        let timeout = self.config.timeout;
        let addresses: Vec<SocketAddr> = (target.hostname.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| TLSCheckError::DnsResolution {
                hostname: target.hostname.clone(),
                source: e,
            })?
            .collect();
        if addresses.is_empty() {
            return Err(TLSCheckError::DnsResolution {
                hostname: target.hostname.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }
        debug!("{} resolved to {:?}", target.hostname, addresses);

        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no address attempted");
        for address in addresses {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    debug!("connected to {}", address);
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("connect to {} failed: {}", address, e);
                    last_error = e;
                }
            }
        }

        if last_error.kind() == io::ErrorKind::TimedOut {
            Err(TLSCheckError::Timeout {
                operation: format!("connect to {} after {:?}", target, timeout),
            })
        } else {
            Err(TLSCheckError::ConnectionFailed {
                address: target.to_string(),
                source: last_error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_accepts_names_and_ips() {
        assert!(Target::new("example.com", 443).is_ok());
        assert!(Target::new("127.0.0.1", 8443).is_ok());
        assert!(Target::new("::1", 8443).is_ok());
    }

    #[test]
    fn test_target_rejects_bad_input() {
        assert!(matches!(
            Target::new("", 443),
            Err(TLSCheckError::InvalidInput { .. })
        ));
        assert!(matches!(
            Target::new("exa mple.com", 443),
            Err(TLSCheckError::InvalidInput { .. })
        ));
        match Target::new("example.com", 0) {
            Err(TLSCheckError::InvalidInput { field, .. }) => assert_eq!(field, "port"),
            other => panic!("expected invalid port, got {:?}", other),
        }
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            Target::new("example.com", 443).unwrap().to_string(),
            "example.com:443"
        );
        assert_eq!(Target::new("::1", 443).unwrap().to_string(), "[::1]:443");
    }

    #[test]
    fn test_cipher_display() {
        let cipher = CipherSuite {
            name: "ECDHE-RSA-AES128-GCM-SHA256".to_string(),
            protocol: "TLSv1.2".to_string(),
            secret_bits: 128,
        };
        assert_eq!(
            cipher.to_string(),
            "('ECDHE-RSA-AES128-GCM-SHA256', 'TLSv1.2', 128)"
        );
    }
}
