//! DevTools endpoint parsing.
//!
//! Only plain `ws://` to a numeric host is accepted:
//!
//! ```text
//! ws://127.0.0.1:9222/devtools/browser/2f1c...
//! ws://[::1]:9222/devtools/browser/2f1c...
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use url::{Host, Url};

use crate::error::{Error, Result};

// ============================================================================
// Endpoint
// ============================================================================

/// A validated DevTools WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    addr: SocketAddr,
}

impl Endpoint {
    /// Parses and validates an endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL does not parse, the
    /// scheme is not `ws`, or the host is a domain name. A missing port
    /// means 80.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| Error::invalid_endpoint(endpoint, e.to_string()))?;

        if url.scheme() != "ws" {
            return Err(Error::invalid_endpoint(
                endpoint,
                format!("unsupported scheme '{}', expected 'ws'", url.scheme()),
            ));
        }

        let ip: IpAddr = match url.host() {
            Some(Host::Ipv4(ip)) => ip.into(),
            Some(Host::Ipv6(ip)) => ip.into(),
            Some(Host::Domain(domain)) => {
                return Err(Error::invalid_endpoint(
                    endpoint,
                    format!("host '{domain}' is not a numeric address"),
                ));
            }
            None => return Err(Error::invalid_endpoint(endpoint, "missing host")),
        };

        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::invalid_endpoint(endpoint, "missing port"))?;

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            url,
        })
    }

    /// Returns the socket address to dial.
    #[inline]
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the full URL string, used for the handshake request.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the URL path, e.g. `/devtools/browser/<guid>`.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let endpoint = Endpoint::parse("ws://127.0.0.1:9222/devtools/browser/abc").expect("parse");
        assert_eq!(endpoint.socket_addr(), "127.0.0.1:9222".parse().expect("addr"));
        assert_eq!(endpoint.path(), "/devtools/browser/abc");
        assert_eq!(endpoint.to_string(), "ws://127.0.0.1:9222/devtools/browser/abc");
    }

    #[test]
    fn test_parse_ipv6() {
        let endpoint: Endpoint = "ws://[::1]:9333/devtools/browser/x".parse().expect("parse");
        assert_eq!(endpoint.socket_addr(), "[::1]:9333".parse().expect("addr"));
    }

    #[test]
    fn test_rejects_tls_scheme() {
        let err = Endpoint::parse("wss://127.0.0.1:9222/devtools/browser/abc").unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_rejects_http_scheme() {
        assert!(Endpoint::parse("http://127.0.0.1:9222/json/version").is_err());
    }

    #[test]
    fn test_rejects_domain_host() {
        let err = Endpoint::parse("ws://localhost:9222/devtools/browser/abc").unwrap_err();
        assert!(err.to_string().contains("not a numeric address"));
    }

    #[test]
    fn test_missing_port_defaults_to_80() {
        let endpoint = Endpoint::parse("ws://127.0.0.1/devtools/browser/abc").expect("parse");
        assert_eq!(endpoint.socket_addr().port(), 80);

        let explicit = Endpoint::parse("ws://127.0.0.1:80/devtools/browser/abc").expect("parse");
        assert_eq!(explicit.socket_addr().port(), 80);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Endpoint::parse("not a url").is_err());
        assert!(Endpoint::parse("").is_err());
    }
}
