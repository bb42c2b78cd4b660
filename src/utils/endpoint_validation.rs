//! Validation of the synthesis service endpoint.
//!
//! Credentials travel in the upgrade request, so the endpoint must use
//! `wss`. Plain `ws` is tolerated only for loopback hosts, which is how
//! local mock servers are reached.

use std::net::IpAddr;

use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

/// Errors that can occur during endpoint validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointValidationError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("Endpoint scheme must be wss, got: {0}")]
    SecureSchemeRequired(String),

    #[error("Endpoint must have a host")]
    MissingHost,
}

/// Whether the URL host is `localhost` or a loopback address.
pub fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Parse and check an engine endpoint.
///
/// # Example
/// ```
/// use volc_tts_bridge::utils::endpoint_validation::validate_endpoint;
///
/// assert!(validate_endpoint("wss://openspeech.bytedance.com/api/v1/tts/ws_binary").is_ok());
/// assert!(validate_endpoint("ws://127.0.0.1:9000/tts").is_ok());
/// assert!(validate_endpoint("ws://example.com/tts").is_err());
/// ```
pub fn validate_endpoint(endpoint: &str) -> Result<Url, EndpointValidationError> {
    let parsed = Url::parse(endpoint)?;

    if parsed.host().is_none() {
        return Err(EndpointValidationError::MissingHost);
    }

    let scheme = parsed.scheme().to_string();
    match scheme.as_str() {
        "wss" => Ok(parsed),
        "ws" if is_loopback_host(&parsed) => Ok(parsed),
        _ => {
            warn!(endpoint = %endpoint, "Rejecting insecure synthesis endpoint");
            Err(EndpointValidationError::SecureSchemeRequired(scheme))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_wss() {
        let url = validate_endpoint("wss://openspeech.bytedance.com/api/v1/tts/ws_binary").unwrap();
        assert_eq!(url.host_str(), Some("openspeech.bytedance.com"));
    }

    #[test]
    fn test_accepts_plain_ws_on_loopback() {
        assert!(validate_endpoint("ws://localhost:8080/tts").is_ok());
        assert!(validate_endpoint("ws://127.0.0.1:8080/tts").is_ok());
        assert!(validate_endpoint("ws://[::1]:8080/tts").is_ok());
    }

    #[test]
    fn test_rejects_plain_ws_on_remote_host() {
        assert_eq!(
            validate_endpoint("ws://openspeech.bytedance.com/api"),
            Err(EndpointValidationError::SecureSchemeRequired("ws".into()))
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            validate_endpoint("https://openspeech.bytedance.com/api"),
            Err(EndpointValidationError::SecureSchemeRequired(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(EndpointValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_host() {
        assert!(validate_endpoint("wss://").is_err());
    }
}
