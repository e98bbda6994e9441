//! Custom error types for the Shelly scanner

use std::fmt;
use std::net::Ipv4Addr;

/// Main error type for discovery and control operations
#[derive(Debug)]
pub enum ShellyError {
    /// The device did not answer within the request timeout
    TransportTimeout(String),
    /// Nothing is listening on the device address
    TransportRefused(String),
    /// Any other transport level failure
    Transport(String),
    /// The device answered but the body could not be decoded
    MalformedResponse(String),
    /// The device rejected our credentials (HTTP 401)
    Unauthorized(String),
    /// The device answered with an unexpected HTTP status
    UnexpectedStatus(u16),
    /// No Shelly device answers at this address
    DeviceNotFound(Ipv4Addr),
    /// A control operation needs the admin password but none is configured
    CredentialsNotConfigured,
    /// Firmware update trigger was not accepted
    UpdateFailed(String),
    /// Authentication toggle was not accepted
    AuthToggleFailed {
        reason: String,
        details: Option<String>,
    },
    /// Subnet range could not be parsed
    InvalidSubnet(String),
    /// Address supplied by a caller is not a valid IPv4 address
    InvalidAddress(String),
    /// Configuration related errors
    Config(String),
    /// General I/O errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
}

impl ShellyError {
    /// HTTP status the API layer answers with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ShellyError::DeviceNotFound(_) => 404,
            ShellyError::CredentialsNotConfigured | ShellyError::InvalidAddress(_) => 400,
            _ => 500,
        }
    }

    /// Raw response body attached to a failed control operation
    pub fn details(&self) -> Option<&str> {
        match self {
            ShellyError::AuthToggleFailed { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// True when the error only means "no device of this generation here"
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            ShellyError::TransportTimeout(_)
                | ShellyError::TransportRefused(_)
                | ShellyError::UnexpectedStatus(_)
                | ShellyError::Unauthorized(_)
        )
    }
}

impl fmt::Display for ShellyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellyError::TransportTimeout(msg) => {
                write!(f, "Request timeout - device did not respond: {}", msg)
            }
            ShellyError::TransportRefused(msg) => write!(f, "Connection refused: {}", msg),
            ShellyError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ShellyError::MalformedResponse(msg) => write!(f, "Malformed device response: {}", msg),
            ShellyError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ShellyError::UnexpectedStatus(code) => {
                write!(f, "Request failed with status {}", code)
            }
            ShellyError::DeviceNotFound(_) => write!(f, "Device not found"),
            ShellyError::CredentialsNotConfigured => {
                write!(f, "Password not configured in app settings")
            }
            ShellyError::UpdateFailed(msg) => write!(f, "Update failed: {}", msg),
            ShellyError::AuthToggleFailed { reason, .. } => write!(f, "{}", reason),
            ShellyError::InvalidSubnet(msg) => write!(f, "Invalid network range: {}", msg),
            ShellyError::InvalidAddress(addr) => write!(f, "Invalid IPv4 address: {}", addr),
            ShellyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ShellyError::Io(err) => write!(f, "I/O error: {}", err),
            ShellyError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ShellyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellyError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShellyError {
    fn from(err: std::io::Error) -> Self {
        ShellyError::Io(err)
    }
}

impl From<serde_json::Error> for ShellyError {
    fn from(err: serde_json::Error) -> Self {
        ShellyError::MalformedResponse(err.to_string())
    }
}

impl From<toml::de::Error> for ShellyError {
    fn from(err: toml::de::Error) -> Self {
        ShellyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ShellyError {
    fn from(err: toml::ser::Error) -> Self {
        ShellyError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ShellyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ShellyError::TransportTimeout(err.to_string())
        } else if err.is_connect() {
            ShellyError::TransportRefused(err.to_string())
        } else if err.is_decode() {
            ShellyError::MalformedResponse(err.to_string())
        } else {
            ShellyError::Transport(err.to_string())
        }
    }
}

/// Result type alias for scanner operations
pub type Result<T> = std::result::Result<T, ShellyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ShellyError::DeviceNotFound(Ipv4Addr::new(10, 0, 0, 1)).http_status(),
            404
        );
        assert_eq!(ShellyError::CredentialsNotConfigured.http_status(), 400);
        assert_eq!(
            ShellyError::InvalidAddress("nope".to_string()).http_status(),
            400
        );
        assert_eq!(
            ShellyError::UpdateFailed("status 500".to_string()).http_status(),
            500
        );
    }

    #[test]
    fn test_api_facing_messages() {
        assert_eq!(
            ShellyError::DeviceNotFound(Ipv4Addr::LOCALHOST).to_string(),
            "Device not found"
        );
        assert_eq!(
            ShellyError::UnexpectedStatus(403).to_string(),
            "Request failed with status 403"
        );

        let err = ShellyError::AuthToggleFailed {
            reason: "Request failed with status 401".to_string(),
            details: Some("{\"code\":401}".to_string()),
        };
        assert_eq!(err.to_string(), "Request failed with status 401");
        assert_eq!(err.details(), Some("{\"code\":401}"));
    }

    #[test]
    fn test_absence_classification() {
        assert!(ShellyError::TransportRefused("x".into()).is_absence());
        assert!(ShellyError::UnexpectedStatus(404).is_absence());
        assert!(!ShellyError::MalformedResponse("x".into()).is_absence());
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err: ShellyError = std::io::Error::other("disk gone").into();
        assert!(err.source().is_some());
    }
}
