//! Error types for termview.

use thiserror::Error;

/// Main error type for termview operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A display surface was already handed to this controller
    #[error("Display surface already bound")]
    AlreadyBound,

    /// The display surface has not been bound yet
    #[error("Display surface not ready")]
    SurfaceNotReady,

    /// The display surface was closed
    #[error("Display surface closed")]
    SurfaceClosed,

    /// The session service refused or failed to create a session
    #[error("{0}")]
    Handshake(String),

    /// The session service did not answer in time
    #[error("Timed out creating terminal session after {0}ms")]
    HandshakeTimeout(u64),

    /// The transport could not be attached after a successful handshake
    #[error("Transport error: {0}")]
    Transport(String),

    /// The configuration provider could not supply a snapshot
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// Display surface operation failed
    #[error("Surface error: {0}")]
    Surface(String),

    /// Session service operation failed
    #[error("Session service error: {0}")]
    Service(String),

    /// Notification sink failed to present a message
    #[error("Notification error: {0}")]
    Notification(String),

    /// The controller task has stopped
    #[error("Session controller stopped")]
    ControllerStopped,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error ends a handshake attempt.
    pub fn is_handshake_failure(&self) -> bool {
        matches!(
            self,
            Error::Handshake(_)
                | Error::HandshakeTimeout(_)
                | Error::ConfigurationUnavailable(_)
                | Error::Surface(_)
                | Error::Service(_)
                | Error::Transport(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_bound_error() {
        assert_eq!(Error::AlreadyBound.to_string(), "Display surface already bound");
    }

    #[test]
    fn test_handshake_error_is_bare_message() {
        let err = Error::Handshake("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_handshake_timeout_error() {
        let err = Error::HandshakeTimeout(30000);
        assert_eq!(
            err.to_string(),
            "Timed out creating terminal session after 30000ms"
        );
    }

    #[test]
    fn test_transport_error() {
        let err = Error::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_configuration_unavailable_error() {
        let err = Error::ConfigurationUnavailable("theme missing".to_string());
        assert_eq!(err.to_string(), "Configuration unavailable: theme missing");
    }

    #[test]
    fn test_handshake_failure_classification() {
        assert!(Error::Handshake("x".to_string()).is_handshake_failure());
        assert!(Error::HandshakeTimeout(1).is_handshake_failure());
        assert!(Error::ConfigurationUnavailable("x".to_string()).is_handshake_failure());
        assert!(Error::Transport("x".to_string()).is_handshake_failure());
        assert!(!Error::AlreadyBound.is_handshake_failure());
        assert!(!Error::SurfaceNotReady.is_handshake_failure());
        assert!(!Error::ControllerStopped.is_handshake_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<u32>("[not, a, number]").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::Surface("gone".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Surface"));
    }
}
