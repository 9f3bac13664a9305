//! Error types for MagicFolder.

use thiserror::Error;

/// Main error type for MagicFolder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Classifier RPC failed
    #[error("classifier error: {0}")]
    Classify(#[from] ClassifyError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Classifier RPC errors.
///
/// Every variant is non-fatal: the batch that hit it is abandoned and the
/// files involved simply stay hidden.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("connect to classifier socket {path} failed: {source}")]
    Connect {
        path: String,
        source: std::io::Error,
    },

    #[error("send failed: {0}")]
    Send(std::io::Error),

    #[error("receive failed: {0}")]
    Recv(std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type alias for MagicFolder operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error_connect_display() {
        let err = ClassifyError::Connect {
            path: "/tmp/magic_brain.ipc".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/magic_brain.ipc"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_classify_error_send_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = ClassifyError::Send(io_err);
        assert!(err.to_string().starts_with("send failed"));
    }

    #[test]
    fn test_classify_error_recv_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");
        let err = ClassifyError::Recv(io_err);
        assert!(err.to_string().starts_with("receive failed"));
    }

    #[test]
    fn test_classify_error_malformed_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ClassifyError = json_err.into();
        assert!(matches!(err, ClassifyError::Malformed(_)));
    }

    #[test]
    fn test_error_from_classify_error() {
        let classify = ClassifyError::Send(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ));
        let err: Error = classify.into();
        assert!(matches!(err, Error::Classify(_)));
        assert!(err.to_string().contains("classifier error"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_config_display() {
        let err = Error::Config("HOME environment variable not set".to_string());
        assert_eq!(
            err.to_string(),
            "config error: HOME environment variable not set"
        );
    }

    #[test]
    fn test_result_type_alias() {
        fn ok_fn() -> Result<u32> {
            Ok(7)
        }

        fn err_fn() -> Result<u32> {
            Err(Error::Config("bad".to_string()))
        }

        assert!(ok_fn().is_ok());
        assert!(err_fn().is_err());
    }
}
