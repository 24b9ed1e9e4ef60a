//! Error types for doctrans.

use thiserror::Error;

/// Result type alias using doctrans's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for doctrans operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (job, uploaded file, artifact)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    /// Action not valid for the job's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Settings validation failed, with the failing field/reason
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The underlying translation engine raised during execution
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("uploaded file abc".to_string());
        assert_eq!(err.to_string(), "Not found: uploaded file abc");
    }

    #[test]
    fn test_error_display_job_not_found() {
        let id = Uuid::nil();
        let err = Error::JobNotFound(id);
        assert_eq!(err.to_string(), format!("Job not found: {}", id));
    }

    #[test]
    fn test_error_display_invalid_state() {
        let err = Error::InvalidState("job is not completed".to_string());
        assert_eq!(err.to_string(), "Invalid state: job is not completed");
    }

    #[test]
    fn test_error_display_invalid_settings() {
        let err = Error::InvalidSettings("RPM must be a positive integer".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid settings: RPM must be a positive integer"
        );
    }

    #[test]
    fn test_error_display_backend_failure() {
        let err = Error::BackendFailure("engine exited with status 1".to_string());
        assert_eq!(
            err.to_string(),
            "Backend failure: engine exited with status 1"
        );
    }

    #[test]
    fn test_error_display_serialization() {
        let err = Error::Serialization("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid JSON");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("config file unreadable".to_string());
        assert_eq!(err.to_string(), "Configuration error: config file unreadable");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        let result = get_result();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_job_not_found_with_random_uuid() {
        let id = Uuid::new_v4();
        let err = Error::JobNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::NotFound("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("NotFound"));
    }
}
