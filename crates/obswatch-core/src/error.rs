//! Error taxonomy for the OBS client.

/// Errors raised by the OBS client and status reduction.
#[derive(Debug, thiserror::Error)]
pub enum ObsError {
    /// The build service rejected the credentials (HTTP 401).
    #[error("invalid username or password")]
    AuthFailure,

    /// The transport succeeded but the response is structurally wrong:
    /// a non-2xx status other than 401, or an empty status report.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The summary report parsed to zero result blocks.
    #[error("project has no repository or package configured")]
    EmptyProject,

    /// Connection-level HTTP failure.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for OBS client operations.
pub type Result<T> = std::result::Result<T, ObsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_display() {
        let err = ObsError::AuthFailure;
        assert!(err.to_string().contains("username or password"));
    }

    #[test]
    fn test_protocol_display_keeps_diagnostic() {
        let err = ObsError::Protocol("https://api.example got http 503: down".to_string());
        let msg = err.to_string();
        assert!(msg.contains("protocol violation"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_empty_project_display() {
        let err = ObsError::EmptyProject;
        assert!(err.to_string().contains("no repository or package"));
    }
}
