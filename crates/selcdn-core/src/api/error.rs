use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Upload failed with status {status}")]
    Upload { status: u16 },

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Failures of the authentication exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unexpected status {status} {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    #[error("missing token")]
    MissingToken,

    #[error("missing or non-numeric expiry")]
    InvalidExpiry,

    #[error("missing storage url")]
    MissingStorageUrl,
}

/// Failures of the HEAD request that confirms an upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("etag mismatch: expected {expected}, got {actual}")]
    EtagMismatch { expected: String, actual: String },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: u64, actual: String },
}

impl AuthError {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        AuthError::UnexpectedStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}

impl StorageError {
    /// True when the error came from the authentication exchange.
    pub fn is_auth(&self) -> bool {
        matches!(self, StorageError::Auth(_))
    }

    /// The HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Auth(AuthError::UnexpectedStatus { status, .. }) => Some(*status),
            StorageError::Upload { status } => Some(*status),
            StorageError::Verification(VerificationError::UnexpectedStatus(status)) => {
                Some(*status)
            }
            StorageError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_auth_error_from_status_carries_reason() {
        let err = AuthError::from_status(StatusCode::FORBIDDEN);
        assert_eq!(
            err,
            AuthError::UnexpectedStatus {
                status: 403,
                reason: "Forbidden".to_string()
            }
        );
        assert_eq!(err.to_string(), "unexpected status 403 Forbidden");
    }

    #[test]
    fn test_messages_match_failure_kinds() {
        assert_eq!(AuthError::MissingToken.to_string(), "missing token");
        assert_eq!(
            AuthError::InvalidExpiry.to_string(),
            "missing or non-numeric expiry"
        );
        assert_eq!(AuthError::MissingStorageUrl.to_string(), "missing storage url");
    }

    #[test]
    fn test_status_extraction() {
        assert_eq!(StorageError::Upload { status: 500 }.status(), Some(500));
        assert_eq!(
            StorageError::from(VerificationError::UnexpectedStatus(404)).status(),
            Some(404)
        );
        assert_eq!(StorageError::from(AuthError::MissingToken).status(), None);
        assert!(StorageError::from(AuthError::MissingToken).is_auth());
    }
}
