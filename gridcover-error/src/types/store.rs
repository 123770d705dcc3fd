use std::{any::Any, io};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors of the persistent cell store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `create` was called with an id that is already stored.
    #[error("Cell already exists: {id}")]
    AlreadyExists { id: String },
    /// No record with this id exists.
    #[error("Cell not found: {id}")]
    NotFound { id: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },
    /// A journal record could not be decoded.
    #[error("Corrupted record at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },
}

impl ErrorExt for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyExists { .. } => StatusCode::AlreadyExists,
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::Io(_) => StatusCode::Io,
            Self::Serialization { .. } => StatusCode::SerializationFailed,
            Self::Corrupted { .. } => StatusCode::CorruptedData,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::AlreadyExists { .. } | Self::NotFound { .. } | Self::Io(_) => self.to_string(),
            Self::Serialization { .. } => "Cell record could not be encoded".to_string(),
            Self::Corrupted { line, .. } => {
                format!("Cell journal is damaged at line {line}, see the log for details")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = StoreError::AlreadyExists { id: "a".into() };
        assert_eq!(err.status_code(), StatusCode::AlreadyExists);

        let err = StoreError::Corrupted {
            line: 3,
            reason: "eof".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CorruptedData);
        assert_eq!(err.to_string(), "Corrupted record at line 3: eof");
        assert_eq!(
            err.client_message(),
            "Cell journal is damaged at line 3, see the log for details"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "journal missing");
        let err: StoreError = io_err.into();
        assert_eq!(err.status_code(), StatusCode::Io);
        assert!(err.to_string().contains("journal missing"));
        assert!(err.client_message().contains("journal missing"));
    }

    #[test]
    fn test_not_found_names_the_cell() {
        let err = StoreError::NotFound { id: "c1".into() };
        assert_eq!(err.status_code(), StatusCode::NotFound);
        assert_eq!(err.client_message(), "Cell not found: c1");
    }
}
