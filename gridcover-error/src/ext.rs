use std::{any::Any, error::Error};

use crate::StatusCode;

/// Extension trait for library errors (object-safe).
///
/// The binary reads it at the process edge: the status code picks the exit
/// code, `client_message` goes to the operator and `log_message` to the
/// log.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Status of the failure. Defaults to [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Returns the error as [`Any`](std::any::Any) for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Message for the operator. Internal errors collapse to
    /// `"Internal error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Internal => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Status code followed by the debug form of the error.
    fn log_message(&self) -> String {
        format!("[{}] {self:?}", self.status_code())
    }
}
