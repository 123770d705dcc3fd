use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Configuration errors. Raised once, when settings are validated at
/// startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric setting lies outside its documented range.
    #[error("{key} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Individually valid settings contradict each other.
    #[error("Inconsistent configuration: {reason}")]
    Inconsistent { reason: String },
}

impl ConfigError {
    /// Checks that `value` lies in `[min, max]`.
    pub fn check_range(
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), Self> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                key,
                value,
                min,
                max,
            })
        }
    }
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::OutOfRange { .. } => StatusCode::ConfigOutOfRange,
            Self::Inconsistent { .. } => StatusCode::ConfigInconsistent,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
