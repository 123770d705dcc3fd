use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Status codes used to categorize errors.
///
/// # Ranges:
/// - 1xxx: General errors
/// - 2xxx: Cell data errors
/// - 3xxx: Configuration
/// - 5xxx: Storage
/// - 6xxx: IO / external collaborators
/// - 7xxx: Geometry and grid versions
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: General ===
    Internal = 1003,

    // === 2xxx: Cell data ===
    NotFound = 2000,
    AlreadyExists = 2001,
    CellClosed = 2002,

    // === 3xxx: Configuration ===
    ConfigOutOfRange = 3000,
    ConfigInconsistent = 3001,
    ConfigLoadFailed = 3002,

    // === 5xxx: Storage ===
    CorruptedData = 5002,
    SerializationFailed = 5003,

    // === 6xxx: IO ===
    Io = 6000,
    SearchFailed = 6008,

    // === 7xxx: Geometry ===
    InvalidBoundary = 7000,
    VersionConflict = 7001,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Numeric representation of the status code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Whether a caller may retry the failed operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::SearchFailed)
    }

    /// Configuration problems are only ever raised at startup.
    pub fn is_config_error(&self) -> bool {
        (3000..=3999).contains(&self.code())
    }

    /// Storage-side failures (5xxx) and IO (6xxx).
    pub fn is_infrastructure_error(&self) -> bool {
        matches!(self.code(), 5000..=6999)
    }

    /// Process exit code for a command that failed with this status,
    /// following the `sysexits.h` conventions.
    pub fn exit_code(&self) -> u8 {
        if self.is_config_error() {
            78 // EX_CONFIG
        } else if self.is_retryable() {
            75 // EX_TEMPFAIL
        } else if self.is_infrastructure_error() {
            74 // EX_IOERR
        } else if *self == Self::Internal {
            70 // EX_SOFTWARE
        } else {
            65 // EX_DATAERR
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations for StatusCode
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<StatusCode> for u32 {
    fn from(code: StatusCode) -> Self {
        code.code()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_u32() {
        let code = StatusCode::ConfigOutOfRange;
        assert_eq!(code.code(), 3000);
        assert_eq!(StatusCode::try_from(3000).ok(), Some(code));
        assert!(StatusCode::try_from(4242).is_err());
    }

    #[test]
    fn test_retryable_codes() {
        assert!(StatusCode::Io.is_retryable());
        assert!(StatusCode::SearchFailed.is_retryable());
        assert!(!StatusCode::ConfigOutOfRange.is_retryable());
        assert!(!StatusCode::CorruptedData.is_retryable());
    }

    #[test]
    fn test_ranges() {
        assert!(StatusCode::ConfigInconsistent.is_config_error());
        assert!(!StatusCode::Io.is_config_error());
        assert!(StatusCode::Io.is_infrastructure_error());
        assert!(StatusCode::CorruptedData.is_infrastructure_error());
        assert!(!StatusCode::InvalidBoundary.is_infrastructure_error());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(StatusCode::ConfigOutOfRange.exit_code(), 78);
        assert_eq!(StatusCode::SearchFailed.exit_code(), 75);
        assert_eq!(StatusCode::Io.exit_code(), 75);
        assert_eq!(StatusCode::CorruptedData.exit_code(), 74);
        assert_eq!(StatusCode::Internal.exit_code(), 70);
        assert_eq!(StatusCode::NotFound.exit_code(), 65);
        assert_eq!(StatusCode::CellClosed.exit_code(), 65);
        assert_eq!(StatusCode::VersionConflict.exit_code(), 65);
    }

    #[test]
    fn test_display_is_numeric() {
        assert_eq!(StatusCode::NotFound.to_string(), "2000");
        let raw: u32 = StatusCode::SearchFailed.into();
        assert_eq!(raw, 6008);
    }
}
