//! Application error type.
//!
//! Every failure carries a process exit code so `main` can stay tiny:
//!
//! - `2`: configuration (missing input file/column, invalid grid or flags)
//! - `3`: data (malformed curve quote or yield row, e.g. a negative tenor)
//! - `4`: I/O or rendering failure while writing artifacts
//!
//! Coverage gaps (a bond/date pair that cannot be priced) are *not* errors;
//! they are recorded as skip records by the spread calculator.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Data(String),
    #[error("{0}")]
    Io(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Configuration(_) => 2,
            AppError::Data(_) => 3,
            AppError::Io(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(AppError::config("x").exit_code(), 2);
        assert_eq!(AppError::data("x").exit_code(), 3);
        assert_eq!(AppError::io("x").exit_code(), 4);
        assert_eq!(AppError::data("bad tenor").to_string(), "bad tenor");
    }
}
