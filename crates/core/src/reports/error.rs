//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Forecast horizon too long.
    #[error("Forecast horizon of {days} days exceeds the maximum of {max}")]
    InvalidHorizon {
        /// Requested horizon.
        days: u32,
        /// Longest accepted horizon.
        max: u32,
    },
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidHorizon { .. } => "INVALID_HORIZON",
        }
    }
}
