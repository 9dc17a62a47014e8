use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by summary loading.
///
/// Malformed rows are not represented here: short rows are skipped and
/// unparsable numbers read as zero (see [`crate::models::parse_numeric_or_zero`]).
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("price source unavailable at {location}: {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read price source {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {timeout:?} reading price source {location}")]
    ReadTimeout { location: String, timeout: Duration },
}

impl SummaryError {
    /// Classify an I/O failure on `location`: missing or unreadable sources
    /// become `SourceUnavailable`, everything else stays a plain `Io` error.
    pub fn from_io(location: impl Into<String>, source: io::Error) -> Self {
        let location = location.into();
        match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                SummaryError::SourceUnavailable { location, source }
            }
            _ => SummaryError::Io { location, source },
        }
    }

    /// Whether the caller may reasonably try the same request again.
    pub fn retryable(&self) -> bool {
        !matches!(self, SummaryError::UnsupportedSymbol(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SummaryError::UnsupportedSymbol(_) | SummaryError::SourceUnavailable { .. }
        )
    }
}

pub type SummaryResult<T> = Result<T, SummaryError>;
