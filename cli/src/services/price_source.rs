use crate::error::{SummaryError, SummaryResult};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_DATA_DIR: &str = "data/stocks";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Where raw CSV text for a catalog location comes from.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Read the full CSV text stored at `location`.
    async fn read_csv(&self, location: &str) -> SummaryResult<String>;
}

/// Reads `<root>/<location>` from the local filesystem.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// legacy-encoded header or row never makes the whole file unreadable.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl PriceSource for CsvDirectorySource {
    fn name(&self) -> &'static str {
        "csv_directory"
    }

    async fn read_csv(&self, location: &str) -> SummaryResult<String> {
        let path = self.root.join(location);
        debug!(path = %path.display(), "Reading price file");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SummaryError::from_io(path.display().to_string(), e))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Fixed CSV documents keyed by location. Missing keys behave like missing files.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(location.into(), content.into());
        self
    }
}

#[async_trait::async_trait]
impl PriceSource for InMemorySource {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn read_csv(&self, location: &str) -> SummaryResult<String> {
        self.documents.get(location).cloned().ok_or_else(|| {
            SummaryError::from_io(location, io::Error::new(io::ErrorKind::NotFound, "no such document"))
        })
    }
}
