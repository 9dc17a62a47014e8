use crate::{
    error::{SummaryError, SummaryResult},
    models::{parse_price_rows, PricePoint, StockSummary, SymbolCatalog},
    services::{CsvDirectorySource, PriceSource, DEFAULT_READ_TIMEOUT},
    utils::{Logger, Timer},
};
use std::{collections::BTreeMap, path::PathBuf, sync::Arc, time::Duration};

/// Builds stock summaries from a catalog of symbols and a price source.
///
/// Holds no mutable state: every call reads the source afresh, so one instance
/// can be shared freely across concurrent requests.
pub struct StockSummaryService {
    catalog: SymbolCatalog,
    source: Arc<dyn PriceSource>,
    read_timeout: Duration,
    logger: Logger,
}

impl StockSummaryService {
    pub fn new(catalog: SymbolCatalog, source: Arc<dyn PriceSource>) -> Self {
        Self {
            catalog,
            source,
            read_timeout: DEFAULT_READ_TIMEOUT,
            logger: Logger::new("SUMMARY_SERVICE"),
        }
    }

    /// Upper bound on a single source read; a read that outlives it fails
    /// only the request that issued it.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Service reading `<data_dir>/<file>` for each catalog entry.
    pub fn from_directory(catalog: SymbolCatalog, data_dir: impl Into<PathBuf>) -> Self {
        Self::new(catalog, Arc::new(CsvDirectorySource::new(data_dir)))
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Load the full ascending series for `symbol`.
    pub async fn load_series(&self, symbol: &str) -> SummaryResult<(String, Vec<PricePoint>)> {
        let (symbol, location) = self.catalog.resolve(symbol)?;
        let content = tokio::time::timeout(self.read_timeout, self.source.read_csv(location))
            .await
            .map_err(|_| SummaryError::ReadTimeout {
                location: location.to_string(),
                timeout: self.read_timeout,
            })??;
        let series = parse_price_rows(&content);

        self.logger.debug(&format!(
            "{}: {} rows from {} ({})",
            symbol,
            series.len(),
            location,
            self.source.name()
        ));
        Ok((symbol, series))
    }

    /// Summary of `symbol` over its trailing `days` points.
    ///
    /// `days` is expected to be clamped by the caller; values past the end of
    /// the series return the whole series.
    pub async fn load_summary(&self, symbol: &str, days: usize) -> SummaryResult<StockSummary> {
        let timer = Timer::start(&format!("{} summary", symbol));

        let (symbol, series) = match self.load_series(symbol).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.logger.warn_with_error(&format!("Failed to load {}", symbol), &e);
                return Err(e);
            }
        };

        let summary = StockSummary::from_series(symbol, series, days);
        tracing::info!(
            symbol = %summary.symbol,
            days,
            points = summary.series.len(),
            latest_close = summary.latest_close,
            change_pct = summary.change_pct,
            weekly_change_pct = summary.weekly_change_pct,
            elapsed_ms = timer.elapsed_ms(),
            "Built stock summary"
        );
        Ok(summary)
    }

    /// Summaries for several symbols, keyed by uppercased symbol.
    ///
    /// Loads run concurrently; the first failure fails the whole batch.
    pub async fn load_many_summaries<S>(&self, symbols: &[S], days: usize) -> SummaryResult<BTreeMap<String, StockSummary>>
    where
        S: AsRef<str>,
    {
        self.logger.info(&format!("Loading {} summaries ({} days)", symbols.len(), days));
        let timer = Timer::start("batch summary");

        let tasks = symbols
            .iter()
            .map(|symbol| self.load_summary(symbol.as_ref(), days));
        let summaries = futures::future::try_join_all(tasks).await?;

        let result: BTreeMap<String, StockSummary> = summaries
            .into_iter()
            .map(|summary| (summary.symbol.clone(), summary))
            .collect();

        timer.log_elapsed("SUMMARY_SERVICE");
        Ok(result)
    }
}
