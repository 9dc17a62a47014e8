//! # equitywatch - equity summaries from flat OHLCV files
//!
//! Loads per-symbol daily price history from CSV files and summarises a
//! trailing window: latest close, day-over-day change and week-over-week
//! change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use equitywatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = StockSummaryService::from_directory(SymbolCatalog::default(), "data/stocks");
//!     let summary = service.load_summary("aapl", 30).await?;
//!     println!("{} closed at {:.2} ({:+.2}%)", summary.symbol, summary.latest_close, summary.change_pct);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

/// Largest trailing window callers are expected to request.
pub const MAX_WINDOW_DAYS: usize = 365;

/// Window used when a caller does not ask for one.
pub const DEFAULT_WINDOW_DAYS: usize = 90;

/// Clamp a caller-supplied window to `1..=max_days`, using `default_days`
/// when the request is missing or not positive.
pub fn clamp_window(requested: Option<i64>, default_days: usize, max_days: usize) -> usize {
    match requested {
        Some(days) if days > 0 => (days as u64).min(max_days as u64) as usize,
        _ => default_days.min(max_days),
    }
}

pub mod prelude {
    //! Commonly used types:
    //! ```rust
    //! use equitywatch::prelude::*;
    //! ```

    pub use crate::error::{SummaryError, SummaryResult};
    pub use crate::models::{PricePoint, StockSummary, SymbolCatalog};
    pub use crate::services::{CsvDirectorySource, InMemorySource, PriceSource, StockSummaryService};
    pub use crate::{clamp_window, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
}

pub use utils::{init_logger, Logger, Timer};
