use serde::{Deserialize, Serialize};
use tracing::debug;

/// Columns every price row must carry: date, open, high, low, close, volume.
pub const PRICE_COLUMNS: usize = 6;

/// Offset from the latest point used as the week-ago baseline (five trading days back).
const WEEK_LOOKBACK: usize = 6;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String, // Format: YYYY-MM-DD
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    pub fn new(date: impl Into<String>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date: date.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Build a point from the six raw columns of a CSV row.
    fn from_columns(columns: &csv::StringRecord) -> Option<Self> {
        if columns.len() < PRICE_COLUMNS {
            return None;
        }

        Some(Self::new(
            columns.get(0).unwrap_or_default(),
            parse_numeric_or_zero(columns.get(1).unwrap_or_default()),
            parse_numeric_or_zero(columns.get(2).unwrap_or_default()),
            parse_numeric_or_zero(columns.get(3).unwrap_or_default()),
            parse_numeric_or_zero(columns.get(4).unwrap_or_default()),
            parse_numeric_or_zero(columns.get(5).unwrap_or_default()),
        ))
    }
}

/// Summary of a symbol over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub symbol: String,
    pub latest_close: f64,
    pub change_pct: f64,
    pub weekly_change_pct: f64,
    pub series: Vec<PricePoint>,
}

impl StockSummary {
    /// Restrict `series` (ascending by date) to its trailing `days` points and
    /// compute the latest close plus daily and weekly change.
    ///
    /// The weekly baseline is the point six positions from the end; shorter
    /// windows fall back to the previous point, then to the latest point itself.
    pub fn from_series(symbol: impl Into<String>, mut series: Vec<PricePoint>, days: usize) -> Self {
        let start = series.len().saturating_sub(days);
        let recent = series.split_off(start);

        let latest = recent.last();
        let previous = recent.len().checked_sub(2).and_then(|i| recent.get(i));
        let week_ago = recent
            .len()
            .checked_sub(WEEK_LOOKBACK)
            .and_then(|i| recent.get(i))
            .or(previous)
            .or(latest);

        let latest_close = latest.map_or(0.0, |p| p.close);
        let change_pct = compute_change_pct(latest_close, previous.map_or(0.0, |p| p.close));
        let weekly_change_pct = compute_change_pct(latest_close, week_ago.map_or(0.0, |p| p.close));

        Self {
            symbol: symbol.into(),
            latest_close,
            change_pct,
            weekly_change_pct,
            series: recent,
        }
    }

    pub fn first_date(&self) -> Option<&str> {
        self.series.first().map(|p| p.date.as_str())
    }

    pub fn last_date(&self) -> Option<&str> {
        self.series.last().map(|p| p.date.as_str())
    }
}

/// Leniency policy for numeric columns: anything that does not parse as a
/// finite number reads as zero instead of rejecting the row.
pub fn parse_numeric_or_zero(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Percentage change from `previous` to `current`; zero when the baseline is zero.
pub fn compute_change_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Parse CSV text (one header row, then `date,open,high,low,close,volume`
/// rows) into a series sorted ascending by date.
///
/// The header is skipped unconditionally. Rows with fewer than six columns
/// are dropped; no other row is. Each physical line is one record: quotes
/// are ordinary characters, so a stray `"` cannot swallow the rows after it.
pub fn parse_price_rows(content: &str) -> Vec<PricePoint> {
    // Dates are kept exactly as written; numeric fields are trimmed by parse_numeric_or_zero.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::None)
        .from_reader(content.as_bytes());

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        match result {
            Ok(record) => match PricePoint::from_columns(&record) {
                Some(point) => points.push(point),
                None => skipped += 1,
            },
            Err(e) => {
                debug!(error = %e, "Skipping unreadable CSV record");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, kept = points.len(), "Dropped short price rows");
    }

    // Fixed-width dates sort correctly as strings; stable sort keeps file order for ties.
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}
