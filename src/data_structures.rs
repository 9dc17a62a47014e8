use crate::config::AppConfig;
use equitywatch::services::StockSummaryService;
use std::sync::Arc;

// --- Type Aliases for Shared State ---

// Summary service shared by every request handler
pub type SharedSummaryService = Arc<StockSummaryService>;

// Request defaults and bounds applied before calling the service
pub type SharedRequestLimits = Arc<RequestLimits>;

#[derive(Clone, Debug, PartialEq)]
pub struct RequestLimits {
    pub default_symbol: String,
    pub default_days: usize,
    pub max_days: usize,
}

impl RequestLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_symbol: config.default_symbol.clone(),
            default_days: config.default_days,
            max_days: config.max_days,
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
