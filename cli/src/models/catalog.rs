use crate::error::{SummaryError, SummaryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbols served out of the box, with their CSV file names.
pub const DEFAULT_SYMBOLS: [(&str, &str); 4] = [
    ("AAPL", "aapl.csv"),
    ("MSFT", "msft.csv"),
    ("GOOG", "goog.csv"),
    ("SPY", "spy.csv"),
];

/// Closed set of tickers and the source location backing each one.
///
/// Keys are stored uppercased; lookups are case-insensitive. Anything outside
/// the set is rejected rather than defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct SymbolCatalog {
    entries: BTreeMap<String, String>,
}

impl SymbolCatalog {
    pub fn new<I, S, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(symbol, location)| (normalize_symbol(symbol.as_ref()), location.into()))
                .collect(),
        }
    }

    /// Resolve a requested symbol to its normalized form and source location.
    pub fn resolve(&self, symbol: &str) -> SummaryResult<(String, &str)> {
        let normalized = normalize_symbol(symbol);
        match self.entries.get(&normalized) {
            Some(location) => Ok((normalized, location.as_str())),
            None => Err(SummaryError::UnsupportedSymbol(normalized)),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(&normalize_symbol(symbol))
    }

    /// Catalog symbols in sorted order.
    pub fn symbols(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOLS)
    }
}

impl From<BTreeMap<String, String>> for SymbolCatalog {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self::new(entries)
    }
}

impl From<SymbolCatalog> for BTreeMap<String, String> {
    fn from(catalog: SymbolCatalog) -> Self {
        catalog.entries
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = SymbolCatalog::default();
        assert_eq!(catalog.symbols(), vec!["AAPL", "GOOG", "MSFT", "SPY"]);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = SymbolCatalog::default();
        let (symbol, location) = catalog.resolve("msft").unwrap();
        assert_eq!(symbol, "MSFT");
        assert_eq!(location, "msft.csv");
        assert!(catalog.contains(" goog "));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let catalog = SymbolCatalog::default();
        match catalog.resolve("tsla") {
            Err(SummaryError::UnsupportedSymbol(symbol)) => assert_eq!(symbol, "TSLA"),
            other => panic!("expected UnsupportedSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_entries_are_uppercased() {
        let catalog = SymbolCatalog::new([("qqq", "nasdaq/qqq.csv")]);
        assert_eq!(catalog.symbols(), vec!["QQQ"]);
        assert_eq!(catalog.resolve("QQQ").unwrap().1, "nasdaq/qqq.csv");
        assert!(!catalog.contains("AAPL"));
    }

    #[test]
    fn test_deserialize_from_map() {
        let catalog: SymbolCatalog = serde_json::from_str(r#"{"spy": "spy.csv"}"#).unwrap();
        assert_eq!(catalog.resolve("SPY").unwrap().1, "spy.csv");
    }
}
