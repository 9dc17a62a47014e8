use anyhow::{Context, bail};
use equitywatch::{
    DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
    models::{SymbolCatalog, normalize_symbol},
    services::{DEFAULT_DATA_DIR, DEFAULT_READ_TIMEOUT},
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// YAML-serializable configuration structure; every field is optional
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub default_symbol: Option<String>,
    pub default_days: Option<usize>,
    pub max_days: Option<usize>,
    pub read_timeout_secs: Option<u64>,
    pub rate_limit_per_second: Option<u64>,
    pub rate_limit_burst: Option<u32>,
    // symbol -> file name under data_dir
    pub symbols: Option<SymbolCatalog>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub default_symbol: String,
    pub default_days: usize,
    pub max_days: usize,
    pub read_timeout: Duration,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub catalog: SymbolCatalog,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_name: "equitywatch-proxy".to_string(),
            environment: "development".to_string(),
            port: 8888,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_symbol: "AAPL".to_string(),
            default_days: DEFAULT_WINDOW_DAYS,
            max_days: MAX_WINDOW_DAYS,
            read_timeout: DEFAULT_READ_TIMEOUT,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            catalog: SymbolCatalog::default(),
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Check for CONFIG_FILE environment variable first
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    // Load configuration from YAML file
    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        let defaults = Self::default();

        let config = Self {
            node_name: yaml_config.node_name.unwrap_or(defaults.node_name),
            environment: yaml_config.environment.unwrap_or(defaults.environment),
            port: yaml_config.port.unwrap_or(defaults.port),
            data_dir: yaml_config.data_dir.unwrap_or(defaults.data_dir),
            default_symbol: yaml_config
                .default_symbol
                .map(|s| normalize_symbol(&s))
                .unwrap_or(defaults.default_symbol),
            default_days: yaml_config.default_days.unwrap_or(defaults.default_days),
            max_days: yaml_config.max_days.unwrap_or(defaults.max_days),
            read_timeout: yaml_config
                .read_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            rate_limit_per_second: yaml_config
                .rate_limit_per_second
                .unwrap_or(defaults.rate_limit_per_second),
            rate_limit_burst: yaml_config.rate_limit_burst.unwrap_or(defaults.rate_limit_burst),
            catalog: yaml_config.symbols.unwrap_or(defaults.catalog),
        };
        config.validate()?;
        Ok(config)
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Build configuration from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            node_name: lookup("NODE_NAME").unwrap_or(defaults.node_name),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            default_symbol: lookup("DEFAULT_SYMBOL")
                .map(|s| normalize_symbol(&s))
                .unwrap_or(defaults.default_symbol),
            default_days: parse_or(&lookup, "DEFAULT_DAYS", defaults.default_days)?,
            max_days: parse_or(&lookup, "MAX_DAYS", defaults.max_days)?,
            read_timeout: Duration::from_secs(parse_or(
                &lookup,
                "READ_TIMEOUT_SECS",
                defaults.read_timeout.as_secs(),
            )?),
            rate_limit_per_second: parse_or(&lookup, "RATE_LIMIT_PER_SECOND", defaults.rate_limit_per_second)?,
            rate_limit_burst: parse_or(&lookup, "RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
            catalog: defaults.catalog,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.is_empty() {
            bail!("symbol catalog must not be empty");
        }
        if !self.catalog.contains(&self.default_symbol) {
            bail!("default symbol {} is not in the symbol catalog", self.default_symbol);
        }
        if self.max_days == 0 || self.default_days == 0 {
            bail!("default_days and max_days must be positive");
        }
        if self.read_timeout.is_zero() {
            bail!("read timeout must be positive");
        }
        if self.rate_limit_per_second == 0 || self.rate_limit_burst == 0 {
            bail!("rate limit settings must be positive");
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8888);
        assert_eq!(config.default_symbol, "AAPL");
        assert_eq!(config.default_days, 90);
        assert_eq!(config.max_days, 365);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("data/stocks"));
        assert_eq!(config.catalog.symbols(), vec!["AAPL", "GOOG", "MSFT", "SPY"]);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/srv/prices"),
            ("DEFAULT_SYMBOL", "spy"),
            ("MAX_DAYS", "180"),
            ("READ_TIMEOUT_SECS", "2"),
            ("NODE_NAME", "edge-1"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/srv/prices"));
        assert_eq!(config.default_symbol, "SPY");
        assert_eq!(config.max_days, 180);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.node_name, "edge-1");
    }

    #[test]
    fn test_invalid_environment_value_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_default_symbol_must_be_in_catalog() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DEFAULT_SYMBOL", "TSLA")])).is_err());
    }

    #[test]
    fn test_yaml_with_custom_catalog() {
        let yaml = r#"
node_name: yaml-node
port: 7000
data_dir: ./fixtures
default_symbol: qqq
max_days: 120
symbols:
  QQQ: qqq.csv
  spy: spy.csv
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.node_name, "yaml-node");
        assert_eq!(config.port, 7000);
        assert_eq!(config.default_symbol, "QQQ");
        assert_eq!(config.max_days, 120);
        assert_eq!(config.default_days, 90);
        assert_eq!(config.catalog.symbols(), vec!["QQQ", "SPY"]);
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "environment: production\nrate_limit_burst: 5\n").unwrap();

        let config = AppConfig::from_yaml(path.to_str().unwrap()).unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.rate_limit_burst, 5);
        assert_eq!(config.rate_limit_per_second, 10);
    }

    #[test]
    fn test_missing_yaml_file() {
        assert!(AppConfig::from_yaml("/nonexistent/equitywatch.yaml").is_err());
    }

    #[test]
    fn test_zero_max_days_rejected() {
        assert!(AppConfig::from_yaml_str("max_days: 0\n").is_err());
    }
}
