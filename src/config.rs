//! Run configuration, optionally read from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

pub const DEFAULT_TAXON: &str = "Podargus strigoides"; // Tawny Frogmouth
pub const DEFAULT_BASE_URL: &str = "https://api.inaturalist.org/v1/observations";
/// iNaturalist v1 caps `per_page` at 200
pub const DEFAULT_PER_PAGE: u32 = 200;
pub const DEFAULT_MAX_PAGES: u32 = 100;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1100;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub query: QueryConfig,
    pub fetch: FetchConfig,
}

/// What to count and over which dates
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub taxon: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Shown in the summary line, e.g. "Spring 2025"
    pub label: Option<String>,
}

/// How to talk to the observation API
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub per_page: u32,
    /// Page ceiling; the API may refuse deep pages without auth
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            taxon: DEFAULT_TAXON.to_string(),
            start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap_or_default(),
            label: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            user_agent: concat!("tawny-density/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 60,
        }
    }
}

impl FetchConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl QueryConfig {
    /// Label for the summary line, defaulting to the date window
    pub fn window_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{} to {}", self.start, self.end))
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.start > self.query.end {
            anyhow::bail!(
                "Start date {} is after end date {}",
                self.query.start,
                self.query.end
            );
        }
        if self.fetch.per_page == 0 || self.fetch.max_pages == 0 {
            anyhow::bail!("per_page and max_pages must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.query.taxon, DEFAULT_TAXON);
        assert_eq!(config.query.start.to_string(), "2025-09-01");
        assert_eq!(config.query.end.to_string(), "2025-11-30");
        assert_eq!(config.fetch.per_page, 200);
        assert_eq!(config.fetch.max_pages, 100);
        assert_eq!(config.fetch.page_delay(), Duration::from_millis(1100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tawny.toml");
        fs::write(
            &path,
            r#"
            [query]
            taxon = "Ninox strenua"
            label = "Winter 2025"

            [fetch]
            page_delay_ms = 0
            "#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.query.taxon, "Ninox strenua");
        assert_eq!(config.query.window_label(), "Winter 2025");
        assert_eq!(config.query.start.to_string(), "2025-09-01");
        assert_eq!(config.fetch.page_delay_ms, 0);
        assert_eq!(config.fetch.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_dates_parse_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [query]
            start = "2024-12-01"
            end = "2025-02-28"
            "#,
        )
        .unwrap();
        assert_eq!(config.query.window_label(), "2024-12-01 to 2025-02-28");
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let mut config = Config::default();
        config.query.start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file() {
        assert!(Config::load_from_file("/nonexistent/tawny.toml").is_err());
    }
}
