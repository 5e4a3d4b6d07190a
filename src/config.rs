// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;
use url::Url;

use crate::period::Period;

/// Environment variable naming an optional YAML overlay for [`Config`].
pub const CONFIG_ENV: &str = "EURLEX_PANEL_CONFIG";

/// Run settings. `Config::default()` is the stock EUR-Lex run; a YAML file
/// only needs the keys it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub page: String,
    pub first_year: i32,
    pub last_year: i32,
    pub cache_dir: PathBuf,
    pub file_prefix: String,
    pub output_csv: PathBuf,
    pub output_parquet: Option<PathBuf>,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub country_table_id: String,
    pub sector_table_id: String,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://eur-lex.europa.eu/statistics".into(),
            page: "eu-law-statistics.html".into(),
            first_year: 2003,
            last_year: 2025,
            cache_dir: PathBuf::from("html_files"),
            file_prefix: "eu_law_statistics".into(),
            output_csv: PathBuf::from("eu_law_statistics_panel.csv"),
            output_parquet: None,
            min_delay_ms: 1_000,
            max_delay_ms: 5_000,
            country_table_id: "textStatisticsTable".into(),
            sector_table_id: "sectorStatisticsTable".into(),
            preview_rows: 5,
        }
    }
}

impl Config {
    /// Defaults, overlaid by the YAML file named in `EURLEX_PANEL_CONFIG` if set.
    pub fn load() -> Result<Self> {
        let cfg = match env::var(CONFIG_ENV) {
            Ok(path) => {
                info!(path = %path, "loading config overlay");
                Self::from_yaml_file(&path)?
            }
            Err(_) => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            bail!(
                "empty year range: first_year {} > last_year {}",
                self.first_year,
                self.last_year
            );
        }
        if self.min_delay_ms > self.max_delay_ms {
            bail!(
                "min_delay_ms {} exceeds max_delay_ms {}",
                self.min_delay_ms,
                self.max_delay_ms
            );
        }
        Url::parse(&self.base_url).with_context(|| format!("parsing base_url {}", self.base_url))?;
        Ok(())
    }

    pub fn periods(&self) -> Vec<Period> {
        Period::range(self.first_year..=self.last_year)
    }

    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}
