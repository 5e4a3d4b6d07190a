// src/fetch/urls.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

use crate::{config::Config, period::Period};

/// Deterministic mapping from a `Period` to its report URL and cache file.
#[derive(Debug, Clone)]
pub struct Layout {
    base_url: String,
    page: String,
    cache_dir: PathBuf,
    file_prefix: String,
}

impl Layout {
    pub fn new(
        base_url: impl Into<String>,
        page: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page: page.into(),
            cache_dir: cache_dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.base_url.clone(),
            cfg.page.clone(),
            cfg.cache_dir.clone(),
            cfg.file_prefix.clone(),
        )
    }

    /// `{base}/{year}/{month:02}/{page}`
    pub fn url_for(&self, period: Period) -> Result<Url> {
        let raw = format!(
            "{}/{:04}/{:02}/{}",
            self.base_url, period.year, period.month, self.page
        );
        Url::parse(&raw).with_context(|| format!("parsing report URL {}", raw))
    }

    /// `{cache_dir}/{prefix}_{year}_{month:02}.html`
    pub fn path_for(&self, period: Period) -> PathBuf {
        self.cache_dir.join(format!(
            "{}_{:04}_{:02}.html",
            self.file_prefix, period.year, period.month
        ))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }
}
