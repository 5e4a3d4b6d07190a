// src/fetch/cache.rs

use anyhow::{Context, Result};
use glob::glob;
use rand::Rng;
use regex::Regex;
use reqwest::StatusCode;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, time::sleep};
use tracing::{debug, info, instrument, warn};

use super::{urls::Layout, PageSource};
use crate::period::Period;

/// Random pause between network calls, uniform in `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let (lo, hi) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "throttling");
            sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Already on disk; no network access happened.
    Cached(PathBuf),
    Downloaded(PathBuf),
    /// Server answered with a non-200 status; nothing was written.
    Failed(StatusCode),
}

impl FetchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Cached(p) | FetchOutcome::Downloaded(p) => Some(p),
            FetchOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub cached: usize,
    pub downloaded: usize,
    pub failed: usize,
}

/// Permanent on-disk cache of report pages in front of a `PageSource`.
pub struct PageCache<S> {
    source: S,
    layout: Layout,
    throttle: Throttle,
}

impl<S: PageSource + Sync> PageCache<S> {
    pub fn new(source: S, layout: Layout, throttle: Throttle) -> Self {
        Self {
            source,
            layout,
            throttle,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Return the cached page for `period`, downloading it if absent.
    /// A cached file is never refreshed. Transport errors abort the caller.
    #[instrument(level = "debug", skip_all, fields(period = %period))]
    pub async fn ensure_fetched(&self, period: Period) -> Result<FetchOutcome> {
        let path = self.layout.path_for(period);
        if fs::try_exists(&path)
            .await
            .with_context(|| format!("checking cache entry {}", path.display()))?
        {
            info!("File already exists: {}", path.display());
            return Ok(FetchOutcome::Cached(path));
        }

        let url = self.layout.url_for(period)?;
        info!("Downloading: {}", url);
        let page = self.source.get(&url).await?;

        let outcome = if page.status == StatusCode::OK {
            write_atomic(&path, page.body.as_bytes()).await?;
            info!("Saved: {}", path.display());
            FetchOutcome::Downloaded(path)
        } else {
            warn!("Failed to fetch {}: {}", url, page.status.as_u16());
            FetchOutcome::Failed(page.status)
        };

        self.throttle.pause().await;
        Ok(outcome)
    }

    /// Attempt every period in order, strictly one at a time.
    pub async fn fetch_all(&self, periods: &[Period]) -> Result<FetchSummary> {
        fs::create_dir_all(self.layout.cache_dir())
            .await
            .with_context(|| format!("creating {:?}", self.layout.cache_dir()))?;

        let mut summary = FetchSummary::default();
        for &period in periods {
            match self.ensure_fetched(period).await? {
                FetchOutcome::Cached(_) => summary.cached += 1,
                FetchOutcome::Downloaded(_) => summary.downloaded += 1,
                FetchOutcome::Failed(_) => summary.failed += 1,
            }
        }
        Ok(summary)
    }
}

/// Write through a sibling temp file and rename, so an interrupted run never
/// leaves a truncated page that later counts as cached.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
    fs::write(&tmp_path, bytes)
        .await
        .with_context(|| format!("writing {:?}", tmp_path))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

/// Periods that already have a page in the cache directory.
pub fn cached_periods(layout: &Layout) -> Result<BTreeSet<Period>> {
    let re = Regex::new(&format!(
        r"^{}_(\d{{4}})_(\d{{2}})\.html$",
        regex::escape(layout.file_prefix())
    ))?;
    let pattern = format!(
        "{}/{}_*.html",
        glob::Pattern::escape(&layout.cache_dir().display().to_string()),
        glob::Pattern::escape(layout.file_prefix())
    );

    let mut found = BTreeSet::new();
    for entry in glob(&pattern).context("invalid glob pattern for cache scan")? {
        let Ok(path) = entry else { continue };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(caps) = re.captures(name) else { continue };
        let (Ok(year), Ok(month)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        if let Some(period) = Period::new(year, month) {
            found.insert(period);
        }
    }
    Ok(found)
}
