// src/pipeline.rs

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::Config,
    export,
    extract::TableIds,
    fetch::{cache::cached_periods, FetchSummary, Layout, PageCache, PageSource, Throttle},
    panel::build_panel,
    process::collect_records,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetch: FetchSummary,
    pub documents: usize,
    pub country_records: usize,
    pub sector_records: usize,
    pub panel_rows: usize,
}

/// Download phase, then parse phase, then the join and export. Each phase
/// finishes before the next starts.
pub async fn run<S: PageSource + Sync>(cfg: &Config, source: S) -> Result<RunSummary> {
    let layout = Layout::from_config(cfg);
    let periods = cfg.periods();
    let (min, max) = cfg.delay_bounds();

    // ─── 1) fetch ────────────────────────────────────────────────────
    let already = cached_periods(&layout)?;
    info!(
        cached = already.len(),
        total = periods.len(),
        "already-fetched periods"
    );
    let cache = PageCache::new(source, layout.clone(), Throttle::new(min, max));
    let fetch = cache.fetch_all(&periods).await?;
    info!(
        cached = fetch.cached,
        downloaded = fetch.downloaded,
        failed = fetch.failed,
        "fetch phase done"
    );

    // ─── 2) parse ────────────────────────────────────────────────────
    let ids = TableIds {
        country: cfg.country_table_id.clone(),
        sector: cfg.sector_table_id.clone(),
    };
    let collected = tokio::task::spawn_blocking({
        let layout = layout.clone();
        let periods = periods.clone();
        move || collect_records(&layout, &ids, &periods)
    })
    .await
    .context("parse task panicked")??;

    // ─── 3) join + export ────────────────────────────────────────────
    let panel = build_panel(&collected.country, &collected.sector);
    for row in panel.iter().take(cfg.preview_rows) {
        info!(
            period = %row.period,
            country = %row.country,
            kind = %row.category,
            kind_value = ?row.category_value,
            format = %row.format,
            format_value = ?row.format_value,
            "panel preview"
        );
    }

    let panel_rows = panel.len();
    tokio::task::spawn_blocking({
        let output_csv = cfg.output_csv.clone();
        let output_parquet = cfg.output_parquet.clone();
        move || -> Result<()> {
            export::write_panel_csv(&panel, &output_csv)?;
            if let Some(path) = &output_parquet {
                export::write_panel_parquet(&panel, path)?;
                info!("Parquet panel saved to {}", path.display());
            }
            Ok(())
        }
    })
    .await
    .context("export task panicked")??;
    info!(
        rows = panel_rows,
        "Scraping completed and panel data saved to {}",
        cfg.output_csv.display()
    );

    Ok(RunSummary {
        fetch,
        documents: collected.documents,
        country_records: collected.country.len(),
        sector_records: collected.sector.len(),
        panel_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract::tests::report_html, fetch::cache::tests::StubSource};
    use reqwest::StatusCode;
    use std::{fs, path::Path, sync::atomic::Ordering};
    use tempfile::tempdir;

    fn test_config(dir: &Path) -> Config {
        Config {
            base_url: "https://example.test/statistics".into(),
            first_year: 2003,
            last_year: 2003,
            cache_dir: dir.join("html_files"),
            output_csv: dir.join("panel.csv"),
            output_parquet: Some(dir.join("panel.parquet")),
            min_delay_ms: 0,
            max_delay_ms: 0,
            ..Config::default()
        }
    }

    fn two_month_source() -> StubSource {
        let page = report_html(&["DE", "FR"], &[("PDF", "10,20")], &[("Total", "100")]);
        StubSource::default()
            .with_page(
                "https://example.test/statistics/2003/01/eu-law-statistics.html",
                StatusCode::OK,
                &page,
            )
            .with_page(
                "https://example.test/statistics/2003/02/eu-law-statistics.html",
                StatusCode::OK,
                &page,
            )
    }

    #[tokio::test]
    async fn test_two_documents_end_to_end() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = test_config(tmp.path());

        let summary = run(&cfg, two_month_source()).await?;
        assert_eq!(summary.fetch.downloaded, 2);
        assert_eq!(summary.fetch.failed, 10);
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.panel_rows, 4);

        let text = fs::read_to_string(&cfg.output_csv)?;
        assert_eq!(
            text,
            "Year,Month,Country,Type,Type_value,Format,Format_value\n\
             2003,1,DE,Total,100,PDF,10\n\
             2003,1,FR,Total,100,PDF,20\n\
             2003,2,DE,Total,100,PDF,10\n\
             2003,2,FR,Total,100,PDF,20\n"
        );
        assert!(cfg.output_parquet.as_ref().unwrap().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_rerun_is_cached_and_byte_identical() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = test_config(tmp.path());

        run(&cfg, two_month_source()).await?;
        let first = fs::read(&cfg.output_csv)?;

        let source = two_month_source();
        let summary = run(&cfg, &source).await?;
        let second = fs::read(&cfg.output_csv)?;

        assert_eq!(first, second);
        assert_eq!(summary.fetch.cached, 2);
        // only the ten missing months are retried
        assert_eq!(source.calls.load(Ordering::SeqCst), 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_export_failure_is_reported() -> Result<()> {
        let tmp = tempdir()?;
        let blocker = tmp.path().join("out");
        fs::write(&blocker, "not a directory")?;
        let cfg = Config {
            output_csv: blocker.join("panel.csv"),
            output_parquet: None,
            ..test_config(tmp.path())
        };

        assert!(run(&cfg, two_month_source()).await.is_err());
        // fetch finished before the export failed
        assert!(cfg.cache_dir.join("eu_law_statistics_2003_01.html").exists());
        Ok(())
    }
}
