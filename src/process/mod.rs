// src/process/mod.rs
use anyhow::{Context, Result};
use scraper::Html;
use std::{fs, io};
use tracing::{debug, info, info_span, warn};

use crate::{
    extract::{self, TableIds},
    fetch::Layout,
    panel::{CountryRecord, SectorRecord},
    period::Period,
    schema::{CanonicalSchema, SchemaChange},
};

/// Everything the parse phase accumulates for the panel join.
#[derive(Debug, Default)]
pub struct Collected {
    pub country: Vec<CountryRecord>,
    pub sector: Vec<SectorRecord>,
    /// Canonical codes after the last page.
    pub schema: CanonicalSchema,
    pub sector_headers: Vec<String>,
    pub documents: usize,
    pub missing: usize,
}

/// Read the cached page for `period`; `Ok(None)` when it was never downloaded.
fn read_cached(layout: &Layout, period: Period) -> Result<Option<Html>> {
    let path = layout.path_for(period);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(Html::parse_document(&text))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Sector labels are taken once, from the first page of the range. When that
/// page is not cached or has no sector table, the first page that has one is
/// used.
pub fn load_sector_headers(
    layout: &Layout,
    ids: &TableIds,
    periods: &[Period],
) -> Result<Vec<String>> {
    for (i, &period) in periods.iter().enumerate() {
        let Some(doc) = read_cached(layout, period)? else {
            debug!(period = %period, "not cached, no sector labels here");
            continue;
        };
        match extract::sector_reference_headers(&doc, &ids.sector) {
            Ok(headers) => {
                if i > 0 {
                    warn!(
                        period = %period,
                        skipped = i,
                        "sector labels taken from a later page; earlier pages missing or without a sector table"
                    );
                }
                debug!(period = %period, labels = ?headers, "sector labels");
                return Ok(headers);
            }
            Err(e) => warn!(period = %period, error = %e, "cached page has no usable sector labels"),
        }
    }
    warn!("no cached page has a sector table; sector data will be empty");
    Ok(Vec::new())
}

/// Parse every cached page in `periods` order, reconciling country headers
/// against a running canonical schema.
#[tracing::instrument(level = "info", skip_all, fields(periods = periods.len()))]
pub fn collect_records(layout: &Layout, ids: &TableIds, periods: &[Period]) -> Result<Collected> {
    let sector_headers = load_sector_headers(layout, ids, periods)?;
    let mut out = Collected {
        sector_headers,
        ..Collected::default()
    };

    for &period in periods {
        let _span = info_span!("page", period = %period).entered();
        let Some(doc) = read_cached(layout, period)? else {
            warn!("No cached page for {}", period);
            out.missing += 1;
            continue;
        };
        out.documents += 1;

        let extraction = extract::extract_tables(&doc, ids, &out.sector_headers);

        match extraction.country {
            Ok(table) => {
                if let SchemaChange::Overwritten { previous } =
                    out.schema.reconcile(period, table.codes)
                {
                    debug!(previous = previous.len(), now = out.schema.len(), "schema replaced");
                }
                let codes = out.schema.codes();
                for row in table.rows {
                    let values = out.schema.normalize(row.values);
                    for label in row.labels {
                        out.country.push(CountryRecord {
                            period,
                            format: label,
                            codes: codes.clone(),
                            values: values.clone(),
                        });
                    }
                }
            }
            Err(e) => warn!("No country-specific table found for {}: {}", period, e),
        }

        match extraction.sector {
            Ok(rows) => out.sector.extend(rows.into_iter().map(|r| SectorRecord {
                period,
                category: r.category,
                value: r.value,
            })),
            Err(e) => warn!("No sector table found for {}: {}", period, e),
        }
    }

    info!(
        documents = out.documents,
        missing = out.missing,
        country_records = out.country.len(),
        sector_records = out.sector.len(),
        "parsed cached pages"
    );
    Ok(out)
}
