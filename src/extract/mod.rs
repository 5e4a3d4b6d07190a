// src/extract/mod.rs
//! Pulls the two statistics tables out of one report page.
//!
//! The country table has a `thead` row of country codes (first cell is a
//! period label) and `tbody` rows whose `th` cells name a document format and
//! whose `td` cells hold one value per country. The sector table has one
//! `tbody` row per category: a `th` label and a `td` value.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{trace, warn};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector should parse")
}

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static THEAD: Lazy<Selector> = Lazy::new(|| selector("thead"));
static TBODY: Lazy<Selector> = Lazy::new(|| selector("tbody"));
static TR: Lazy<Selector> = Lazy::new(|| selector("tr"));
static TH: Lazy<Selector> = Lazy::new(|| selector("th"));
static TD: Lazy<Selector> = Lazy::new(|| selector("td"));

/// `id` attributes of the two tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIds {
    pub country: String,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingTableError {
    #[error("no table with id `{0}`")]
    NotFound(String),
    #[error("table `{0}` has no header row")]
    NoHeader(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRow {
    /// One entry per `th` cell; usually a single format such as "PDF".
    pub labels: Vec<String>,
    /// Raw `td` text, positionally aligned with the header codes.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTable {
    /// Header codes with the leading label column dropped.
    pub codes: Vec<String>,
    pub rows: Vec<CountryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorRow {
    pub category: String,
    pub value: Option<String>,
}

/// Both tables of one page; each side fails independently.
#[derive(Debug)]
pub struct Extraction {
    pub country: Result<CountryTable, MissingTableError>,
    pub sector: Result<Vec<SectorRow>, MissingTableError>,
}

pub fn extract_tables(doc: &Html, ids: &TableIds, sector_headers: &[String]) -> Extraction {
    Extraction {
        country: extract_country_table(doc, &ids.country),
        sector: extract_sector_table(doc, &ids.sector, sector_headers),
    }
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn find_table<'a>(doc: &'a Html, id: &str) -> Result<ElementRef<'a>, MissingTableError> {
    doc.select(&TABLE)
        .find(|t| t.value().id() == Some(id))
        .ok_or_else(|| MissingTableError::NotFound(id.to_string()))
}

/// Rows of the first `tbody`; an absent body simply has no rows.
fn body_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .select(&TBODY)
        .next()
        .map(|body| body.select(&TR).collect())
        .unwrap_or_default()
}

pub fn extract_country_table(doc: &Html, id: &str) -> Result<CountryTable, MissingTableError> {
    let table = find_table(doc, id)?;
    let thead = table
        .select(&THEAD)
        .next()
        .ok_or_else(|| MissingTableError::NoHeader(id.to_string()))?;

    let codes: Vec<String> = thead.select(&TH).map(cell_text).skip(1).collect();
    trace!(codes = codes.len(), "country header");

    let rows = body_rows(table)
        .into_iter()
        .map(|tr| CountryRow {
            labels: tr.select(&TH).map(cell_text).collect(),
            values: tr.select(&TD).map(cell_text).collect(),
        })
        .collect();

    Ok(CountryTable { codes, rows })
}

/// Category labels of the sector table, in row order.
pub fn sector_reference_headers(doc: &Html, id: &str) -> Result<Vec<String>, MissingTableError> {
    let table = find_table(doc, id)?;
    Ok(table
        .select(&TBODY)
        .next()
        .map(|body| body.select(&TH).map(cell_text).collect())
        .unwrap_or_default())
}

/// Rows whose label is not among `sector_headers` are dropped with a warning.
pub fn extract_sector_table(
    doc: &Html,
    id: &str,
    sector_headers: &[String],
) -> Result<Vec<SectorRow>, MissingTableError> {
    let table = find_table(doc, id)?;
    let mut out = Vec::new();

    for tr in body_rows(table) {
        let Some(label) = tr.select(&TH).next().map(cell_text) else {
            warn!("sector row without a label cell, skipping");
            continue;
        };
        let Some(category) = sector_headers.iter().find(|h| **h == label) else {
            warn!(label = %label, "unknown sector label, skipping");
            continue;
        };
        out.push(SectorRow {
            category: category.clone(),
            value: tr.select(&TD).next().map(cell_text),
        });
    }

    Ok(out)
}
