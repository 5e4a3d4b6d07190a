// src/export/csv_file.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};

use crate::panel::PanelRow;

pub const PANEL_HEADER: [&str; 7] = [
    "Year",
    "Month",
    "Country",
    "Type",
    "Type_value",
    "Format",
    "Format_value",
];

/// Borrowed view of a `PanelRow` in output column order. `None` becomes an
/// empty field.
#[derive(Serialize)]
struct CsvRow<'a> {
    year: i32,
    month: u32,
    country: &'a str,
    category: &'a str,
    category_value: Option<&'a str>,
    format: &'a str,
    format_value: Option<&'a str>,
}

impl<'a> From<&'a PanelRow> for CsvRow<'a> {
    fn from(r: &'a PanelRow) -> Self {
        Self {
            year: r.period.year,
            month: r.period.month,
            country: &r.country,
            category: &r.category,
            category_value: r.category_value.as_deref(),
            format: &r.format,
            format_value: r.format_value.as_deref(),
        }
    }
}

/// The header is written even when `rows` is empty.
pub fn write_panel_csv_to<W: Write>(rows: &[PanelRow], out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    wtr.write_record(PANEL_HEADER)?;
    for row in rows {
        wtr.serialize(CsvRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_panel_csv(rows: &[PanelRow], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_panel_csv_to(rows, file).with_context(|| format!("writing {}", path.display()))
}
