// src/export/parquet_file.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, Int32Array, StringArray, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::Datelike;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{fs::File, path::Path, sync::Arc};
use tracing::debug;

use crate::panel::PanelRow;

/// `NaiveDate::num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn panel_schema() -> Schema {
    Schema::new(vec![
        Field::new("Year", DataType::Int32, false),
        Field::new("Month", DataType::UInt32, false),
        Field::new("Country", DataType::Utf8, false),
        Field::new("Type", DataType::Utf8, false),
        Field::new("Type_value", DataType::Utf8, true),
        Field::new("Format", DataType::Utf8, false),
        Field::new("Format_value", DataType::Utf8, true),
        Field::new("Date", DataType::Date32, true),
    ])
}

fn panel_batch(rows: &[PanelRow], schema: Arc<Schema>) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.period.year))),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.period.month))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.country))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.category))),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.category_value.as_deref()),
        )),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.format))),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.format_value.as_deref()),
        )),
        Arc::new(Date32Array::from_iter(rows.iter().map(|r| {
            r.period
                .first_day()
                .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        }))),
    ];
    RecordBatch::try_new(schema, columns).context("building panel record batch")
}

/// Same columns as the CSV plus a `Date` column (first day of the period).
pub fn write_panel_parquet(rows: &[PanelRow], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let schema = Arc::new(panel_schema());
    let batch = panel_batch(rows, Arc::clone(&schema))?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .context("creating Arrow writer for panel")?;
    writer.write(&batch).context("writing panel batch")?;
    writer.close().context("closing panel writer")?;
    debug!(rows = rows.len(), path = %path.display(), "wrote parquet panel");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_rows_and_nulls() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("panel.parquet");
        let rows = vec![
            PanelRow {
                period: Period::new(1970, 1).unwrap(),
                country: "DE".into(),
                category: "Total".into(),
                category_value: Some("100".into()),
                format: "PDF".into(),
                format_value: None,
            },
            PanelRow {
                period: Period::new(1970, 2).unwrap(),
                country: "FR".into(),
                category: "Total".into(),
                category_value: None,
                format: "HTML".into(),
                format_value: Some("7".into()),
            },
        ];

        write_panel_parquet(&rows, &path)?;

        let file = File::open(&path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);

        let batch = &batches[0];
        assert_eq!(batch.schema().field(6).name(), "Format_value");
        assert!(batch.column(6).is_null(0));
        assert!(batch.column(4).is_null(1));

        let dates = batch
            .column(7)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value(0), 0);
        assert_eq!(dates.value(1), 31);
        Ok(())
    }
}
