// src/panel/mod.rs
//! Long-format panel: every country value of a period crossed with every
//! sector value of the same period.

use std::{collections::HashMap, sync::Arc};

use crate::period::Period;

/// One format row of the country table for one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub period: Period,
    pub format: String,
    /// Canonical codes in force when this record was built.
    pub codes: Arc<[String]>,
    /// Always `codes.len()` long.
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorRecord {
    pub period: Period,
    pub category: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub period: Period,
    pub country: String,
    pub category: String,
    pub category_value: Option<String>,
    pub format: String,
    pub format_value: Option<String>,
}

/// Cross join on period. Output order follows the inputs: country records,
/// then each record's codes, then sector records, with no re-sorting.
/// A period absent from `sectors` contributes nothing.
pub fn build_panel(countries: &[CountryRecord], sectors: &[SectorRecord]) -> Vec<PanelRow> {
    let mut by_period: HashMap<Period, Vec<&SectorRecord>> = HashMap::new();
    for s in sectors {
        by_period.entry(s.period).or_default().push(s);
    }

    let mut rows = Vec::new();
    for record in countries {
        let Some(matching) = by_period.get(&record.period) else {
            continue;
        };
        // positional: a header may repeat a code
        for (code, format_value) in record.codes.iter().zip(&record.values) {
            for sector in matching {
                rows.push(PanelRow {
                    period: record.period,
                    country: code.clone(),
                    category: sector.category.clone(),
                    category_value: sector.value.clone(),
                    format: record.format.clone(),
                    format_value: format_value.clone(),
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(year: i32, month: u32) -> Period {
        Period::new(year, month).unwrap()
    }

    fn codes(v: &[&str]) -> Arc<[String]> {
        v.iter().map(|s| s.to_string()).collect::<Vec<_>>().into()
    }

    fn country(period: Period, format: &str, codes: Arc<[String]>, values: &[&str]) -> CountryRecord {
        CountryRecord {
            period,
            format: format.into(),
            codes,
            values: values.iter().map(|v| Some(v.to_string())).collect(),
        }
    }

    fn sector(period: Period, category: &str, value: &str) -> SectorRecord {
        SectorRecord {
            period,
            category: category.into(),
            value: Some(value.into()),
        }
    }

    #[test]
    fn test_cross_join_cardinality() {
        let period = p(2010, 5);
        let cc = codes(&["DE", "FR", "IT"]);
        let countries = vec![
            country(period, "PDF", cc.clone(), &["1", "2", "3"]),
            country(period, "HTML", cc, &["4", "5", "6"]),
        ];
        let sectors: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|c| sector(period, c, "9"))
            .collect();

        let rows = build_panel(&countries, &sectors);
        assert_eq!(rows.len(), 2 * 3 * 4);
    }

    #[test]
    fn test_period_without_sectors_yields_nothing() {
        let cc = codes(&["DE"]);
        let countries = vec![
            country(p(2010, 1), "PDF", cc.clone(), &["1"]),
            country(p(2010, 2), "PDF", cc, &["2"]),
        ];
        let sectors = vec![sector(p(2010, 2), "Total", "100")];

        let rows = build_panel(&countries, &sectors);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period, p(2010, 2));
        assert_eq!(rows[0].format_value.as_deref(), Some("2"));

        assert!(build_panel(&countries, &[]).is_empty());
        assert!(build_panel(&[], &sectors).is_empty());
    }

    #[test]
    fn test_row_order_and_values() {
        let period = p(2003, 1);
        let countries = vec![country(period, "PDF", codes(&["DE", "FR"]), &["10", "20"])];
        let sectors = vec![sector(period, "Total", "100"), sector(period, "Treaties", "3")];

        let got: Vec<(String, String, Option<String>)> = build_panel(&countries, &sectors)
            .into_iter()
            .map(|r| (r.country, r.category, r.format_value))
            .collect();
        assert_eq!(
            got,
            vec![
                ("DE".into(), "Total".into(), Some("10".into())),
                ("DE".into(), "Treaties".into(), Some("10".into())),
                ("FR".into(), "Total".into(), Some("20".into())),
                ("FR".into(), "Treaties".into(), Some("20".into())),
            ]
        );
    }

    #[test]
    fn test_records_keep_their_own_codes() {
        // schema shrank between the two periods; each record keeps its width
        let countries = vec![
            country(p(2003, 1), "PDF", codes(&["A", "B", "C"]), &["1", "2", "3"]),
            country(p(2003, 2), "PDF", codes(&["A", "B"]), &["4", "5"]),
        ];
        let sectors = vec![sector(p(2003, 1), "T", "x"), sector(p(2003, 2), "T", "y")];

        let rows = build_panel(&countries, &sectors);
        assert_eq!(rows.len(), 3 + 2);
        assert_eq!(rows[2].country, "C");
        assert_eq!(rows[2].format_value.as_deref(), Some("3"));
        assert_eq!(rows[4].country, "B");
        assert_eq!(rows[4].category_value.as_deref(), Some("y"));
    }

    #[test]
    fn test_duplicate_codes_keep_their_own_values() {
        let period = p(2004, 3);
        let countries = vec![country(period, "PDF", codes(&["DE", "DE", "FR"]), &["1", "2", "3"])];
        let sectors = vec![sector(period, "Total", "100")];

        let got: Vec<(String, Option<String>)> = build_panel(&countries, &sectors)
            .into_iter()
            .map(|r| (r.country, r.format_value))
            .collect();
        assert_eq!(
            got,
            vec![
                ("DE".into(), Some("1".into())),
                ("DE".into(), Some("2".into())),
                ("FR".into(), Some("3".into())),
            ]
        );
    }

    #[test]
    fn test_missing_value_stays_empty() {
        let period = p(2003, 1);
        let mut record = country(period, "PDF", codes(&["A", "B"]), &["1"]);
        record.values.push(None);

        let rows = build_panel(&[record], &[sector(period, "T", "x")]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].format_value.as_deref(), Some("1"));
        assert_eq!(rows[1].format_value, None);
    }
}
