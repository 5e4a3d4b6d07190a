// src/schema/reconcile.rs

use std::sync::Arc;
use tracing::warn;

use crate::period::Period;

/// What `CanonicalSchema::reconcile` did with a page's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    Adopted,
    Unchanged,
    Overwritten { previous: Arc<[String]> },
}

/// The country codes currently used to align table values. A differing
/// header replaces it wholesale; records built earlier keep the codes they
/// were built with.
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    codes: Arc<[String]>,
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self {
            codes: Arc::from(Vec::new()),
        }
    }
}

impl CanonicalSchema {
    pub fn codes(&self) -> Arc<[String]> {
        Arc::clone(&self.codes)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Order-sensitive comparison; no merging.
    pub fn reconcile(&mut self, period: Period, header: Vec<String>) -> SchemaChange {
        if self.codes.is_empty() {
            self.codes = Arc::from(header);
            return SchemaChange::Adopted;
        }
        if *self.codes == *header {
            return SchemaChange::Unchanged;
        }

        warn!("Mismatch detected in {}!", period);
        warn!("Expected: {:?}", self.codes);
        warn!("Found: {:?}", header);
        let previous = std::mem::replace(&mut self.codes, Arc::from(header));
        SchemaChange::Overwritten { previous }
    }

    pub fn normalize(&self, values: Vec<String>) -> Vec<Option<String>> {
        normalize_values(values, self.codes.len())
    }
}

/// Right-pad with `None` or truncate so exactly `len` values remain.
pub fn normalize_values(values: Vec<String>, len: usize) -> Vec<Option<String>> {
    let mut out: Vec<Option<String>> = values.into_iter().take(len).map(Some).collect();
    out.resize(len, None);
    out
}
