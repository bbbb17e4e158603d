//! Filter-dropdown metadata extraction.

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::types::Year;

/// Sorted distinct dimension values present in a loaded table.
///
/// Computed together with the base table and invalidated with it, so the
/// snapshot is never stale relative to the rows it describes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    /// Distinct calendar years from `created_at`.
    pub years: Vec<Year>,
    /// Distinct flow identifiers.
    pub flows: Vec<String>,
    /// Distinct service identifiers.
    pub services: Vec<String>,
    /// Distinct form identifiers.
    pub forms: Vec<String>,
}

impl MetadataSnapshot {
    /// Extract the snapshot from a table. Absent columns and empty tables
    /// yield empty lists.
    pub fn extract(table: &Table) -> Self {
        let mut years: BTreeSet<Year> = BTreeSet::new();
        let mut flows: BTreeSet<&str> = BTreeSet::new();
        let mut services: BTreeSet<&str> = BTreeSet::new();
        let mut forms: BTreeSet<&str> = BTreeSet::new();
        for record in table.rows() {
            if let Some(stamp) = record.created_at {
                years.insert(stamp.year());
            }
            if let Some(flow) = record.flow_id.as_deref() {
                flows.insert(flow);
            }
            if let Some(service) = record.service_id.as_deref() {
                services.insert(service);
            }
            if let Some(form) = record.form_id.as_deref() {
                forms.insert(form);
            }
        }
        Self {
            years: years.into_iter().collect(),
            flows: flows.into_iter().map(str::to_string).collect(),
            services: services.into_iter().map(str::to_string).collect(),
            forms: forms.into_iter().map(str::to_string).collect(),
        }
    }

    /// Returns `true` when every dimension list is empty.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
            && self.flows.is_empty()
            && self.services.is_empty()
            && self.forms.is_empty()
    }
}
