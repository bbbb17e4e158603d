//! Dimension filtering.
//!
//! Filters are a conjunction of equality predicates over the four dashboard
//! dimensions. A predicate whose column is absent from the table is skipped
//! rather than failing, so partial schemas degrade to broader results.

use std::path::PathBuf;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::data::{ColumnSet, Record, Table};
use crate::types::Year;

/// Optional equality predicates over the dashboard dimensions.
///
/// `None` imposes no constraint; provided predicates combine with AND.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Match records whose `created_at` falls in this calendar year.
    pub year: Option<Year>,
    /// Match records with this flow identifier.
    pub flow: Option<String>,
    /// Match records with this service identifier.
    pub service: Option<String>,
    /// Match records with this form identifier.
    pub form: Option<String>,
}

impl FilterSpec {
    /// Constrain to a calendar year.
    pub fn with_year(mut self, year: Year) -> Self {
        self.year = Some(year);
        self
    }

    /// Constrain to a flow.
    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    /// Constrain to a service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Constrain to a form.
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Returns `true` when no predicate is set.
    pub fn is_unconstrained(&self) -> bool {
        self.year.is_none() && self.flow.is_none() && self.service.is_none() && self.form.is_none()
    }

    /// Apply this filter to a table.
    ///
    /// With zero predicates the base table is returned by shared reference
    /// (safe: published tables are immutable). Otherwise a fresh row vector
    /// is built and the result never aliases the input.
    pub fn apply(&self, table: &Table) -> Table {
        if self.is_unconstrained() || table.is_empty() {
            return table.clone();
        }
        let columns = table.columns();
        let rows: Vec<Record> = table
            .rows()
            .iter()
            .filter(|record| self.matches(record, columns))
            .cloned()
            .collect();
        table.with_rows(rows)
    }

    /// Whether one record satisfies every applicable predicate.
    ///
    /// Predicates on columns absent from `columns` are skipped; a predicate
    /// on a present column with a null cell does not match.
    pub fn matches(&self, record: &Record, columns: ColumnSet) -> bool {
        if let (Some(year), true) = (self.year, columns.created_at) {
            if record.created_at.map(|stamp| stamp.year()) != Some(year) {
                return false;
            }
        }
        if let (Some(flow), true) = (self.flow.as_deref(), columns.flow) {
            if record.flow_id.as_deref() != Some(flow) {
                return false;
            }
        }
        if let (Some(service), true) = (self.service.as_deref(), columns.service) {
            if record.service_id.as_deref() != Some(service) {
                return false;
            }
        }
        if let (Some(form), true) = (self.form.as_deref(), columns.form) {
            if record.form_id.as_deref() != Some(form) {
                return false;
            }
        }
        true
    }
}

/// Memoization key: source path plus the full filter tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FilterKey {
    pub path: PathBuf,
    pub spec: FilterSpec,
}
