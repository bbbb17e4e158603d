use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::types::{
    Author, Caption, ComponentLabel, FieldName, FlowId, FormId, ServiceId, StepId,
};

/// Categorical workflow status decoded from the numeric source column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowStatus {
    /// Code 1.
    Active,
    /// Code 2.
    Concluded,
    /// Code 3.
    Cancelled,
    /// Code 4.
    Pending,
    /// Any other code.
    Other,
}

impl FlowStatus {
    /// Decode the numeric status code used by the source export.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Active,
            2 => Self::Concluded,
            3 => Self::Cancelled,
            4 => Self::Pending,
            _ => Self::Other,
        }
    }

    /// Human label shown by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Ativo",
            Self::Concluded => "Concluído",
            Self::Cancelled => "Cancelado",
            Self::Pending => "Pendente",
            Self::Other => "Outros",
        }
    }
}

/// Derived attributes computed by the enrichment engine, never by the loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Whether the field name follows an approved naming prefix.
    pub is_standardized: bool,
    /// UI widget category inferred from the field-name prefix.
    pub component_type: ComponentLabel,
}

/// One row of the source table. All source attributes are nullable; absent
/// cells load as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Workflow identifier.
    pub flow_id: Option<FlowId>,
    /// Service identifier.
    pub service_id: Option<ServiceId>,
    /// Form identifier.
    pub form_id: Option<FormId>,
    /// Process step.
    pub step_id: Option<StepId>,
    /// Raw field identifier; its naming convention drives enrichment.
    pub field_name: Option<FieldName>,
    /// Sub-field name used for variation analysis.
    pub child_field_name: Option<FieldName>,
    /// Sub-field caption used for variation analysis.
    pub child_caption: Option<Caption>,
    /// Record creation time; source of the `year` dimension.
    pub created_at: Option<DateTime<Utc>>,
    /// Decoded workflow status.
    pub flow_status: Option<FlowStatus>,
    /// Record author.
    pub author: Option<Author>,
    /// Derived fields; `None` until the enrichment engine runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched: Option<Enrichment>,
}

impl Record {
    /// Rough heap footprint of this record, for cache accounting.
    pub(crate) fn approx_bytes(&self) -> usize {
        fn str_bytes(value: &Option<String>) -> usize {
            value.as_ref().map(|s| s.capacity()).unwrap_or(0)
        }
        mem::size_of::<Self>()
            + str_bytes(&self.flow_id)
            + str_bytes(&self.service_id)
            + str_bytes(&self.form_id)
            + str_bytes(&self.step_id)
            + str_bytes(&self.field_name)
            + str_bytes(&self.child_field_name)
            + str_bytes(&self.child_caption)
            + str_bytes(&self.author)
            + self
                .enriched
                .as_ref()
                .map(|e| e.component_type.capacity())
                .unwrap_or(0)
    }
}

/// Which source columns were present in the loaded file.
///
/// Filtering and metadata extraction consult this so an absent column
/// degrades to a skipped predicate or an empty list instead of an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    /// `flow_id` present.
    pub flow: bool,
    /// `service_id` present.
    pub service: bool,
    /// `form_id` present.
    pub form: bool,
    /// `step_id` present.
    pub step: bool,
    /// `field_name` present.
    pub field_name: bool,
    /// `child_field_name` present.
    pub child_field_name: bool,
    /// `child_caption` present.
    pub child_caption: bool,
    /// `created_at` present.
    pub created_at: bool,
    /// `flow_status` present.
    pub flow_status: bool,
    /// `author` present.
    pub author: bool,
}

impl ColumnSet {
    /// Column set with every known column present; used by in-memory fixtures.
    pub fn full() -> Self {
        Self {
            flow: true,
            service: true,
            form: true,
            step: true,
            field_name: true,
            child_field_name: true,
            child_caption: true,
            created_at: true,
            flow_status: true,
            author: true,
        }
    }
}

/// Immutable in-memory table of records.
///
/// Row storage is shared behind an `Arc`: cloning a table is cheap, and a
/// published table is never mutated. Filtering builds a fresh row vector
/// except for the documented zero-predicate fast path, which aliases the
/// base storage.
#[derive(Clone, Debug)]
pub struct Table {
    rows: Arc<Vec<Record>>,
    columns: ColumnSet,
}

impl Table {
    /// Build a table from rows and the columns observed in the source.
    pub fn new(rows: Vec<Record>, columns: ColumnSet) -> Self {
        Self {
            rows: Arc::new(rows),
            columns,
        }
    }

    /// The zero-row sentinel returned when no data is available.
    pub fn empty() -> Self {
        Self::new(Vec::new(), ColumnSet::default())
    }

    /// Borrow the rows.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Columns present in the underlying source.
    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a derived table carrying the same column set.
    pub(crate) fn with_rows(&self, rows: Vec<Record>) -> Self {
        Self {
            rows: Arc::new(rows),
            columns: self.columns,
        }
    }

    /// Whether two tables alias the same row storage.
    pub fn shares_rows_with(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// Rough heap footprint of the table, for cache accounting.
    pub fn approx_mem_bytes(&self) -> usize {
        self.rows
            .iter()
            .map(Record::approx_bytes)
            .sum::<usize>()
            .max(mem::size_of::<Record>() * self.rows.len())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && *self.rows == *other.rows
    }
}
