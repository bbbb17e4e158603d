#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Core configuration types.
pub mod config;
/// Centralized constants used across loader, cache, and sampling.
pub mod constants;
/// Record, table, and status types.
pub mod data;
/// Field-name standardization and component classification.
pub mod enrichment;
/// Error types.
pub mod errors;
/// Dimension filter specs and memoization keys.
pub mod filter;
/// Source-file freshness tracking.
pub mod freshness;
/// Governance KPI aggregation.
pub mod kpi;
/// CSV ingestion with encoding and header normalization.
pub mod loader;
/// Filter-dropdown metadata extraction.
pub mod metadata;
/// Deterministic chart downsampling.
pub mod sampling;
/// The central caching store.
pub mod store;
/// Shared identifier aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

pub use config::CoreConfig;
pub use data::{ColumnSet, Enrichment, FlowStatus, Record, Table};
pub use enrichment::{component_type, enrich, is_standardized};
pub use errors::CoreError;
pub use filter::FilterSpec;
pub use kpi::{compute_kpis, standardization_by_flow, FlowStandardization, Kpis};
pub use loader::CsvLoader;
pub use metadata::MetadataSnapshot;
pub use sampling::sample;
pub use store::{CacheInfo, DataStore};
