//! Governance KPI computation over a (filtered) table.
//!
//! Pure aggregate functions consumed by the dashboard's indicator cards and
//! the per-flow standardization table. Distinct-field counting is the unit
//! everywhere: the same field name repeated across rows counts once.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::data::{Record, Table};
use crate::enrichment;

/// Headline indicators for a table subset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Distinct flows.
    pub flow_count: usize,
    /// Distinct services.
    pub service_count: usize,
    /// Distinct forms.
    pub form_count: usize,
    /// Distinct process steps.
    pub step_count: usize,
    /// Distinct field names.
    pub distinct_field_count: usize,
    /// Distinct field names that follow an approved prefix.
    pub standardized_field_count: usize,
    /// Percentage of distinct fields that are standardized (0..=100).
    pub standardized_pct: f64,
    /// Mean distinct fields per flow.
    pub mean_fields_per_flow: f64,
    /// Mean distinct fields per form.
    pub mean_fields_per_form: f64,
    /// Mean of the per-flow standardization percentages (0..=100).
    pub mean_flow_standardized_pct: f64,
}

/// Per-flow standardization share for the comparison table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowStandardization {
    /// Flow identifier.
    pub flow: String,
    /// Percentage of the flow's distinct fields that are standardized.
    pub standardized_pct: f64,
}

fn record_is_standardized(record: &Record) -> bool {
    match record.enriched.as_ref() {
        Some(derived) => derived.is_standardized,
        None => enrichment::is_standardized(record.field_name.as_deref()),
    }
}

/// Compute the headline KPIs for a table. Empty tables yield zeroed KPIs.
pub fn compute_kpis(table: &Table) -> Kpis {
    let mut kpis = Kpis::default();
    if table.is_empty() {
        return kpis;
    }

    let mut flows: HashSet<&str> = HashSet::new();
    let mut services: HashSet<&str> = HashSet::new();
    let mut forms: HashSet<&str> = HashSet::new();
    let mut steps: HashSet<&str> = HashSet::new();
    let mut fields: HashSet<&str> = HashSet::new();
    let mut standardized_fields: HashSet<&str> = HashSet::new();
    let mut fields_per_flow: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut fields_per_form: HashMap<&str, HashSet<&str>> = HashMap::new();

    for record in table.rows() {
        if let Some(flow) = record.flow_id.as_deref() {
            flows.insert(flow);
            if let Some(field) = record.field_name.as_deref() {
                fields_per_flow.entry(flow).or_default().insert(field);
            }
        }
        if let Some(service) = record.service_id.as_deref() {
            services.insert(service);
        }
        if let Some(form) = record.form_id.as_deref() {
            forms.insert(form);
            if let Some(field) = record.field_name.as_deref() {
                fields_per_form.entry(form).or_default().insert(field);
            }
        }
        if let Some(step) = record.step_id.as_deref() {
            steps.insert(step);
        }
        if let Some(field) = record.field_name.as_deref() {
            fields.insert(field);
            if record_is_standardized(record) {
                standardized_fields.insert(field);
            }
        }
    }

    kpis.flow_count = flows.len();
    kpis.service_count = services.len();
    kpis.form_count = forms.len();
    kpis.step_count = steps.len();
    kpis.distinct_field_count = fields.len();
    kpis.standardized_field_count = standardized_fields.len();
    if !fields.is_empty() {
        kpis.standardized_pct = standardized_fields.len() as f64 / fields.len() as f64 * 100.0;
    }
    kpis.mean_fields_per_flow = mean_group_size(&fields_per_flow);
    kpis.mean_fields_per_form = mean_group_size(&fields_per_form);

    let per_flow = standardization_by_flow(table);
    if !per_flow.is_empty() {
        kpis.mean_flow_standardized_pct = per_flow
            .iter()
            .map(|entry| entry.standardized_pct)
            .sum::<f64>()
            / per_flow.len() as f64;
    }
    kpis
}

/// Per-flow standardization percentages, sorted by flow identifier.
///
/// Flows without any field names are omitted (no denominator).
pub fn standardization_by_flow(table: &Table) -> Vec<FlowStandardization> {
    let mut fields_per_flow: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut standardized_per_flow: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in table.rows() {
        let (Some(flow), Some(field)) = (record.flow_id.as_deref(), record.field_name.as_deref())
        else {
            continue;
        };
        fields_per_flow.entry(flow).or_default().insert(field);
        if record_is_standardized(record) {
            standardized_per_flow.entry(flow).or_default().insert(field);
        }
    }
    let mut result: Vec<FlowStandardization> = fields_per_flow
        .into_iter()
        .map(|(flow, fields)| {
            let standardized = standardized_per_flow
                .get(flow)
                .map(HashSet::len)
                .unwrap_or(0);
            FlowStandardization {
                flow: flow.to_string(),
                standardized_pct: standardized as f64 / fields.len() as f64 * 100.0,
            }
        })
        .collect();
    result.sort_by(|a, b| a.flow.cmp(&b.flow));
    result
}

fn mean_group_size(groups: &HashMap<&str, HashSet<&str>>) -> f64 {
    if groups.is_empty() {
        return 0.0;
    }
    groups.values().map(|set| set.len() as f64).sum::<f64>() / groups.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnSet;

    fn record(flow: &str, form: &str, field: &str) -> Record {
        Record {
            flow_id: Some(flow.to_string()),
            service_id: Some(format!("svc_{flow}")),
            form_id: Some(form.to_string()),
            step_id: Some("triagem".to_string()),
            field_name: Some(field.to_string()),
            child_field_name: None,
            child_caption: None,
            created_at: None,
            flow_status: None,
            author: None,
            enriched: None,
        }
    }

    fn fixture() -> Table {
        Table::new(
            vec![
                record("A", "F1", "TXT_NOME"),
                record("A", "F1", "TXT_NOME"),
                record("A", "F2", "ZZZ_CUSTOM"),
                record("B", "F3", "CPF_NUM"),
                record("B", "F3", "CHK_ACEITE"),
            ],
            ColumnSet::full(),
        )
    }

    #[test]
    fn counts_are_distinct_not_row_based() {
        let kpis = compute_kpis(&fixture());
        assert_eq!(kpis.flow_count, 2);
        assert_eq!(kpis.service_count, 2);
        assert_eq!(kpis.form_count, 3);
        assert_eq!(kpis.step_count, 1);
        assert_eq!(kpis.distinct_field_count, 4);
        assert_eq!(kpis.standardized_field_count, 3);
        assert!((kpis.standardized_pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn per_flow_means_average_over_groups() {
        let kpis = compute_kpis(&fixture());
        // Flow A has 2 distinct fields, flow B has 2.
        assert!((kpis.mean_fields_per_flow - 2.0).abs() < 1e-9);
        // F1 has 1, F2 has 1, F3 has 2.
        assert!((kpis.mean_fields_per_form - 4.0 / 3.0).abs() < 1e-9);
        // Flow A: 1/2 standardized; flow B: 2/2.
        assert!((kpis.mean_flow_standardized_pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn standardization_by_flow_is_sorted_and_exact() {
        let per_flow = standardization_by_flow(&fixture());
        assert_eq!(per_flow.len(), 2);
        assert_eq!(per_flow[0].flow, "A");
        assert!((per_flow[0].standardized_pct - 50.0).abs() < 1e-9);
        assert_eq!(per_flow[1].flow, "B");
        assert!((per_flow[1].standardized_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_table_yields_zeroed_kpis() {
        assert_eq!(compute_kpis(&Table::empty()), Kpis::default());
        assert!(standardization_by_flow(&Table::empty()).is_empty());
    }

    #[test]
    fn enriched_tables_use_the_stored_flag() {
        let enriched = crate::enrichment::enrich(&fixture());
        assert_eq!(compute_kpis(&enriched), compute_kpis(&fixture()));
    }

    #[test]
    fn kpis_serialize_as_a_flat_json_payload() {
        let value = serde_json::to_value(compute_kpis(&fixture())).unwrap();
        assert_eq!(value["flow_count"], 2);
        assert_eq!(value["standardized_field_count"], 3);
        assert!((value["standardized_pct"].as_f64().unwrap() - 75.0).abs() < 1e-9);

        let table = serde_json::to_value(standardization_by_flow(&fixture())).unwrap();
        assert_eq!(table[0]["flow"], "A");
    }
}
