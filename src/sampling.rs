//! Deterministic chart downsampling.
//!
//! Chart consumers cannot render hundreds of thousands of points, so
//! oversized subsets are reduced to a target size. Sampling is seeded and
//! therefore reproducible: the same table and target always yield the same
//! rows in the same order. Output preserves ascending base-row order, which
//! keeps every sample a strict, stably ordered subset of its input.

use std::collections::BTreeMap;

use chrono::Datelike;
use rand::RngCore;

use crate::constants::sampling::STRATIFY_THRESHOLD_FACTOR;
use crate::data::Table;
use crate::types::Year;

/// Small deterministic RNG (splitmix64) used for reproducible sampling.
#[derive(Clone, Debug)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// Downsample `table` to at most `target` rows with the given seed.
///
/// Tables at or under the target are returned unchanged (same storage).
/// When a year column is present and the table exceeds
/// [`STRATIFY_THRESHOLD_FACTOR`]` * target`, sampling is stratified by year
/// so charts keep their temporal shape; otherwise sampling is uniform.
pub fn sample(table: &Table, target: usize, seed: u64) -> Table {
    if table.len() <= target {
        return table.clone();
    }
    let mut rng = DeterministicRng::new(seed);
    let mut indices =
        if table.columns().created_at && table.len() > STRATIFY_THRESHOLD_FACTOR * target {
            stratified_indices(table, target, &mut rng)
        } else {
            uniform_indices(table.len(), target, &mut rng)
        };
    indices.sort_unstable();
    let rows = indices
        .into_iter()
        .map(|idx| table.rows()[idx].clone())
        .collect();
    table.with_rows(rows)
}

fn uniform_indices(len: usize, target: usize, rng: &mut DeterministicRng) -> Vec<usize> {
    rand::seq::index::sample(rng, len, target.min(len)).into_vec()
}

/// Partition rows by `created_at` year, draw an equal quota per year, then
/// top up from the remaining rows until the target is reached.
fn stratified_indices(table: &Table, target: usize, rng: &mut DeterministicRng) -> Vec<usize> {
    let mut strata: BTreeMap<Year, Vec<usize>> = BTreeMap::new();
    for (idx, record) in table.rows().iter().enumerate() {
        if let Some(stamp) = record.created_at {
            strata.entry(stamp.year()).or_default().push(idx);
        }
    }
    if strata.is_empty() {
        return uniform_indices(table.len(), target, rng);
    }

    let per_year = (target / strata.len()).max(1);
    let mut chosen: Vec<usize> = Vec::with_capacity(target);
    let mut taken = vec![false; table.len()];
    for indices in strata.values() {
        let quota = per_year.min(indices.len());
        for pos in rand::seq::index::sample(rng, indices.len(), quota) {
            let global = indices[pos];
            chosen.push(global);
            taken[global] = true;
        }
    }

    if chosen.len() > target {
        // More years than target rows: trim deterministically.
        let keep = rand::seq::index::sample(rng, chosen.len(), target);
        chosen = keep.into_iter().map(|pos| chosen[pos]).collect();
    } else if chosen.len() < target {
        let pool: Vec<usize> = (0..table.len()).filter(|idx| !taken[*idx]).collect();
        let need = (target - chosen.len()).min(pool.len());
        for pos in rand::seq::index::sample(rng, pool.len(), need) {
            chosen.push(pool[pos]);
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnSet, Record};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn dated_record(year: i32, ordinal: usize) -> Record {
        Record {
            flow_id: Some(format!("flow_{year}_{ordinal}")),
            service_id: None,
            form_id: None,
            step_id: None,
            field_name: None,
            child_field_name: None,
            child_caption: None,
            created_at: Some(Utc.with_ymd_and_hms(year, 3, 1, 0, 0, 0).unwrap()),
            flow_status: None,
            author: None,
            enriched: None,
        }
    }

    fn dated_table(per_year: usize, years: &[i32]) -> Table {
        let mut rows = Vec::new();
        for &year in years {
            for ordinal in 0..per_year {
                rows.push(dated_record(year, ordinal));
            }
        }
        Table::new(rows, ColumnSet::full())
    }

    #[test]
    fn small_tables_pass_through_unchanged() {
        let table = dated_table(5, &[2024]);
        let sampled = sample(&table, 10, 42);
        assert!(sampled.shares_rows_with(&table));
        assert_eq!(sampled.len(), 5);
    }

    #[test]
    fn sampling_is_deterministic() {
        let table = dated_table(200, &[2022, 2023, 2024]);
        let first = sample(&table, 60, 42);
        let second = sample(&table, 60, 42);
        assert_eq!(first, second);

        let reseeded = sample(&table, 60, 7);
        assert_eq!(reseeded.len(), first.len());
    }

    #[test]
    fn sampled_rows_are_a_subset_in_base_order() {
        let table = dated_table(100, &[2023, 2024]);
        let sampled = sample(&table, 50, 42);
        assert_eq!(sampled.len(), 50);

        // Row ids are unique, so positions in the base table are well defined
        // and must be strictly increasing.
        let base_ids: Vec<&str> = table
            .rows()
            .iter()
            .map(|r| r.flow_id.as_deref().unwrap())
            .collect();
        let positions: Vec<usize> = sampled
            .rows()
            .iter()
            .map(|row| {
                let id = row.flow_id.as_deref().unwrap();
                base_ids
                    .iter()
                    .position(|candidate| *candidate == id)
                    .expect("sampled row must come from the base table")
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn stratified_sampling_covers_every_year() {
        let table = dated_table(300, &[2021, 2022, 2023, 2024]);
        // 1200 rows > 2 * 100 triggers stratification.
        let sampled = sample(&table, 100, 42);
        assert_eq!(sampled.len(), 100);
        let years: HashSet<i32> = sampled
            .rows()
            .iter()
            .map(|r| r.created_at.unwrap().year())
            .collect();
        assert_eq!(years.len(), 4);
    }

    #[test]
    fn uniform_path_applies_without_a_year_column() {
        let mut columns = ColumnSet::full();
        columns.created_at = false;
        let rows: Vec<Record> = (0..500)
            .map(|ordinal| {
                let mut record = dated_record(2024, ordinal);
                record.created_at = None;
                record
            })
            .collect();
        let table = Table::new(rows, columns);
        let sampled = sample(&table, 40, 42);
        assert_eq!(sampled.len(), 40);
    }

    #[test]
    fn undated_rows_can_still_top_up_a_stratified_sample() {
        let mut rows = Vec::new();
        for ordinal in 0..30 {
            rows.push(dated_record(2024, ordinal));
        }
        for ordinal in 30..300 {
            let mut record = dated_record(2024, ordinal);
            record.created_at = None;
            rows.push(record);
        }
        let table = Table::new(rows, ColumnSet::full());
        let sampled = sample(&table, 100, 42);
        assert_eq!(sampled.len(), 100);
        assert!(sampled.rows().iter().any(|r| r.created_at.is_none()));
    }
}
