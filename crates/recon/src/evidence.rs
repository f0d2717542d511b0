use std::collections::BTreeMap;

use crate::model::{DateKey, DayOverview, ReconClass, ReconSummary, ReconciliationResult};

/// Compute summary statistics from classified days and the daily overview.
pub fn compute_summary(
    results: &BTreeMap<DateKey, ReconciliationResult>,
    days: &BTreeMap<DateKey, DayOverview>,
) -> ReconSummary {
    let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut missing_manifest = 0;
    let mut reconciled = 0;
    let mut mismatch = 0;
    let mut capacity_violations = 0;

    for r in results.values() {
        *class_counts.entry(r.class.to_string()).or_insert(0) += 1;

        match r.class {
            ReconClass::MissingManifest => missing_manifest += 1,
            ReconClass::Reconciled => reconciled += 1,
            ReconClass::Mismatch => mismatch += 1,
        }
        if r.capacity_error {
            capacity_violations += 1;
        }
    }

    let days_with_activity = days.values().filter(|d| d.movement_count > 0).count();
    let days_over_max = days
        .values()
        .filter(|d| d.capacity.is_some_and(|c| c.over_max))
        .count();
    let days_over_effective = days
        .values()
        .filter(|d| d.capacity.is_some_and(|c| c.over_effective))
        .count();

    ReconSummary {
        total_days: days.len(),
        days_with_activity,
        missing_manifest,
        reconciled,
        mismatch,
        capacity_violations,
        days_over_max,
        days_over_effective,
        class_counts,
    }
}
