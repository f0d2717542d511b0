use std::collections::{BTreeMap, HashMap};

use crate::aggregate::day_totals;
use crate::cargo_filter::CargoFilter;
use crate::model::{
    AircraftTypeLimits, DailyMovements, DateKey, DayTotals, ManifestCounts, ManifestEntry,
    ReconClass, ReconciliationResult,
};

/// Index the catalog by ISO date. The first entry for a date wins.
pub fn index_manifests(catalog: &[ManifestEntry]) -> HashMap<String, &ManifestEntry> {
    let mut index: HashMap<String, &ManifestEntry> = HashMap::new();
    for entry in catalog {
        let key = entry.meta.date.trim().to_string();
        if index.contains_key(&key) {
            log::debug!("manifest '{}' shadowed by an earlier entry for {key}", entry.id);
            continue;
        }
        index.insert(key, entry);
    }
    index
}

/// Limits for an aircraft type (trimmed, case-insensitive).
pub fn find_aircraft<'a>(
    limits: &'a [AircraftTypeLimits],
    aircraft_type: &str,
) -> Option<&'a AircraftTypeLimits> {
    let wanted = aircraft_type.trim();
    if wanted.is_empty() {
        return None;
    }
    limits
        .iter()
        .find(|l| l.aircraft_type.trim().eq_ignore_ascii_case(wanted))
}

/// Classify every date in `dates`. Dates with nothing to report are absent.
pub fn reconcile(
    dates: &[DateKey],
    movements: &DailyMovements,
    catalog: &[ManifestEntry],
    aircraft: &[AircraftTypeLimits],
    filter: &CargoFilter,
) -> BTreeMap<DateKey, ReconciliationResult> {
    let index = index_manifests(catalog);

    dates
        .iter()
        .filter_map(|date| {
            let planner = day_totals(movements, date);
            let manifest = index.get(&date.to_iso()).copied();
            reconcile_day(*date, planner, manifest, aircraft, filter).map(|r| (*date, r))
        })
        .collect()
}

/// Compare one day's planner movements with its manifest.
///
/// Returns `None` when there is no planner activity and no manifest, and also
/// when there is a manifest but no planner activity and no capacity violation.
///
/// An aircraft limit breach is always reported: a manifest over its limits is
/// `Mismatch` with `capacity_error` set even on a day the planner shows no
/// movement.
pub fn reconcile_day(
    date: DateKey,
    planner: DayTotals,
    manifest: Option<&ManifestEntry>,
    aircraft: &[AircraftTypeLimits],
    filter: &CargoFilter,
) -> Option<ReconciliationResult> {
    let planner_count = planner.total();

    let Some(entry) = manifest else {
        if planner_count == 0 {
            return None;
        }
        return Some(ReconciliationResult {
            date,
            class: ReconClass::MissingManifest,
            planner_count,
            manifest_count: 0,
            planner,
            manifest: None,
            capacity_error: false,
            reasons: Vec::new(),
        });
    };

    let counts = manifest_counts(entry, filter);
    let manifest_count = counts.filtered_total() as u64;

    let mut reasons = match find_aircraft(aircraft, &entry.meta.aircraft_type) {
        Some(limits) => capacity_reasons(&counts, limits),
        None => Vec::new(),
    };
    let capacity_error = !reasons.is_empty();

    let class = if capacity_error {
        reasons.push(counts_line(&planner, &counts));
        ReconClass::Mismatch
    } else if planner_count > 0 && manifest_count != planner_count {
        reasons.push(format!("Planner PAX {planner_count} vs Manifest {manifest_count}"));
        reasons.push(counts_line(&planner, &counts));
        ReconClass::Mismatch
    } else if planner_count > 0 {
        ReconClass::Reconciled
    } else {
        return None;
    };

    Some(ReconciliationResult {
        date,
        class,
        planner_count,
        manifest_count,
        planner,
        manifest: Some(counts),
        capacity_error,
        reasons,
    })
}

pub fn manifest_counts(entry: &ManifestEntry, filter: &CargoFilter) -> ManifestCounts {
    ManifestCounts {
        manifest_id: entry.id.clone(),
        aircraft_type: entry.meta.aircraft_type.clone(),
        flight_number: entry.meta.flight_number.clone(),
        outbound_raw: entry.outbound.len(),
        outbound_filtered: filter.personnel(&entry.outbound).len(),
        inbound_raw: entry.inbound.len(),
        inbound_filtered: filter.personnel(&entry.inbound).len(),
        outbound_weight: entry.outbound.iter().map(|p| p.total_weight()).sum(),
        inbound_weight: entry.inbound.iter().map(|p| p.total_weight()).sum(),
    }
}

/// Limit violations against raw (unfiltered) lists: pax, then OB, then IB weight.
fn capacity_reasons(counts: &ManifestCounts, limits: &AircraftTypeLimits) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(max) = positive(limits.max_pax) {
        let pax = counts.raw_total() as f64;
        if pax > max {
            reasons.push(format!("PAX {}/{} OVER", fmt_amount(pax), fmt_amount(max)));
        }
    }
    if let Some(max) = positive(limits.max_outbound_weight) {
        if counts.outbound_weight > max {
            reasons.push(format!(
                "OB WT {}/{} OVER",
                fmt_amount(counts.outbound_weight),
                fmt_amount(max)
            ));
        }
    }
    if let Some(max) = positive(limits.max_inbound_weight) {
        if counts.inbound_weight > max {
            reasons.push(format!(
                "IB WT {}/{} OVER",
                fmt_amount(counts.inbound_weight),
                fmt_amount(max)
            ));
        }
    }

    reasons
}

fn counts_line(planner: &DayTotals, counts: &ManifestCounts) -> String {
    format!(
        "Counts: Planner OB {} / IB {} | Manifest OB {} ({}) / IB {} ({})",
        planner.outbound,
        planner.inbound,
        counts.outbound_raw,
        counts.outbound_filtered,
        counts.inbound_raw,
        counts.inbound_filtered,
    )
}

fn positive(limit: Option<f64>) -> Option<f64> {
    limit.filter(|l| *l > 0.0)
}

/// Whole numbers print without a fraction; others round to 2 places.
fn fmt_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ManifestMeta, Passenger};

    fn d(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    fn manifest(date: &str, aircraft: &str, outbound: usize, inbound: usize) -> ManifestEntry {
        ManifestEntry {
            id: format!("m-{date}"),
            meta: ManifestMeta {
                date: date.into(),
                aircraft_type: aircraft.into(),
                flight_number: "HX101".into(),
            },
            outbound: (0..outbound)
                .map(|i| Passenger::new(format!("Out {i}"), "Ops").weighing(90.0, 10.0))
                .collect(),
            inbound: (0..inbound)
                .map(|i| Passenger::new(format!("In {i}"), "Ops").weighing(80.0, 5.0))
                .collect(),
        }
    }

    fn totals(outbound: u64, inbound: u64) -> DayTotals {
        DayTotals { outbound, inbound }
    }

    #[test]
    fn activity_without_manifest_is_missing() {
        let r = reconcile_day(d("1/2/2025"), totals(5, 0), None, &[], &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::MissingManifest);
        assert_eq!(r.planner_count, 5);
        assert!(r.reasons.is_empty());
    }

    #[test]
    fn quiet_day_without_manifest_is_absent() {
        assert!(reconcile_day(d("1/2/2025"), totals(0, 0), None, &[], &CargoFilter::default()).is_none());
    }

    #[test]
    fn matching_counts_reconcile() {
        let m = manifest("2025-01-02", "AW139", 3, 2);
        let r = reconcile_day(d("1/2/2025"), totals(3, 2), Some(&m), &[], &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Reconciled);
        assert_eq!(r.manifest_count, 5);
        assert!(r.reasons.is_empty());
    }

    #[test]
    fn direction_split_is_not_compared() {
        // Only the day total has to agree.
        let m = manifest("2025-01-02", "AW139", 1, 4);
        let r = reconcile_day(d("1/2/2025"), totals(5, 0), Some(&m), &[], &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Reconciled);
    }

    #[test]
    fn count_mismatch_reports_both_sides() {
        let mut m = manifest("2025-01-02", "AW139", 3, 1);
        m.outbound.push(Passenger::new("Spare parts", "Vendor"));
        let r = reconcile_day(d("1/2/2025"), totals(3, 2), Some(&m), &[], &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Mismatch);
        assert!(!r.capacity_error);
        assert_eq!(
            r.reasons,
            vec![
                "Planner PAX 5 vs Manifest 4".to_string(),
                "Counts: Planner OB 3 / IB 2 | Manifest OB 4 (3) / IB 1 (1)".to_string(),
            ]
        );
    }

    #[test]
    fn pax_limit_violation() {
        let m = manifest("2025-01-02", "Bell 412", 4, 2);
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "bell 412".into(),
            max_pax: Some(4.0),
            ..Default::default()
        }];
        let r = reconcile_day(d("1/2/2025"), totals(4, 2), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Mismatch);
        assert!(r.capacity_error);
        assert_eq!(r.reasons[0], "PAX 6/4 OVER");
        assert!(r.reasons[1].starts_with("Counts: "));
        assert_eq!(r.reasons.len(), 2);
    }

    #[test]
    fn raw_pax_includes_cargo_lines() {
        let mut m = manifest("2025-01-02", "S92", 2, 0);
        m.outbound.push(Passenger::new("Mail", "Post"));
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "S92".into(),
            max_pax: Some(2.0),
            ..Default::default()
        }];
        let r = reconcile_day(d("1/2/2025"), totals(2, 0), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert_eq!(r.reasons[0], "PAX 3/2 OVER");
        assert_eq!(r.manifest_count, 2);
    }

    #[test]
    fn weight_reasons_follow_pax_reason() {
        let m = manifest("2025-01-02", "S92", 3, 2);
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "S92".into(),
            max_pax: Some(4.0),
            max_outbound_weight: Some(250.0),
            max_inbound_weight: Some(169.5),
        }];
        let r = reconcile_day(d("1/2/2025"), totals(3, 2), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert_eq!(
            r.reasons,
            vec![
                "PAX 5/4 OVER".to_string(),
                "OB WT 300/250 OVER".to_string(),
                "IB WT 170/169.5 OVER".to_string(),
                "Counts: Planner OB 3 / IB 2 | Manifest OB 3 (3) / IB 2 (2)".to_string(),
            ]
        );
    }

    #[test]
    fn capacity_error_takes_precedence_over_count_mismatch() {
        let m = manifest("2025-01-02", "S92", 6, 0);
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "S92".into(),
            max_pax: Some(4.0),
            ..Default::default()
        }];
        let r = reconcile_day(d("1/2/2025"), totals(2, 0), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert!(r.reasons.iter().all(|reason| !reason.starts_with("Planner PAX")));
    }

    #[test]
    fn zero_limits_are_unconstrained() {
        let m = manifest("2025-01-02", "S92", 6, 0);
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "S92".into(),
            max_pax: Some(0.0),
            max_outbound_weight: None,
            max_inbound_weight: Some(-1.0),
        }];
        let r = reconcile_day(d("1/2/2025"), totals(6, 0), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Reconciled);
    }

    #[test]
    fn manifest_without_planner_activity_is_unclassified() {
        let m = manifest("2025-01-02", "S92", 4, 3);
        assert!(reconcile_day(d("1/2/2025"), totals(0, 0), Some(&m), &[], &CargoFilter::default()).is_none());
    }

    #[test]
    fn capacity_error_still_reported_without_planner_activity() {
        let m = manifest("2025-01-02", "S92", 4, 3);
        let limits = vec![AircraftTypeLimits {
            aircraft_type: "S92".into(),
            max_pax: Some(6.0),
            ..Default::default()
        }];
        let r = reconcile_day(d("1/2/2025"), totals(0, 0), Some(&m), &limits, &CargoFilter::default()).unwrap();
        assert_eq!(r.class, ReconClass::Mismatch);
        assert_eq!(r.planner_count, 0);
    }

    #[test]
    fn first_manifest_for_a_date_wins() {
        let mut first = manifest("2025-01-02", "S92", 2, 0);
        first.id = "first".into();
        let mut second = manifest("2025-01-02", "S92", 9, 0);
        second.id = "second".into();
        let catalog = vec![first, second];
        let index = index_manifests(&catalog);
        assert_eq!(index["2025-01-02"].id, "first");
    }

    #[test]
    fn reconcile_skips_quiet_days() {
        let d1 = d("1/1/2025");
        let d2 = d("1/2/2025");
        let d3 = d("1/3/2025");
        let mut movements = DailyMovements::default();
        movements.push(crate::direction::Direction::Outbound, d2, crate::model::MovementToken::new(2, "Ops"));
        let catalog = vec![manifest("2025-01-02", "S92", 2, 0)];

        let results = reconcile(&[d1, d2, d3], &movements, &catalog, &[], &CargoFilter::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[&d2].class, ReconClass::Reconciled);
    }

    #[test]
    fn amounts_format_compactly() {
        assert_eq!(fmt_amount(4.0), "4");
        assert_eq!(fmt_amount(169.5), "169.5");
        assert_eq!(fmt_amount(0.1 + 0.2), "0.3");
    }
}
