//! Location capacity: regulatory max plus flotel / field-boat contingency.

use std::collections::BTreeMap;

use crate::aggregate::{day_totals, movement_count};
use crate::model::{CapacityStatus, DailyMovements, DateKey, DayOverview, Ledger, LocationCapacity};

pub fn effective_capacity(capacity: &LocationCapacity) -> i64 {
    capacity
        .max
        .saturating_add(capacity.flotel.unwrap_or(0))
        .saturating_add(capacity.field_boat.unwrap_or(0))
}

/// Evaluate a POB total against a location's limits.
///
/// A limit of 0 is unconfigured and never trips.
pub fn evaluate(total: i64, capacity: &LocationCapacity) -> CapacityStatus {
    let effective = effective_capacity(capacity);
    CapacityStatus {
        over_max: capacity.max > 0 && total > capacity.max,
        over_effective: effective > 0 && total > effective,
        effective,
    }
}

/// Dashboard rows: POB total, movement counts and capacity per date.
pub fn daily_overview(
    dates: &[DateKey],
    ledger: &Ledger,
    movements: &DailyMovements,
    capacity: Option<&LocationCapacity>,
) -> BTreeMap<DateKey, DayOverview> {
    dates
        .iter()
        .map(|date| {
            let pob_total = ledger.pob_total(date);
            let overview = DayOverview {
                date: *date,
                pob_total,
                movement_count: movement_count(movements, date),
                totals: day_totals(movements, date),
                capacity: capacity.map(|c| evaluate(pob_total, c)),
            };
            (*date, overview)
        })
        .collect()
}
