use std::collections::BTreeMap;

use crate::direction::Direction;
use crate::model::{DailyMovements, DateKey, DayTotals, MovementToken};

/// Sum of token magnitudes (persons moved).
pub fn summed_magnitude(tokens: &[MovementToken]) -> u64 {
    tokens.iter().map(|t| t.magnitude).fold(0u64, u64::saturating_add)
}

/// Number of tokens on a date across both directions (calendar badge count).
pub fn movement_count(movements: &DailyMovements, date: &DateKey) -> usize {
    movements.tokens(Direction::Outbound, date).len() + movements.tokens(Direction::Inbound, date).len()
}

/// Persons moved on a date, split by direction.
pub fn day_totals(movements: &DailyMovements, date: &DateKey) -> DayTotals {
    DayTotals {
        outbound: summed_magnitude(movements.tokens(Direction::Outbound, date)),
        inbound: summed_magnitude(movements.tokens(Direction::Inbound, date)),
    }
}

/// Token counts for every date the movements cover.
pub fn movement_counts(movements: &DailyMovements) -> BTreeMap<DateKey, usize> {
    movements
        .dates()
        .into_iter()
        .map(|date| (date, movement_count(movements, &date)))
        .collect()
}
