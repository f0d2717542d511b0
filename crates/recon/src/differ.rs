use crate::direction::{resolve, DirectionMap, DirectionMode};
use crate::error::ReconError;
use crate::model::{DailyMovements, DateKey, LedgerRow, MovementToken};

/// Infer movements from day-over-day headcount changes.
///
/// Every date in `dates` gets an entry in both lists; the first date has no
/// predecessor so its lists are always empty. Within a date, tokens follow
/// ledger row order.
pub fn diff_ledger(
    dates: &[DateKey],
    rows: &[LedgerRow],
    directions: &DirectionMap,
    default_mode: DirectionMode,
) -> Result<DailyMovements, ReconError> {
    validate_dates(dates)?;

    let mut movements = DailyMovements::default();
    for date in dates {
        movements.outbound.insert(*date, Vec::new());
        movements.inbound.insert(*date, Vec::new());
    }

    // Blank companies are skipped; each remaining row's mode is fixed for the run.
    let tracked: Vec<(&LedgerRow, &str, DirectionMode)> = rows
        .iter()
        .filter_map(|row| {
            let company = row.company.trim();
            (!company.is_empty()).then(|| (row, company, resolve(company, directions, default_mode)))
        })
        .collect();

    for pair in dates.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);

        for (row, company, mode) in &tracked {
            let prev_val = row.headcount(prev);
            let curr_val = row.headcount(curr);
            if prev_val == curr_val {
                continue;
            }

            let token = MovementToken::new(prev_val.abs_diff(curr_val), *company);
            movements.push(mode.bucket(curr_val > prev_val), *curr, token);
        }
    }

    Ok(movements)
}

/// The date sequence must be non-empty and strictly ascending by calendar date.
pub fn validate_dates(dates: &[DateKey]) -> Result<(), ReconError> {
    if dates.is_empty() {
        return Err(ReconError::InvalidInput("date sequence is empty".into()));
    }
    if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ReconError::InvalidInput(format!(
            "date sequence is not strictly ascending: {} then {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}
