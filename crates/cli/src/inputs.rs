//! Reading ledgers, manifests and date sequences from disk.

use std::path::Path;

use pobtrack_recon::config::RangeConfig;
use pobtrack_recon::engine::{load_ledger_csv, load_ledger_json, load_manifests_json, parse_date_range};
use pobtrack_recon::model::ManifestEntry;
use pobtrack_recon::{DateKey, Ledger};

use crate::exit_codes::{recon_exit_code, EXIT_RECON_RUNTIME};
use crate::CliError;

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", path.display())))
}

fn engine_err(path: &Path, err: pobtrack_recon::ReconError) -> CliError {
    CliError::new(recon_exit_code(&err), format!("{}: {err}", path.display()))
}

/// Load a ledger, choosing the reader by extension (`.json`, otherwise CSV).
pub fn load_ledger(path: &Path) -> Result<Ledger, CliError> {
    let data = read(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed = if is_json { load_ledger_json(&data) } else { load_ledger_csv(&data) };
    let ledger = parsed.map_err(|e| engine_err(path, e))?;

    log::debug!("loaded {} ledger rows from {}", ledger.rows.len(), path.display());
    Ok(ledger)
}

pub fn load_manifests(path: &Path) -> Result<Vec<ManifestEntry>, CliError> {
    let data = read(path)?;
    let catalog = load_manifests_json(&data).map_err(|e| engine_err(path, e))?;
    log::debug!("loaded {} manifests from {}", catalog.len(), path.display());
    Ok(catalog)
}

pub fn load_dates(path: &Path) -> Result<Vec<DateKey>, CliError> {
    let data = read(path)?;
    parse_date_range(&data).map_err(|e| engine_err(path, e))
}

/// Every calendar day from `start` to `end` inclusive.
pub fn expand_range(range: &RangeConfig) -> Vec<DateKey> {
    let end = DateKey::new(range.end);
    let mut dates = Vec::new();
    let mut current = Some(DateKey::new(range.start));
    while let Some(date) = current {
        if date > end {
            break;
        }
        dates.push(date);
        current = date.next_day();
    }
    dates
}
