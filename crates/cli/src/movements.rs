//! `pob movements`: infer daily movement tokens from a ledger.

use std::io::Write;
use std::path::{Path, PathBuf};

use pobtrack_config::Settings;
use pobtrack_recon::aggregate::{day_totals, movement_counts};
use pobtrack_recon::config::DirectionConfig;
use pobtrack_recon::model::MovementToken;
use pobtrack_recon::{diff_ledger, Direction};

use crate::exit_codes::recon_exit_code;
use crate::inputs::{load_dates, load_ledger};
use crate::CliError;

/// Upper-case an `OB` / `IB` argument, rejecting anything else.
fn parse_mode_arg(raw: &str) -> Result<String, CliError> {
    let mode = raw.trim().to_ascii_uppercase();
    match mode.as_str() {
        "OB" | "IB" => Ok(mode),
        _ => Err(CliError::args(format!("invalid direction mode '{raw}'")).with_hint("use OB or IB")),
    }
}

/// Parse a `COMPANY=MODE` override. Splits at the last '=' so names may contain one.
fn parse_override(raw: &str) -> Result<(String, String), CliError> {
    let (company, mode) = raw
        .rsplit_once('=')
        .ok_or_else(|| CliError::args(format!("invalid --direction '{raw}'")).with_hint("expected COMPANY=OB or COMPANY=IB"))?;
    let company = company.trim();
    if company.is_empty() {
        return Err(CliError::args(format!("invalid --direction '{raw}': empty company")));
    }
    Ok((company.to_string(), parse_mode_arg(mode)?))
}

/// Command-line flags first, then user settings underneath.
fn direction_config(
    default_mode: Option<String>,
    overrides: &[String],
    settings: &Settings,
) -> Result<DirectionConfig, CliError> {
    let mut direction = DirectionConfig {
        default_mode: default_mode.as_deref().map(parse_mode_arg).transpose()?,
        ..DirectionConfig::default()
    };
    for raw in overrides {
        let (company, mode) = parse_override(raw)?;
        direction.companies.insert(company, mode);
    }
    direction.fill_from(&settings.default_mode, &settings.companies);
    Ok(direction)
}

fn join_tokens(tokens: &[MovementToken]) -> String {
    if tokens.is_empty() {
        return "-".to_string();
    }
    tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

pub fn cmd_movements(
    ledger_path: PathBuf,
    default_mode: Option<String>,
    overrides: Vec<String>,
    dates_path: Option<PathBuf>,
    json: bool,
    settings_path: &Path,
) -> Result<(), CliError> {
    let direction = direction_config(default_mode, &overrides, &Settings::load_from(settings_path))?;

    let ledger = load_ledger(&ledger_path)?;
    let dates = match dates_path {
        Some(ref path) => load_dates(path)?,
        None => ledger.date_keys(),
    };

    let movements = diff_ledger(&dates, &ledger.rows, &direction.direction_map(), direction.default_mode())
        .map_err(|e| CliError::new(recon_exit_code(&e), e.to_string()))?;

    if json {
        let out = serde_json::json!({
            "default_mode": direction.default_mode(),
            "outbound": movements.outbound,
            "inbound": movements.inbound,
            "counts": movement_counts(&movements),
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::io(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for date in &dates {
        let totals = day_totals(&movements, date);
        writeln!(
            handle,
            "{:<10}  OB {:>3}: {}  |  IB {:>3}: {}",
            date.to_string(),
            totals.outbound,
            join_tokens(movements.tokens(Direction::Outbound, date)),
            totals.inbound,
            join_tokens(movements.tokens(Direction::Inbound, date)),
        )
        .map_err(|e| CliError::io(e.to_string()))?;
    }

    Ok(())
}
