//! `pob recon`: config-driven inference + manifest reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use pobtrack_config::Settings;
use pobtrack_recon::model::ReconResult;
use pobtrack_recon::{ReconClass, ReconConfig, ReconInput};

use crate::exit_codes::{
    recon_exit_code, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_MISMATCH, EXIT_RECON_MISSING, EXIT_RECON_RUNTIME,
};
use crate::inputs::{expand_range, load_ledger, load_manifests};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run inference and reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  pob recon run alpha.pob.toml
  pob recon run alpha.pob.toml --json
  pob recon run alpha.pob.toml --output result.json")]
    Run {
        /// Path to the .pob.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  pob recon validate alpha.pob.toml")]
    Validate {
        /// Path to the .pob.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands, settings_path: &Path) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output } => cmd_recon_run(config, json, output, settings_path),
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read config: {e}")))?;
    ReconConfig::from_toml(&config_str).map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

/// Merge user settings under the run config. Config entries win.
fn apply_settings(config: &mut ReconConfig, settings: &Settings) {
    config.direction.fill_from(&settings.default_mode, &settings.companies);

    if config.location.is_none() {
        if let Some(ref location) = settings.default_location {
            if config.locations.contains_key(location) {
                config.location = Some(location.clone());
            } else {
                log::warn!("settings location '{location}' is not defined in config '{}'", config.name);
            }
        }
    }
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    settings_path: &Path,
) -> Result<(), CliError> {
    let mut config = read_config(&config_path)?;
    apply_settings(&mut config, &Settings::load_from(settings_path));

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let ledger_file = config.inputs.ledger.as_deref().ok_or_else(|| {
        recon_err(EXIT_RECON_INVALID_CONFIG, "config has no ledger input")
            .with_hint("add `ledger = \"ledger.csv\"` under [inputs]")
    })?;
    let ledger = load_ledger(&base_dir.join(ledger_file))?;

    let manifests = match config.inputs.manifests.as_deref() {
        Some(file) => load_manifests(&base_dir.join(file))?,
        None => {
            log::info!("no manifest catalog configured; active days will be missing_manifest");
            Vec::new()
        }
    };

    let dates = match config.range {
        Some(ref range) => expand_range(range),
        None => ledger.date_keys(),
    };

    let input = ReconInput { ledger, dates, manifests };

    // Run engine
    let result = pobtrack_recon::run(&config, &input).map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    let output_file = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    print_summary(&result);

    let s = &result.summary;
    if s.mismatch > 0 {
        return Err(recon_err(EXIT_RECON_MISMATCH, "mismatches found"));
    }
    if s.missing_manifest > 0 {
        return Err(recon_err(EXIT_RECON_MISSING, "days with movements have no manifest"));
    }

    Ok(())
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} days, {} active: {} reconciled, {} mismatched, {} missing manifest",
        result.meta.config_name,
        s.total_days,
        s.days_with_activity,
        s.reconciled,
        s.mismatch,
        s.missing_manifest,
    );

    for r in result.results.values() {
        match r.class {
            ReconClass::Reconciled => {}
            ReconClass::MissingManifest => {
                eprintln!("  {:<10}  missing manifest (planner {})", r.date.to_string(), r.planner_count);
            }
            ReconClass::Mismatch => {
                eprintln!("  {:<10}  mismatch: {}", r.date.to_string(), r.reasons.join("; "));
            }
        }
    }

    if let Some(ref location) = result.meta.location {
        if s.days_over_max > 0 || s.days_over_effective > 0 {
            eprintln!(
                "capacity ({location}): {} day(s) over max, {} over effective",
                s.days_over_max, s.days_over_effective,
            );
        }
    }
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' with {} aircraft type(s), {} location(s), default mode {}",
        config.name,
        config.aircraft.len(),
        config.locations.len(),
        config.direction.default_mode(),
    );
    Ok(())
}
