// pobtrack CLI - POB movement inference and manifest reconciliation

mod exit_codes;
mod inputs;
mod movements;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pobtrack_config::Settings;
use pobtrack_recon::capacity::evaluate;
use pobtrack_recon::model::LocationCapacity;

use exit_codes::{EXIT_ERROR, EXIT_SETTINGS_WRITE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "pob")]
#[command(about = "Infer personnel movements from a daily POB ledger and reconcile them against flight manifests")]
#[command(version)]
struct Cli {
    /// Log filter (error, warn, info, debug, trace or a full RUST_LOG directive)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// User settings file (defaults to the platform config dir)
    #[arg(long, global = true, env = "POBTRACK_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Config-driven inference + reconciliation runs
    #[command(subcommand)]
    Recon(recon::ReconCommands),

    /// Infer daily OB / IB movements from a ledger
    #[command(after_help = "\
Examples:
  pob movements ledger.csv
  pob movements ledger.json --default-mode IB
  pob movements ledger.csv --direction 'Catering Co=IB' --json
  pob movements ledger.csv --dates range.json")]
    Movements {
        /// Ledger file (.csv grid or .json array of rows)
        ledger: PathBuf,

        /// Mode for companies without an override (OB or IB)
        #[arg(long)]
        default_mode: Option<String>,

        /// Per-company override, COMPANY=OB|IB (repeatable)
        #[arg(long = "direction", value_name = "COMPANY=MODE")]
        directions: Vec<String>,

        /// Date sequence file: [{"date": "M/D/YYYY"}, ...] (defaults to the ledger's columns)
        #[arg(long)]
        dates: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Check a POB total against location capacity
    #[command(after_help = "\
Examples:
  pob capacity 35 --max 30 --flotel 4
  pob capacity 12 --max 20 --json")]
    Capacity {
        /// Persons on board
        total: i64,

        /// Regulatory maximum
        #[arg(long)]
        max: i64,

        /// Flotel contingency
        #[arg(long)]
        flotel: Option<i64>,

        /// Field-boat contingency
        #[arg(long)]
        field_boat: Option<i64>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// User settings file
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the settings file path
    Path,

    /// Write a commented default settings file (kept if one exists)
    Init,

    /// Print the effective settings
    Show {
        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let settings_path = cli.settings.unwrap_or_else(Settings::config_path);

    let result = match cli.command {
        Commands::Recon(cmd) => recon::cmd_recon(cmd, &settings_path),
        Commands::Movements { ledger, default_mode, directions, dates, json } => {
            movements::cmd_movements(ledger, default_mode, directions, dates, json, &settings_path)
        }
        Commands::Capacity { total, max, flotel, field_boat, json } => {
            cmd_capacity(total, LocationCapacity { max, flotel, field_boat }, json)
        }
        Commands::Settings(cmd) => cmd_settings(cmd, &settings_path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Route `log` records from the engine crates to stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// capacity
// ============================================================================

fn cmd_capacity(total: i64, capacity: LocationCapacity, json: bool) -> Result<(), CliError> {
    if capacity.max < 0 || capacity.flotel.is_some_and(|v| v < 0) || capacity.field_boat.is_some_and(|v| v < 0) {
        return Err(CliError::args("capacity values must not be negative"));
    }

    let status = evaluate(total, &capacity);

    if json {
        let out = serde_json::json!({
            "total": total,
            "max": capacity.max,
            "effective": status.effective,
            "over_max": status.over_max,
            "over_effective": status.over_effective,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::io(e.to_string()))?;
        println!("{text}");
    } else {
        let verdict = if status.over_effective {
            "OVER EFFECTIVE"
        } else if status.over_max {
            "OVER MAX"
        } else {
            "ok"
        };
        println!("POB {total} / max {} / effective {}: {verdict}", capacity.max, status.effective);
    }

    Ok(())
}

// ============================================================================
// settings
// ============================================================================

fn cmd_settings(cmd: SettingsCommands, path: &std::path::Path) -> Result<(), CliError> {
    match cmd {
        SettingsCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        SettingsCommands::Init => {
            let written = Settings::create_default_file(path)
                .map_err(|e| CliError::new(EXIT_SETTINGS_WRITE, format!("cannot write {}: {e}", path.display())))?;
            if written {
                eprintln!("wrote {}", path.display());
            } else {
                eprintln!("kept existing {}", path.display());
            }
            Ok(())
        }
        SettingsCommands::Show { json } => {
            let settings = Settings::load_from(path);
            if json {
                let text = serde_json::to_string_pretty(&settings).map_err(|e| CliError::io(e.to_string()))?;
                println!("{text}");
            } else {
                println!("file:          {}", path.display());
                println!("default mode:  {}", settings.default_mode);
                println!(
                    "location:      {}",
                    settings.default_location.as_deref().unwrap_or("(none)")
                );
                if settings.companies.is_empty() {
                    println!("companies:     (none)");
                } else {
                    println!("companies:");
                    for (company, mode) in &settings.companies {
                        println!("  {company} = {mode}");
                    }
                }
            }
            Ok(())
        }
    }
}
