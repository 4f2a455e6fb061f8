// routerecon CLI - headless extraction, comparison and payload resolution

mod compare;
mod exit_codes;
mod output;
mod resolve;
mod rules;
mod templates;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use routerecon_config::{ConfigError, Settings};
use routerecon_engine::cell_id::CellRef;
use routerecon_engine::RuleDefinitionError;
use routerecon_io::{IoError, MetadataLayout};
use routerecon_payload::TemplateError;
use routerecon_recon::ReconError;

use exit_codes::{
    io_exit_code, recon_exit_code, EXIT_ERROR, EXIT_INVALID_RULES, EXIT_INVALID_TEMPLATE, EXIT_IO, EXIT_SUCCESS,
    EXIT_USAGE, EXIT_WARNINGS,
};

#[derive(Parser)]
#[command(name = "routerecon")]
#[command(about = "Extract routing entities from workbooks, compare them with reference data, build update payloads")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: <config dir>/routerecon/settings.toml)
    #[arg(long, global = true, value_name = "FILE", env = "ROUTERECON_CONFIG")]
    config: Option<PathBuf>,

    /// Exit 20 when the run recorded warnings, collisions or resolution errors
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities from a workbook with a rule set
    #[command(after_help = "\
Examples:
  routerecon extract routing.xlsx --rules routing.rules.json
  routerecon extract routing.xlsx --rules routing.rules.json --json
  routerecon extract queues.csv --rules routing.rules.json --output extracted.json")]
    Extract {
        /// Workbook (.xlsx, .xlsm, .xls, .ods, .csv)
        workbook: PathBuf,

        /// Rule set JSON (path, or name inside the configured rules directory)
        #[arg(long)]
        rules: PathBuf,

        /// Print the extraction as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the extraction JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Extract, then reconcile against reference data
    #[command(after_help = "\
Examples:
  routerecon compare routing.xlsx --rules routing.rules.json --recon routing.recon.toml
  routerecon compare routing.xlsx --rules routing.rules.json --recon routing.recon.toml --json
  routerecon compare routing.xlsx --rules routing.rules.json --recon routing.recon.toml --xlsx report.xlsx")]
    Compare {
        /// Workbook (.xlsx, .xlsm, .xls, .ods, .csv)
        workbook: PathBuf,

        /// Rule set JSON (path, or name inside the configured rules directory)
        #[arg(long)]
        rules: PathBuf,

        /// Recon config TOML; reference paths are relative to it
        #[arg(long)]
        recon: PathBuf,

        /// Print the comparison as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the comparison JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the comparison report workbook
        #[arg(long, value_name = "REPORT")]
        xlsx: Option<PathBuf>,
    },

    /// Resolve a payload template against rows
    #[command(after_help = "\
Examples:
  routerecon resolve --template vq.json --rows rows.json --entity-class VQ
  routerecon resolve --template vq.json --rows rows.json --entity-class VQ --seed-vq 4100
  routerecon resolve --template ag.json --rows rows.json --entity-class AgentGroup --metadata report.xlsx
  routerecon resolve --template vq.json --rows rows.json --select VQ_Sales,VQ_Billing -o payloads.json")]
    Resolve {
        /// Template JSON (path, or name inside the configured template directory)
        #[arg(long)]
        template: PathBuf,

        /// Rows: a JSON array of objects; the first key of each is its identifier
        #[arg(long)]
        rows: PathBuf,

        /// Entity class whose ID partition {func.next_id} draws from
        #[arg(long)]
        entity_class: Option<String>,

        /// Highest VQ ID already in use
        #[arg(long, value_name = "N")]
        seed_vq: Option<u64>,

        /// Highest non-VQ ID already in use
        #[arg(long, value_name = "N")]
        seed_other: Option<u64>,

        /// Workbook whose Metadata sheet holds the ID seeds
        #[arg(long, value_name = "WORKBOOK")]
        metadata: Option<PathBuf>,

        /// Only these identifiers, in this order. Repeatable; comma-separated accepted
        #[arg(long, value_name = "IDS")]
        select: Vec<String>,

        /// Write payloads to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Rule set tools
    #[command(subcommand)]
    Rules(rules::RulesCommands),

    /// Manage the named template store
    #[command(subcommand)]
    Templates(templates::TemplateCommands),
}

/// What every command gets besides its own arguments.
pub(crate) struct Ctx {
    pub settings: Settings,
    pub strict: bool,
}

impl Ctx {
    pub fn metadata_layout(&self) -> Result<MetadataLayout, CliError> {
        let m = &self.settings.metadata;
        let cell = |value: &str| {
            value
                .parse::<CellRef>()
                .map_err(|e| CliError::config_value(format!("metadata cell: {e}")))
        };
        Ok(MetadataLayout { sheet: m.sheet.clone(), vq_cell: cell(&m.vq_cell)?, other_cell: cell(&m.other_cell)? })
    }

    /// Fail the run under `--strict` when anything was recorded.
    pub fn check_strict(&self, recorded: usize, what: &str) -> Result<(), CliError> {
        if self.strict && recorded > 0 {
            return Err(CliError { code: EXIT_WARNINGS, message: format!("{recorded} {what} recorded"), hint: None }
                .with_hint("re-run without --strict to accept them"));
        }
        Ok(())
    }
}

/// `path` as given when it exists, otherwise the same name inside `dir`
/// when that exists.
pub(crate) fn locate(path: &Path, dir: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    let named = dir.join(path);
    if named.exists() {
        log::debug!("using {}", named.display());
        return named;
    }
    path.to_path_buf()
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  routerecon-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  routerecon-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured.parse().unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = settings.map_err(CliError::config).and_then(|settings| {
        init_logging(cli.verbose, &settings.log.level);
        let ctx = Ctx { settings, strict: cli.strict };

        match cli.command {
            Commands::Extract { workbook, rules, json, output } => {
                compare::cmd_extract(&ctx, &workbook, &rules, json, output.as_deref())
            }
            Commands::Compare { workbook, rules, recon, json, output, xlsx } => compare::cmd_compare(
                &ctx,
                compare::CompareArgs {
                    workbook,
                    rules,
                    recon,
                    json,
                    output,
                    xlsx,
                },
            ),
            Commands::Resolve { template, rows, entity_class, seed_vq, seed_other, metadata, select, output } => {
                resolve::cmd_resolve(
                    &ctx,
                    resolve::ResolveArgs {
                        template,
                        rows,
                        entity_class,
                        seed_vq,
                        seed_other,
                        metadata,
                        select,
                        output,
                    },
                )
            }
            Commands::Rules(cmd) => rules::cmd_rules(&ctx, cmd),
            Commands::Templates(cmd) => templates::cmd_templates(&ctx, cmd),
        }
    });

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

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(err: IoError) -> Self {
        Self { code: io_exit_code(&err), message: err.to_string(), hint: None }
    }

    /// Read/write failure outside the io crate (stdout, plain text files).
    pub fn file(path: &Path, err: std::io::Error) -> Self {
        Self { code: EXIT_IO, message: format!("{}: {}", path.display(), err), hint: None }
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn rules(err: RuleDefinitionError) -> Self {
        Self { code: EXIT_INVALID_RULES, message: rules::describe(&err), hint: None }
    }

    pub fn template(err: TemplateError) -> Self {
        Self { code: EXIT_INVALID_TEMPLATE, message: err.to_string(), hint: None }
    }

    pub fn recon(err: ReconError) -> Self {
        Self { code: recon_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        Self::config_value(err.to_string())
    }

    fn config_value(msg: String) -> Self {
        Self {
            code: EXIT_ERROR,
            message: msg,
            hint: Some(format!("check {} or pass --config", Settings::config_path().display())),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
