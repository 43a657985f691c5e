use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tabcalc_application::{CalculatorContext, ContextOptions};
use tabcalc_core::config::CalcConfig;
use tabcalc_core::storage::KeyValueStorage;
use tabcalc_infrastructure::{ConfigService, JsonFileStorage, MemoryStorage, TabcalcPaths};
use tracing_subscriber::EnvFilter;

mod commands;
mod helper;
mod repl;

#[derive(Parser)]
#[command(name = "tabcalc")]
#[command(about = "TabCalc - tabbed calculator with persistent sessions", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/tabcalc/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data file holding the sessions
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `tabcalc_core=debug` (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Keep everything in memory; nothing is read or written
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive calculator (default)
    Repl,
    /// Evaluate an expression in the active tab and record it
    Eval {
        /// Expression; several words are joined with spaces
        #[arg(required = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },
    /// List tabs
    Tabs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_default_location()?,
    };
    let config = config_service
        .get_config()
        .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

    init_logging(cli.log_level.as_deref(), &config);

    let storage = open_storage(&cli, &config)?;
    let options = ContextOptions {
        label_hint: config.tabs.label_hint.clone(),
    };
    let mut context = CalculatorContext::bootstrap(storage, options)?;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl::run(&mut context).await?,
        Commands::Eval { expression } => {
            let result = context.submit(&expression.join(" "));
            repl::print_result(&result);
        }
        Commands::Tabs => repl::print_tabs(&context),
    }

    context
        .persist_now()
        .context("Failed to save sessions")?;
    Ok(())
}

/// Installs the stderr subscriber: `RUST_LOG`, else `--log-level`, else config.
fn init_logging(flag: Option<&str>, config: &CalcConfig) {
    let fallback = flag.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_storage(cli: &Cli, config: &CalcConfig) -> Result<Arc<dyn KeyValueStorage>> {
    if cli.ephemeral {
        tracing::info!("[Bootstrap] Ephemeral run, using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let path = match cli.data_file.clone().or_else(|| config.storage.data_file.clone()) {
        Some(path) => path,
        None => TabcalcPaths::data_file()?,
    };
    tracing::debug!("[Bootstrap] Data file: {}", path.display());

    let storage = JsonFileStorage::open(&path)
        .with_context(|| format!("Failed to open data file {}", path.display()))?;
    Ok(Arc::new(storage))
}
