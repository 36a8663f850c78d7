use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use ragchat::config::{self, Config, ConfigBuilder, ConfigError, PageConfig, TextDirection};
use ragchat::{LoadOutcome, Outcome, QueryDispatcher, RagClientBuilder, logging};
use thiserror::Error;
use tracing::info;

/// ragchat - ask questions of a retrieval-augmented generation service
#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Ask questions of a retrieval-augmented generation service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Environment file to load instead of searching for `.env`
    #[arg(long, value_name = "PATH", global = true)]
    env_file: Option<PathBuf>,

    /// Base URL of the RAG service
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Application identifier on the RAG service
    #[arg(long, value_name = "ID", global = true)]
    app_id: Option<String>,

    /// Environment variable holding the API key
    #[arg(long, value_name = "VAR", global = true)]
    api_key_env: Option<String>,

    /// Directory holding native libraries required by the service bindings
    #[arg(long, value_name = "DIR", global = true)]
    lib_dir: Option<PathBuf>,

    /// Built-in page text and layout
    #[arg(long, value_enum, default_value_t = Preset::English, global = true)]
    preset: Preset,

    /// JSON file with page text; unlisted fields keep the English defaults
    #[arg(long, value_name = "PATH", global = true, conflicts_with = "preset")]
    page: Option<PathBuf>,
}

/// Built-in page variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    English,
    Arabic,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Launch interactive terminal UI
    Tui(TuiCommand),
    /// Ask a single question and print the answer
    Ask(AskCommand),
    /// Add documents to the service's knowledge base
    Load(LoadCommand),
}

/// Launch the interactive terminal UI
#[derive(Parser)]
struct TuiCommand {
    /// Source for the load-files button (repeatable)
    #[arg(long = "source", value_name = "SOURCE")]
    sources: Vec<String>,

    /// Page title
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// Lay the page out right-to-left
    #[arg(long)]
    rtl: bool,
}

/// Ask a single question
#[derive(Parser)]
struct AskCommand {
    /// The question to ask
    #[arg(value_name = "QUESTION")]
    question: String,
}

/// Add documents
#[derive(Parser)]
struct LoadCommand {
    /// File paths or http(s) URLs
    #[arg(value_name = "SOURCES", required = true)]
    sources: Vec<String>,
}

/// An error caused by user input rather than the system.
#[derive(Debug, Error)]
#[error("{0}")]
struct UsageError(String);

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Tui(cmd) => handle_tui(&cli, cmd),
        Commands::Ask(cmd) => handle_ask(&cli, cmd),
        Commands::Load(cmd) => handle_load(&cli, cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are configuration problems and blank questions. Everything else,
/// including service failures, is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.is::<ConfigError>() || cause.is::<UsageError>())
}

/// Picks the page metadata from `--page` or `--preset`.
fn resolve_page(cli: &Cli) -> Result<PageConfig> {
    if let Some(path) = &cli.page {
        return Ok(PageConfig::from_path(path)?);
    }
    Ok(match cli.preset {
        Preset::English => PageConfig::default(),
        Preset::Arabic => PageConfig::arabic(),
    })
}

/// Loads the environment file and builds the validated configuration.
///
/// Runs before any UI is drawn so a missing secret aborts startup.
fn load_config(cli: &Cli, page: PageConfig, sources: Vec<String>) -> Result<Config> {
    config::load_env_file(cli.env_file.as_deref())?;

    let mut builder = ConfigBuilder::new()
        .page(page)
        .sources(sources)
        .verbosity(cli.verbose);
    if let Some(var) = &cli.api_key_env {
        builder = builder.api_key_var(var);
    }
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(app_id) = &cli.app_id {
        builder = builder.app_id(app_id);
    }
    if let Some(dir) = &cli.lib_dir {
        builder = builder.lib_dir(dir);
    }

    Ok(builder.build()?)
}

/// Builds the RAG client once and wraps it in the dispatcher.
fn build_dispatcher(config: &Config) -> Result<QueryDispatcher> {
    let client = RagClientBuilder::new()
        .base_url(&config.service.base_url)
        .app_id(&config.service.app_id)
        .api_key(config.service.api_key.clone())
        .build()
        .context("Failed to create RAG client")?;

    Ok(QueryDispatcher::new(Arc::new(client), config.page.clone()))
}

fn handle_tui(cli: &Cli, cmd: &TuiCommand) -> Result<()> {
    let mut page = resolve_page(cli)?;
    if let Some(title) = &cmd.title {
        page = page.with_title(title);
    }
    if cmd.rtl {
        page = page.with_direction(TextDirection::Rtl);
    }

    let config = load_config(cli, page, cmd.sources.clone())?;
    let _guard = logging::init_file(config.verbosity, &logging::log_directory()?)?;
    info!(base_url = %config.service.base_url, app_id = %config.service.app_id, "starting");

    let dispatcher = build_dispatcher(&config)?;
    ragchat::tui::run(&dispatcher, &config.sources)
}

fn handle_ask(cli: &Cli, cmd: &AskCommand) -> Result<()> {
    let config = load_config(cli, resolve_page(cli)?, Vec::new())?;
    logging::init_stderr(config.verbosity)?;

    let dispatcher = build_dispatcher(&config)?;
    match dispatcher.submit(&cmd.question) {
        Outcome::Answered(answer) => {
            println!("{answer}");
            Ok(())
        }
        Outcome::Warning(message) => Err(UsageError(message).into()),
        Outcome::Failed(message) => anyhow::bail!(message),
    }
}

fn handle_load(cli: &Cli, cmd: &LoadCommand) -> Result<()> {
    let config = load_config(cli, resolve_page(cli)?, cmd.sources.clone())?;
    logging::init_stderr(config.verbosity)?;

    let dispatcher = build_dispatcher(&config)?;
    let (outcome, report) = dispatcher.load_files(&config.sources);

    for source in report.loaded() {
        println!("added: {source}");
    }
    for (source, message) in report.failed() {
        eprintln!("failed: {source}: {message}");
    }

    match outcome {
        LoadOutcome::Success(message) => {
            println!("{message}");
            Ok(())
        }
        LoadOutcome::Failed(message) => anyhow::bail!(message),
    }
}
