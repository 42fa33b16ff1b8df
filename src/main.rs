// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use rpgmtl::app_config::{BackendConfig, BackendKind, BackendSettings, Config, LogLevel};
use rpgmtl::errors::AppError;
use rpgmtl::providers::MockBackend;
use rpgmtl::registry::BackendRegistry;
use rpgmtl::resource::{self, ActorsResource, ResourceHandler, TranslationUnit};
use rpgmtl::translation::{BatchOrchestrator, OrchestratorConfig, RunProgress, TranslationBackend};

/// CLI Wrapper for BackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliBackend> for BackendKind {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Ollama => BackendKind::Ollama,
            CliBackend::OpenAI => BackendKind::OpenAI,
            CliBackend::Anthropic => BackendKind::Anthropic,
            CliBackend::LMStudio => BackendKind::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the game data found in a directory
    Translate(TranslateArgs),

    /// Generate shell completions for rpgmtl
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Game data directory to scan for supported documents
    #[arg(value_name = "DATA_DIR")]
    data_dir: PathBuf,

    /// Output directory for translated documents
    #[arg(short, long, default_value = "translated")]
    output: PathBuf,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    provider: Option<CliBackend>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for hosted backends
    #[arg(long, env = "RPGMTL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source language code (e.g., 'ja', 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Units per administrative batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Run the whole pipeline with an identity backend, without remote calls
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// rpgmtl - machine translation for RPG Maker game data
#[derive(Parser, Debug)]
#[command(name = "rpgmtl")]
#[command(version)]
#[command(about = "AI-powered translation of RPG Maker game data")]
#[command(long_about = "rpgmtl extracts text from RPG Maker data files, translates it with an AI backend and writes merged copies.

EXAMPLES:
    rpgmtl translate game/www/data                      # Translate using default config
    rpgmtl translate -p openai -m gpt-4o game/data      # Use specific backend and model
    rpgmtl translate -s ja -t fr game/data              # Translate from Japanese to French
    rpgmtl translate --dry-run game/data                # Exercise the pipeline without remote calls
    rpgmtl completions bash > rpgmtl.bash               # Generate bash completions

SUPPORTED BACKENDS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Level is refined once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "rpgmtl", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

/// Load the config file, creating a default one when missing, then apply CLI overrides
fn load_config(options: &TranslateArgs) -> Result<Config> {
    let mut config = if options.config_path.exists() {
        Config::from_file(&options.config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path.display());
        let config = Config::default();
        config.save(&options.config_path)?;
        config
    };

    if let Some(provider) = &options.provider {
        let kind: BackendKind = provider.clone().into();
        if kind != config.backend.kind() {
            config.backend = BackendConfig::new(kind, BackendSettings::default());
        }
    }
    if let Some(model) = &options.model {
        config.backend.settings_mut().model = Some(model.clone());
    }
    if let Some(api_key) = &options.api_key {
        config.backend.settings_mut().api_key = Some(api_key.clone());
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(batch_size) = options.batch_size {
        config.run.batch_size = batch_size;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

/// A parsed document awaiting merge
struct LoadedDocument {
    relative_path: PathBuf,
    document: Value,
}

fn read_document(path: &Path) -> Result<Value, AppError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_document(path: &Path, document: &Value) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(document)?)?;
    Ok(())
}

/// Find every supported document under `data_dir` and extract its units
fn collect_documents(
    handler: &dyn ResourceHandler,
    data_dir: &Path,
) -> Result<(BTreeMap<String, LoadedDocument>, Vec<TranslationUnit>)> {
    let mut documents = BTreeMap::new();
    let mut units = Vec::new();

    for entry in WalkDir::new(data_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {}", data_dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !handler.matches_file(&path.to_string_lossy()) {
            continue;
        }

        let file = path.to_string_lossy().to_string();
        let document = read_document(path).with_context(|| format!("Failed to load {}", file))?;
        let extracted = handler.extract(&file, &document)?;
        info!("{}: {} translatable field(s)", file, extracted.len());

        let relative_path = path.strip_prefix(data_dir).unwrap_or(path).to_path_buf();
        units.extend(extracted);
        documents.insert(file, LoadedDocument { relative_path, document });
    }

    Ok((documents, units))
}

fn progress_bar(total_units: usize) -> ProgressBar {
    let progress_bar = ProgressBar::new(total_units as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    if options.dry_run {
        rpgmtl::language_utils::get_language_name(&config.source_language)?;
        rpgmtl::language_utils::get_language_name(&config.target_language)?;
    } else {
        config.validate().context("Configuration validation failed")?;
    }

    if !options.data_dir.is_dir() {
        return Err(anyhow!("Data directory does not exist: {}", options.data_dir.display()));
    }

    let handler = ActorsResource::new();
    let (documents, units) = collect_documents(&handler, &options.data_dir)?;
    if units.is_empty() {
        warn!("No translatable text found under {}", options.data_dir.display());
        return Ok(());
    }

    let backend: Arc<dyn TranslationBackend> = if options.dry_run {
        Arc::new(MockBackend::identity())
    } else {
        let registry = BackendRegistry::with_default_backends(config.cache.clone(), config.registry.ttl());
        registry.create_or_get(&config.backend)?
    };
    info!(
        "rpgmtl: {} - {} ({} -> {})",
        backend.metadata().name,
        config.backend.model(),
        config.source_language,
        config.target_language
    );

    let orchestrator = BatchOrchestrator::new(OrchestratorConfig::from(&config.run));
    let cancellation = orchestrator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current batch");
            cancellation.cancel();
        }
    });

    let progress = progress_bar(units.len());
    progress.set_message("Translating");
    let report = orchestrator
        .run_with_progress(
            backend.as_ref(),
            units,
            &config.source_language,
            &config.target_language,
            |update: &RunProgress| {
                progress.set_position(update.processed_units as u64);
                progress.set_message(format!("batch {}/{}", update.batch_index, update.total_batches));
            },
        )
        .await?;
    progress.finish_and_clear();

    for failure in &report.errors {
        warn!("{} ({} retries): {}", failure.unit, failure.retry_count, failure.message);
    }

    let mut written = 0;
    for (file, loaded) in &documents {
        let output_path = options.output.join(&loaded.relative_path);
        if output_path.exists() && !options.force_overwrite {
            error!("Output file already exists, use --force-overwrite: {}", output_path.display());
            continue;
        }
        let merged = resource::merge_file(&handler, file, &loaded.document, &report.units)?;
        write_document(&output_path, &merged).with_context(|| format!("Failed to write {}", output_path.display()))?;
        written += 1;
    }

    info!(
        "Run {}: {} translated, {} failed, {} tokens, ${:.4}, {} file(s) written to {}{}",
        report.run_id,
        report.stats.success_count,
        report.stats.failed_count,
        report.stats.total_tokens,
        report.stats.total_cost,
        written,
        options.output.display(),
        if report.cancelled { " (cancelled)" } else { "" }
    );

    Ok(())
}
