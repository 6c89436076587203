// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, warn, info, debug, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use tokio::task::JoinError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use srt_translator::app_config::{self, Config};
use srt_translator::errors::AppError;
use srt_translator::file_utils::FileManager;
use srt_translator::language_utils;
use srt_translator::providers::HttpProvider;
use srt_translator::session::{FileId, SessionManager, TranslationOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitle files into one or more languages
    Translate(TranslateArgs),

    /// Generate shell completions for srt-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Subtitle files (.srt, .vtt) or directories containing them
    #[arg(value_name = "PATHS", required = true)]
    paths: Vec<PathBuf>,

    /// Target language, repeatable (defaults to the configured default language)
    #[arg(short, long = "language", value_name = "LANGUAGE")]
    languages: Vec<String>,

    /// Directory for translated files (defaults to each input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation endpoint URL
    #[arg(long, env = "SRT_TRANSLATOR_ENDPOINT")]
    endpoint: Option<String>,

    /// Cues per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// srt-translator - translate SRT and WebVTT subtitles cue by cue
#[derive(Parser, Debug)]
#[command(name = "srt-translator")]
#[command(version)]
#[command(about = "Translate SRT and WebVTT subtitle files through a translation service")]
#[command(long_about = "srt-translator sends every subtitle cue to a translation service and writes
the translated file next to the original as translated_<language>_<name>.

EXAMPLES:
    srt-translator translate movie.srt                       # Translate to the default language
    srt-translator translate -l French -l German movie.vtt   # Translate into two languages
    srt-translator translate -o out/ -f subs/                # Whole directory, overwrite outputs
    srt-translator completions bash > srt-translator.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
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
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
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
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srt-translator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

fn load_config(options: &TranslateArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(endpoint) = &options.endpoint {
        config.endpoint = endpoint.clone();
    }

    if let Some(batch_size) = options.batch_size {
        config.batch_size = batch_size;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .context("Configuration validation failed")?;

    let selectable = config.selectable_languages();
    for language in &options.languages {
        language_utils::validate_language_name(language)
            .with_context(|| format!("Invalid --language value '{}'", language))?;

        if !selectable.iter().any(|l| language_utils::language_names_match(l, language)) {
            warn!("{} is not one of the configured languages ({})", language.trim(), selectable.join(", "));
        }
    }

    Ok(config)
}

/// One (file, language) pair queued for translation
struct Job {
    file_id: FileId,
    language: String,
    output_path: PathBuf,
    progress_bar: ProgressBar,
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let provider = HttpProvider::new(&config.endpoint, config.request_timeout())?;
    let session = SessionManager::from_config(&config, Arc::new(provider));

    let input_files = FileManager::collect_subtitle_files(&options.paths)?;
    if input_files.is_empty() {
        return Err(anyhow!("No .srt or .vtt files found in the given paths"));
    }

    let mut output_dirs = Vec::with_capacity(input_files.len());
    for path in &input_files {
        let content = FileManager::read_to_string(path)?;
        let file_name = path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Invalid file name: {}", path.display()))?;

        let id = session.add_file(file_name, content)?;
        if !options.languages.is_empty() {
            session.set_languages(id, options.languages.clone())?;
        }

        let output_dir = options.output_dir.clone()
            .unwrap_or_else(|| path.parent().unwrap_or(Path::new(".")).to_path_buf());
        output_dirs.push((id, output_dir));
    }

    let multi_progress = MultiProgress::new();
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    let snapshot = session.snapshot();
    let mut jobs = Vec::new();
    for (id, output_dir) in &output_dirs {
        let Some(file) = snapshot.file(*id) else { continue };

        for language in &file.languages {
            let output_path = output_dir.join(file.output_file_name(language));
            if output_path.exists() && !options.force_overwrite {
                warn!("Skipping {}, translation already exists (use -f to force overwrite)", output_path.display());
                continue;
            }

            let progress_bar = multi_progress.add(ProgressBar::new(100));
            progress_bar.set_style(style.clone().progress_chars("#>-"));
            progress_bar.set_message(format!("{} -> {}", file.file_name, language));

            jobs.push(Job {
                file_id: *id,
                language: language.clone(),
                output_path,
                progress_bar,
            });
        }
    }

    if jobs.is_empty() {
        info!("Nothing to translate");
        return Ok(());
    }

    info!("Starting {} translation(s)", jobs.len());

    let handles: Vec<_> = jobs.iter()
        .map(|job| {
            let session = session.clone();
            let file_id = job.file_id;
            let language = job.language.clone();
            tokio::spawn(async move { session.start_translation(file_id, &language).await })
        })
        .collect();

    let runs = futures::future::join_all(handles);
    tokio::pin!(runs);
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    let results = loop {
        tokio::select! {
            results = &mut runs => break results,
            _ = ticker.tick() => refresh_progress(&session, &jobs),
        }
    };
    refresh_progress(&session, &jobs);

    let failed = write_results(&session, &jobs, results);
    if failed > 0 {
        return Err(anyhow!("{} of {} translation(s) failed", failed, jobs.len()));
    }

    Ok(())
}

/// Save every completed translation and report the rest; returns the number of failures.
/// A failure on one job never prevents the following jobs from being written.
fn write_results(
    session: &SessionManager,
    jobs: &[Job],
    results: Vec<Result<TranslationOutcome, JoinError>>,
) -> usize {
    let mut failed = 0;
    for (job, result) in jobs.iter().zip(results) {
        job.progress_bar.finish_and_clear();

        match result {
            Ok(TranslationOutcome::Completed) => match save_translation(session, job) {
                Ok(written) => info!("Success: {}", written.display()),
                Err(e) => {
                    error!("Failed to save {}: {}", job.output_path.display(), e);
                    failed += 1;
                }
            },
            Ok(TranslationOutcome::Failed(e)) => {
                error!("Failed: {} ({})", job.output_path.display(), e);
                failed += 1;
            }
            Ok(outcome) => {
                debug!("No result for {}: {:?}", job.output_path.display(), outcome);
            }
            Err(e) => {
                error!("Translation task panicked: {}", e);
                failed += 1;
            }
        }
    }
    failed
}

fn save_translation(session: &SessionManager, job: &Job) -> Result<PathBuf, AppError> {
    let download = session.download(job.file_id, &job.language)
        .ok_or_else(|| AppError::File(format!("Translated content missing for {}", job.output_path.display())))?;
    let output_dir = job.output_path.parent().unwrap_or(Path::new("."));
    FileManager::write_download(&download, output_dir)
        .map_err(|e| AppError::File(format!("{:#}", e)))
}

fn refresh_progress(session: &SessionManager, jobs: &[Job]) {
    let snapshot = session.snapshot();
    for job in jobs {
        if let Some(task) = snapshot.task(job.file_id, &job.language) {
            job.progress_bar.set_position(u64::from(task.progress));
        }
    }
}
