use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result};
use lookahead::{FilterStrategy, Settings};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub mod query;
pub mod search;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Settings file to read instead of the default location
    #[arg(long, global = true, env = "LOOKAHEAD_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Per-run overrides of the loaded settings.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// JSON file with the candidates to search
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Quiet interval before searching, in milliseconds
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Shortest query that is searched
    #[arg(long, global = true)]
    min_query_length: Option<usize>,

    /// Maximum number of results to show
    #[arg(long, global = true)]
    max_results: Option<usize>,

    /// Ranking strategy: relevance, instant or alphabetical
    #[arg(long, global = true)]
    filter: Option<FilterStrategy>,
}

impl Overrides {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(catalog) = self.catalog {
            settings.catalog = Some(catalog);
        }
        if let Some(debounce_ms) = self.debounce_ms {
            settings.search.debounce_ms = debounce_ms;
        }
        if let Some(min_query_length) = self.min_query_length {
            settings.search.min_query_length = min_query_length;
        }
        if let Some(max_results) = self.max_results {
            settings.search.max_results = max_results;
        }
        if let Some(filter) = self.filter {
            settings.search.filter = filter;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive autocomplete in a small inline TUI (default)
    Search {
        /// Text to start with
        #[arg(value_name = "QUERY")]
        query: Option<String>,

        /// Keep TUI output visible after exit (default: erase)
        #[arg(long)]
        keep: bool,
    },

    /// Rank the catalog for a query once and print the results
    Query {
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    cli.overrides.apply(&mut settings);

    match cli.command.unwrap_or(Commands::Search {
        query: None,
        keep: false,
    }) {
        Commands::Search { query, keep } => search::run(&settings, query, keep).await,
        Commands::Query { text, json } => query::run(&settings, &text, json),
    }
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = || {
        EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy()
    };

    // Console output only in verbose mode; the TUI owns stdout
    let console_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .with_filter(env_filter())
    });

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("log file {} has no file name", path.display()))?;

            fs_err::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
