//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use protomerge_core::pipeline::{ProgressReporter, RunConfig, RunReport};
use protomerge_core::{DirectorySink, resolve};
use protomerge_feed::{FeedSource, FetchOptions};
use protomerge_shared::{AppConfig, FilterPolicy, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// protomerge: merge a protocol feed with curated entries, one record per domain.
#[derive(Parser)]
#[command(
    name = "protomerge",
    version,
    about = "Merge a protocol feed with curated entries and split it by category.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.protomerge/protomerge.toml.
    #[arg(long = "config", global = true, env = "PROTOMERGE_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, filter, merge, and write the output files.
    Run(RunArgs),

    /// Print the canonical origin (scheme + root domain) of each URL.
    Resolve {
        /// URLs to resolve.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `run`; each overrides the matching config value.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Feed endpoint.
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Read the feed from a saved JSON file instead of fetching it.
    #[arg(long, conflicts_with = "feed_url")]
    pub feed_file: Option<PathBuf>,

    /// Manual entries file.
    #[arg(short, long)]
    pub manual: Option<PathBuf>,

    /// Ignore manual entries entirely.
    #[arg(long, conflicts_with = "manual")]
    pub no_manual: bool,

    /// Output directory (cleared before writing).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Minimum TVL for feed records outside exempt categories.
    #[arg(long)]
    pub min_size: Option<f64>,

    /// Print the run report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "protomerge=info",
        1 => "protomerge=debug",
        _ => "protomerge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(cli.config_file.as_deref(), args).await,
        Command::Resolve { urls } => cmd_resolve(&urls),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config_file.as_deref()),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Fold `run` flags into the loaded config and build the runtime configuration.
fn build_run_config(mut config: AppConfig, args: &RunArgs) -> Result<(RunConfig, PathBuf)> {
    if let Some(url) = &args.feed_url {
        config.feed.url = url.clone();
    }
    if let Some(min_size) = args.min_size {
        config.filter.min_size = min_size;
    }
    config.validate()?;

    let feed = match &args.feed_file {
        Some(path) => FeedSource::File(path.clone()),
        None => FeedSource::Remote(config.feed_url()?),
    };

    let manual_entries = if args.no_manual {
        None
    } else {
        Some(
            args.manual
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.paths.manual_entries)),
        )
    };

    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.paths.output_dir));

    let run_config = RunConfig {
        feed,
        fetch: FetchOptions {
            timeout_secs: config.feed.timeout_secs,
        },
        manual_entries,
        policy: FilterPolicy::from(&config),
    };

    Ok((run_config, out_dir))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let (run_config, out_dir) = build_run_config(config, &args)?;

    info!(
        feed = %run_config.feed,
        out = %out_dir.display(),
        min_size = run_config.policy.min_size,
        "starting run"
    );

    let mut sink = DirectorySink::new(&out_dir);
    let reporter = CliProgress::new(!args.json);
    let report = protomerge_core::pipeline::run(&run_config, &mut sink, &reporter).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!();
    println!("  Protocol directory written!");
    println!("  Manual:     {}", stats.manual_records);
    println!("  Feed:       {}", stats.feed_records);
    println!("  Accepted:   {}", stats.accepted);
    println!("  Rejected:   {}", stats.rejected.total());
    println!("  Dropped:    {}", stats.dropped_unresolvable);
    println!("  Canonical:  {}", stats.canonical_records);
    println!("  Categories: {}", report.categories);
    println!("  Files:      {}", report.files.len());
    println!("  Path:       {}", out_dir.display());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_resolve(urls: &[String]) -> Result<()> {
    let mut failures = 0usize;
    for raw in urls {
        match resolve(raw) {
            Ok(resolved) => println!("{raw} -> {}", resolved.origin()),
            Err(e) => {
                failures += 1;
                println!("{raw} -> error: {e}");
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} of {} URL(s) could not be resolved", urls.len()));
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Clears the spinner when the run bails out early.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
