#![deny(
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
//! `ffind` - Fuzzy file search and personal logging from the command line.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use clap_cargo::style::CLAP_STYLING;
use fuzzfind::error::{Error, Result};
use fuzzfind::tools::{Toolbox, host};
use fuzzfind::types::{DEFAULT_CUTOFF, DEFAULT_LIMIT};
use fuzzfind::{CancelToken, SearchConfig, ToolContext};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// CLI arguments for `ffind`
#[derive(Parser, Debug)]
#[command(author, version, about, styles = CLAP_STYLING)]
struct Cli {
    /// Directory holding journal, log and reminder files
    #[arg(long, global = true, default_value = "data", value_name = "DIR")]
    data_dir: PathBuf,

    /// Verbose output (show skipped directories and debug events)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Find files with names similar to the given one
    Find(FindArgs),
    /// Add a mood entry to the journal
    Journal {
        /// Year folder, e.g. 2025
        year:  String,
        /// Month folder and file prefix, e.g. May
        month: String,
        /// Entry date, e.g. 2025-05-04
        date:  String,
        /// Mood, e.g. Happy
        mood:  String,
        /// Journal text
        log:   String,
    },
    /// Summarize moods logged between two dates
    Mood {
        /// First day, YYYY-MM-DD
        from: String,
        /// Last day, YYYY-MM-DD
        to:   String,
    },
    /// Append a timestamped entry to a log file under <data-dir>/logs
    Log {
        /// Log file name, e.g. reflections_log.csv
        filename: String,
        /// Text to log
        log:      String,
    },
    /// Record a reminder and show a desktop notification
    Remind {
        /// Notification title
        title:   String,
        /// Notification body
        message: String,
    },
    /// Open a web search in the default browser
    Web {
        /// Search terms
        query: String,
    },
    /// Answer JSON tool calls, one per line, from stdin on stdout
    Serve,
}

/// Options for `find`
#[derive(Args, Debug)]
struct FindArgs {
    /// File name, or part of it, to look for
    filename: String,

    /// Directory to search (defaults to the filesystem root)
    root: Option<PathBuf>,

    /// Maximum number of matches
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT, value_name = "NUM")]
    limit: usize,

    /// Minimum similarity, 0.0 to 1.0
    #[arg(short, long, default_value_t = DEFAULT_CUTOFF, value_name = "SCORE")]
    cutoff: f64,

    /// Scorer threads (defaults to available cores, at most 8)
    #[arg(short, long, value_name = "NUM")]
    workers: Option<usize>,

    /// Do not descend below this depth
    #[arg(short = 'd', long, value_name = "NUM")]
    max_depth: Option<usize>,

    /// Skip files and directories whose name matches this glob (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Do not follow symlinked directories
    #[arg(long)]
    no_follow: bool,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print matches as a JSON array
    #[arg(long)]
    json: bool,

    /// Include similarity scores in the output
    #[arg(long)]
    scores: bool,
}

impl FindArgs {
    fn config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            limit: self.limit,
            cutoff: self.cutoff,
            workers: self.workers.unwrap_or(defaults.workers),
            max_depth: self.max_depth,
            follow_links: !self.no_follow,
            exclude: self.exclude.clone(),
            ..defaults
        }
    }

    fn cancel_token(&self) -> CancelToken {
        self.timeout.map_or_else(CancelToken::new, |secs| {
            CancelToken::with_timeout(Duration::from_secs(secs))
        })
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fuzzfind=debug,ffind=debug,warn")
    } else {
        EnvFilter::new("fuzzfind=info,ffind=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Search for files and print the matches
fn find(tools: Toolbox, args: &FindArgs) -> Result<()> {
    let cancel = args.cancel_token();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping search...");
        on_interrupt.cancel();
    }) {
        error!("Failed to set interrupt handler: {e}");
    }

    let tools = tools.with_cancel(cancel);
    let matches = tools.find_matches(&args.filename, args.root.as_deref())?;

    if args.json {
        let value = if args.scores {
            serde_json::Value::Array(
                matches
                    .iter()
                    .map(|m| {
                        serde_json::json!({
                            "path": m.path().to_string_lossy(),
                            "score": m.score,
                        })
                    })
                    .collect(),
            )
        } else {
            serde_json::json!(
                matches.iter().map(|m| m.path().to_string_lossy()).collect::<Vec<_>>()
            )
        };
        println!("{value}");
        return Ok(());
    }

    if matches.is_empty() {
        println!("No files similar to '{}' found", args.filename);
        println!("Tips:");
        println!("  - Lower --cutoff to accept looser matches");
        println!("  - Check that the search root is the directory you meant");
        return Ok(());
    }

    for m in &matches {
        if args.scores {
            println!("{:>5.1}% | {}", m.score * 100.0, m.path().display());
        } else {
            println!("{}", m.path().display());
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let search = match &cli.command {
        Command::Find(args) => args.config(),
        _ => SearchConfig::default(),
    };
    let tools = Toolbox::new(ToolContext { data_dir: cli.data_dir, search });

    match cli.command {
        Command::Find(args) => find(tools, &args),
        Command::Journal { year, month, date, mood, log } => {
            tools.add_log_to_journal(&year, &month, &date, &mood, &log)
        },
        Command::Mood { from, to } => {
            println!("{}", tools.analyze_mood_trend(&from, &to)?);
            Ok(())
        },
        Command::Log { filename, log } => tools.add_log_to_file(&filename, &log),
        Command::Remind { title, message } => tools.add_reminder(&title, &message),
        Command::Web { query } => {
            println!("{}", tools.search_web(&query));
            Ok(())
        },
        Command::Serve => host::serve(&tools, io::stdin().lock(), io::stdout().lock()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::Cancelled) => {
            eprintln!("{}", e.user_message());
            ExitCode::from(130)
        },
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        },
    }
}
