use clap::{Parser, Subcommand};
use crawl_topology::error::AnalyticsError;
use crawl_topology::{ops, AnalyticsConfig, ReportView};
use serde_json::Value;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "crawl-topology",
    version,
    about = "Duplicate clusters, content overlap, keyword search, and grading for crawl reports"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long, exclusive = true)]
    mcp: bool,

    /// Crawl report JSON file (reads stdin when omitted)
    #[arg(short, long, global = true)]
    report: Option<PathBuf>,

    /// JSON file with engine settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Group pages flagged as exact duplicates
    Duplicates,
    /// List near-duplicate page pairs, strongest first
    Similar {
        /// Minimum similarity percentage (default from config: 40)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Merge similar pairs into connected clusters
    Clusters {
        /// Minimum similarity percentage (default from config: 40)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Shared words and phrases of two pages
    Overlap {
        url_a: String,
        url_b: String,
    },
    /// Mark the content a page shares with another page
    Highlight {
        url: String,
        other: String,
        /// Number of shared phrases to mark
        #[arg(long)]
        phrases: Option<usize>,
        /// Number of shared words to mark
        #[arg(long)]
        words: Option<usize>,
    },
    /// Count a keyword or phrase across all pages
    Search {
        #[arg(num_args = 0..)]
        term: Vec<String>,
    },
    /// Site performance score, grade, and issue status
    Score,
    /// Link-structure recommendations
    Advise {
        /// Only this URL (default: every URL in the link analysis)
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Rank keywords site-wide or for one page
    Keywords {
        /// Number of keywords to return
        #[arg(short = 'n', long)]
        top: Option<usize>,
        /// Only this page's keywords
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Everything at a glance
    Summary,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("failed to create tokio runtime: {e}");
            std::process::exit(1);
        });
        rt.block_on(async {
            if let Err(e) = crawl_topology::mcp::serve_stdio().await {
                eprintln!("MCP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let Some(command) = cli.command else {
        eprintln!("No subcommand provided. Run `crawl-topology --help` for usage.");
        std::process::exit(1);
    };

    match run(command, cli.report.as_ref(), cli.config.as_ref()) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(e.into()),
        },
        Err(e) => fail(e),
    }
}

fn fail(e: AnalyticsError) -> ! {
    tracing::error!(error = %e, "command failed");
    eprintln!("{e}");
    std::process::exit(1);
}

fn read_report(path: Option<&PathBuf>) -> Result<Value, AnalyticsError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.display().to_string(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| AnalyticsError::Io {
                    path: "<stdin>".into(),
                    source,
                })?;
            buf
        }
    };
    ops::parse_report(&text)
}

fn run(
    command: Commands,
    report: Option<&PathBuf>,
    config: Option<&PathBuf>,
) -> Result<Value, AnalyticsError> {
    let config = match config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    let mut view: ReportView = ops::open(&read_report(report)?, config);

    match command {
        Commands::Duplicates => Ok(ops::op_duplicates(&mut view)),
        Commands::Similar { threshold } => ops::op_similar(&mut view, threshold),
        Commands::Clusters { threshold } => ops::op_clusters(&mut view, threshold),
        Commands::Overlap { url_a, url_b } => ops::op_overlap(&mut view, &url_a, &url_b),
        Commands::Highlight {
            url,
            other,
            phrases,
            words,
        } => ops::op_highlight(&mut view, &url, &other, phrases, words),
        Commands::Search { term } => Ok(ops::op_search(&mut view, &term.join(" "))),
        Commands::Score => Ok(ops::op_score(&view)),
        Commands::Advise { url } => Ok(ops::op_advise(&view, url.as_deref())),
        Commands::Keywords { top, url } => ops::op_keywords(&view, top, url.as_deref()),
        Commands::Summary => Ok(ops::op_summary(&mut view)),
    }
}
