//! ttree CLI - Directory tree with LLM token counts.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use serde::Serialize;
use ttree::builder::Ttree;
use ttree::config::{Options, SortKey};
use ttree::cost::estimate_costs;
use ttree::errors::{exit_code, TtreeError};
use ttree::output::{write_report, OutputFormat, Report, TextOptions};
use ttree::tokens::DEFAULT_ENCODING;

#[derive(Parser)]
#[command(name = "ttree")]
#[command(about = "Show a directory tree annotated with LLM token counts")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Directory (or file) to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Maximum directory depth
    #[arg(short = 'd', long)]
    max_depth: Option<i64>,

    /// Additional ignore patterns (comma-separated)
    #[arg(short = 'i', long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Only show paths matching these patterns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,

    /// Token encoding or model name
    #[arg(short = 'e', long, default_value = DEFAULT_ENCODING)]
    encoding: String,

    /// Output as JSON
    #[arg(short = 'j', long)]
    json: bool,

    /// Show directories only
    #[arg(long)]
    no_files: bool,

    /// Sort children by
    #[arg(short = 's', long, value_enum, default_value_t = SortArg::Name)]
    sort: SortArg,

    /// Hide entries with fewer tokens than this
    #[arg(short = 't', long)]
    threshold: Option<i64>,

    /// Show API cost estimates
    #[arg(long)]
    cost: bool,

    /// Models to estimate costs for (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Expected output/input token ratio for cost estimates
    #[arg(long)]
    output_ratio: Option<f64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long)]
    quiet: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Size,
    Tokens,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Size => SortKey::Size,
            SortArg::Tokens => SortKey::Tokens,
        }
    }
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            max_depth: self.max_depth,
            ignore: self.ignore.clone(),
            include: self.include.clone(),
            encoding: Some(self.encoding.clone()),
            json: self.json,
            no_files: self.no_files,
            sort: Some(SortKey::from(self.sort).to_string()),
            threshold: self.threshold,
            cost: self.cost,
            models: self.models.clone(),
            output_ratio: self.output_ratio,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose);

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "ttree", &mut io::stdout());
        return;
    }

    let json_output = cli.json;

    if let Err(e) = run(&cli) {
        log::error!("{e}");
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
    log::trace!("logger initialized at {level:?}");
}

fn run(cli: &Cli) -> Result<(), TtreeError> {
    let config = cli.options().validate()?;

    let color = !cli.no_color && !config.json && io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }

    let result = Ttree::from_config(&cli.path, &config).build()?;
    log::info!(
        "{} tokens in {} files",
        result.stats.total_tokens,
        result.stats.total_files
    );

    let mut report = Report {
        tree: result.tree,
        stats: result.stats,
        costs: None,
    };
    if config.cost {
        let costs = estimate_costs(report.stats.total_tokens, &config.models, config.output_ratio);
        report = report.with_costs(costs);
    }

    let format = if config.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let options = TextOptions {
        color,
        output_ratio: config.output_ratio,
    };

    write_report(&mut io::stdout().lock(), &report, format, &options)?;
    Ok(())
}
