//! # site2md CLI Application
//!
//! Command-line interface for crawling a documentation site into markdown.
//!
//! ## Subcommands
//!
//! - `crawl`: fetch a site into a temporary workspace and convert it
//! - `convert`: convert a directory of already downloaded HTML pages
//!
//! Configuration errors (bad URL, bad path pattern, bad selector) are reported
//! before anything is fetched and exit non-zero.

mod telemetry;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use site2md::config::{RunConfig, parse_path_pattern, parse_selector_list};
use site2md::crawler::{CrawlerConfig, HttpFetcher};
use site2md::pipeline::{Converter, Pipeline, RunReport, Workspace};
use site2md::processor::ConversionConfig;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Crawl a documentation website into local markdown files", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a website and convert its pages to markdown
    Crawl(CrawlArgs),

    /// Convert a directory of HTML pages to markdown
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ConversionArgs {
    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// CSS selector for the main content (first match is used)
    #[arg(short, long, default_value = "main")]
    selector: String,

    /// CSS selectors to remove (comma-separated)
    #[arg(short, long, default_value = "script,style,nav,footer,header,.ads")]
    ignore: String,

    /// Strip inline event handlers such as onclick
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    strip_inline_js: bool,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to start crawling from
    #[arg(required = true)]
    url: String,

    /// Delay between requests in milliseconds
    #[arg(short, long, default_value = "500")]
    delay: u64,

    /// Maximum link depth from the start page
    #[arg(long, default_value = "3")]
    max_depth: u32,

    /// Maximum number of pages to fetch
    #[arg(long, default_value = "500")]
    max_pages: u32,

    /// Only follow links on the start URL's host
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    restrict_domain: bool,

    /// Only follow links whose path matches this regex
    #[arg(short, long)]
    path_pattern: Option<String>,

    /// User agent to send
    #[arg(long)]
    user_agent: Option<String>,

    /// Create the temporary workspace inside this directory instead of the system temp dir
    #[arg(long)]
    workspace: Option<PathBuf>,

    #[command(flatten)]
    conversion: ConversionArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Directory of HTML pages to convert
    #[arg(required = true)]
    input: PathBuf,

    #[command(flatten)]
    conversion: ConversionArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    // Execute the appropriate command
    match cli.command {
        Some(Commands::Crawl(args)) => {
            crawl_command(args).await?;
        }
        Some(Commands::Convert(args)) => {
            convert_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["site2md", "--help"]);
        }
    }

    Ok(())
}

fn conversion_config(args: &ConversionArgs) -> ConversionConfig {
    ConversionConfig::builder()
        .selector(args.selector.trim())
        .ignore_selectors(parse_selector_list(&args.ignore))
        .strip_inline_event_handlers(args.strip_inline_js)
        .build()
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    Ok(progress_bar)
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let path_pattern = parse_path_pattern(args.path_pattern.as_deref())?;

    let mut builder = CrawlerConfig::builder()
        .max_depth(args.max_depth)
        .max_pages(args.max_pages)
        .delay_ms(args.delay)
        .restrict_to_base_domain(args.restrict_domain)
        .path_pattern(path_pattern);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    let crawler = builder.build();

    let config = RunConfig::new(
        &args.url,
        args.conversion.output.clone(),
        crawler,
        conversion_config(&args.conversion),
    )?;

    let workspace = match &args.workspace {
        Some(path) => Workspace::within(path)?,
        None => Workspace::temporary()?,
    };

    println!("Crawling {}...", config.target);
    let fetcher = HttpFetcher::new(&config.crawler.user_agent)?;
    let mut pipeline = Pipeline::new(config, fetcher).with_progress(progress_bar()?);
    let report = pipeline.run(workspace).await?;

    print_report(&report, &args.conversion)
}

#[instrument]
async fn convert_command(args: ConvertArgs) -> anyhow::Result<()> {
    let conversion = conversion_config(&args.conversion);
    conversion.validate()?;

    println!("Converting pages in {}...", args.input.display());
    let converter = Converter::new(conversion, args.conversion.output.clone())
        .with_progress(progress_bar()?);
    let report = converter.convert_workspace(&args.input).await?;

    print_report(&report, &args.conversion)
}

fn print_report(report: &RunReport, args: &ConversionArgs) -> anyhow::Result<()> {
    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        _ => {
            println!(
                "Converted {} of {} pages into {}",
                report.converted.len(),
                report.fetched,
                args.output.display()
            );
            if report.links_rejected > 0 {
                println!("Filtered out {} links", report.links_rejected);
            }
            for skipped in &report.skipped {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            for failed in &report.failed {
                println!("Failed {}: {}", failed.path.display(), failed.error);
            }
        }
    }
    Ok(())
}
