use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ratecard_tools::config::Settings;
use ratecard_tools::pipeline;
use ratecard_tools::{PipelineError, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    let settings = Settings::default();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Ingest(args) => {
            pipeline::ingest(&args.input, &args.output, &args.master, &settings)?;
            Ok(())
        }
        Command::Publish(args) => pipeline::publish(
            &args.master,
            &args.template,
            &args.output,
            &settings,
            today,
        ),
        Command::Run(args) => pipeline::run(
            &args.input,
            &args.output,
            &args.master,
            &args.template,
            &settings,
            today,
        ),
    }
}

fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| PipelineError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate advertising rate sheets and publish per-region price lists."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fold monthly rate drops into the master workbook.
    Ingest(IngestArgs),
    /// Emit per-region price-list reports from a consolidated master.
    Publish(PublishArgs),
    /// Ingest, then publish from the freshly saved master.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct IngestArgs {
    /// Directory holding the master workbook and the monthly rate drops.
    #[arg(long, default_value = "input")]
    input: PathBuf,

    /// Directory the updated master workbook is written under.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// File name of the master workbook inside the input directory.
    #[arg(long, default_value = "Rate Card Master.xlsx")]
    master: String,
}

#[derive(clap::Args)]
struct PublishArgs {
    /// Consolidated master workbook to publish from.
    #[arg(long)]
    master: PathBuf,

    /// Styled report template workbook.
    #[arg(long, default_value = "input/Price List Template.xlsx")]
    template: PathBuf,

    /// Directory the per-region reports are written under.
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory holding the master workbook, rate drops, and template.
    #[arg(long, default_value = "input")]
    input: PathBuf,

    /// Directory all artifacts are written under.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// File name of the master workbook inside the input directory.
    #[arg(long, default_value = "Rate Card Master.xlsx")]
    master: String,

    /// File name of the report template inside the input directory.
    #[arg(long, default_value = "Price List Template.xlsx")]
    template: String,
}
