use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod dataset;
mod error;
mod export;
mod models;
mod prompt;
mod runner;
mod selfeval;

use crate::client::OpenAiReasoningClient;
use crate::config::RunConfig;
use crate::export::{RowLabels, SheetFormat};
use crate::runner::Runner;

/// Clinical vignette evaluation - query a model on multiple-choice cases and
/// export its answers for human grading
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output - log each API request
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send every vignette to the model and save the raw responses as JSON
    Run {
        /// Path to the TOML run file
        run_file: PathBuf,

        /// Override the dataset path from the run file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Override the results path from the run file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Turn a results JSON file into a grading spreadsheet
    Convert {
        /// Results JSON written by `run`, optionally with self-evaluation fields
        json_file: PathBuf,

        /// Spreadsheet path (default: <json stem>_output.xlsx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Spreadsheet format; inferred from the output extension when omitted
        #[arg(short, long)]
        format: Option<SheetFormat>,

        /// Value for the "Model" column
        #[arg(long, default_value = "Claude")]
        model_label: String,

        /// Value for the "Prompt Type" column
        #[arg(long, default_value = "initial")]
        prompt_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("vignette_eval={}", level).parse()?),
        )
        .init();

    match args.command {
        Command::Run {
            run_file,
            input,
            output,
        } => run(run_file, input, output).await,
        Command::Convert {
            json_file,
            output,
            format,
            model_label,
            prompt_type,
        } => {
            let labels = RowLabels {
                model: model_label,
                prompt_type,
            };
            export::convert_file(&json_file, output.as_deref(), format, &labels)?;
            Ok(())
        }
    }
}

async fn run(
    run_file: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = RunConfig::from_file(&run_file)?.with_paths(input, output);

    info!(path = %config.input_path.display(), "Loading vignettes");
    let vignettes = dataset::load_vignettes(&config.input_path)?;
    info!(count = vignettes.len(), "Loaded vignettes");

    let client = OpenAiReasoningClient::from_config(&config)?;
    let mut runner = Runner::new(client, config.inter_call_delay());
    let report = runner.run(&vignettes).await;

    runner::store_results(&report.results, &config.output_path)?;
    info!(
        attempted = report.attempted(),
        saved = report.results.len(),
        skipped = report.skipped.len(),
        "Batch complete"
    );
    for skipped in &report.skipped {
        info!(case_id = %skipped.case_id, reason = %skipped.reason, "Skipped");
    }

    Ok(())
}
