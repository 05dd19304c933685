//! Command-line client: run the pipeline once and print JSON to stdout.
//!
//! Ctrl-C during `summarize` stops in-flight papers and prints whatever finished.
use anyhow::{Context, Result};
use arxiv_sage::{
    config,
    logging::{self, ConsoleTarget},
    pipeline::{SummarizeRequest, SummaryPipeline},
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "arxiv-sage-cli",
    about = "Search arXiv and summarize papers from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a keyword and summarize every matching paper.
    Summarize {
        keyword: String,
        #[arg(long)]
        max_results: Option<i64>,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// List papers matching a keyword without summarizing.
    Search {
        keyword: String,
        #[arg(long)]
        max_results: Option<i64>,
    },
    /// Summarize a single paper by identifier.
    Paper {
        id: String,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Print the extracted text of a single paper.
    Text { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing(ConsoleTarget::Stderr);

    let config = config::get_config();
    let defaults = config.request_defaults();
    let pipeline = SummaryPipeline::from_config(config).context("failed to initialize pipeline")?;

    match cli.command {
        Command::Summarize {
            keyword,
            max_results,
            max_length,
        } => {
            let request = SummarizeRequest::new(
                &keyword,
                defaults.resolve_max_results(max_results),
                defaults.resolve_summary_length(max_length),
            )?;
            let token = CancellationToken::new();
            let interrupt = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    interrupt.cancel();
                }
            });
            let outcome = pipeline.summarize_batch(&request, &token).await?;
            print_json(&outcome)
        }
        Command::Search {
            keyword,
            max_results,
        } => {
            let papers = pipeline
                .search_documents(&keyword, defaults.resolve_max_results(max_results))
                .await?;
            print_json(&papers)
        }
        Command::Paper { id, max_length } => {
            let post = pipeline
                .fetch_and_summarize_one(&id, defaults.resolve_summary_length(max_length))
                .await?;
            print_json(&post)
        }
        Command::Text { id } => {
            let text = pipeline.fetch_and_extract(&id).await?;
            print_json(&text)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
