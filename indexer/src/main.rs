use anyhow::Result;
use clap::{Parser, Subcommand};
use finder_core::persist::{save_snapshot, IndexPaths};
use finder_core::{BuildConfig, FieldWeights, IdfSmoothing, IndexBuilder};
use finder_core::tokenizer::TokenizerPolicy;
use indexer::load_records;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the faculty TF-IDF index snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSON/JSONL file, a directory of them, or an http(s) URL
    Build {
        /// Input file, directory or URL
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Drop English stopwords before weighting
        #[arg(long, default_value_t = false)]
        stopwords: bool,
        /// Apply Snowball English stemming
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Repetitions of the PhD field in each document
        #[arg(long, default_value_t = 0)]
        phd_field_weight: usize,
        /// Timeout for fetching a URL input, in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, smoothed_idf, stopwords, stem, phd_field_weight, timeout_secs } => {
            let config = BuildConfig {
                weights: FieldWeights { phd_field: phd_field_weight, ..FieldWeights::default() },
                smoothing: if smoothed_idf { IdfSmoothing::Smoothed } else { IdfSmoothing::Plain },
                tokenizer: TokenizerPolicy { remove_stopwords: stopwords, stem },
            };
            build_index(&input, &output, config, Duration::from_secs(timeout_secs))
        }
    }
}

fn build_index(input: &str, output: &str, config: BuildConfig, timeout: Duration) -> Result<()> {
    // Nothing is written until every record has been fetched and decoded.
    let records = load_records(input, timeout)?;
    if records.is_empty() {
        tracing::warn!(input, "source contained no faculty records");
    }
    tracing::info!(num_records = records.len(), input, "loaded faculty records");

    let index = IndexBuilder::new(config).build(records);
    save_snapshot(&IndexPaths::new(output), &index)?;

    tracing::info!(output, "index build complete");
    Ok(())
}
