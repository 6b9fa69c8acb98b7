use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info};

use trend_scraper::config::Config;
use trend_scraper::crawler::crawl_listing;
use trend_scraper::dedupe::ExistingFingerprintSet;
use trend_scraper::export::write_csv;
use trend_scraper::fetch::Fetcher;
use trend_scraper::llm::gemini::GeminiClient;
use trend_scraper::logging;
use trend_scraper::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "trend_scraper")]
#[command(about = "Regional trend/event crawl-and-extract pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML run configuration
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Traverse the configured listings and print discovered article URLs
    Crawl,
    /// Run the full crawl → extract → dedupe pipeline
    Run {
        /// CSV of already-known events used as an exclusion filter
        #[arg(long)]
        known_csv: Option<PathBuf>,
        /// Where to write the accepted records as CSV
        #[arg(long, default_value = "output/events.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Commands::Crawl => {
            println!("🔄 Crawling listings...");
            let fetcher = Fetcher::new();
            let mut visited = HashSet::new();
            let mut seen = HashSet::new();
            let mut articles = Vec::new();
            for target in &config.crawl_targets() {
                crawl_listing(
                    &fetcher,
                    target,
                    &config.crawl,
                    &mut visited,
                    &mut seen,
                    &mut articles,
                )
                .await;
                if articles.len() >= config.crawl.max_articles_total {
                    break;
                }
            }
            println!("📄 Discovered {} article URLs:", articles.len());
            for article in &articles {
                println!("   [{}] {}", article.source_label, article.url);
            }
        }
        Commands::Run { known_csv, output } => {
            println!("🚀 Running full pipeline...");

            let existing = match &known_csv {
                Some(path) => ExistingFingerprintSet::from_csv_path(path)?,
                None => ExistingFingerprintSet::empty(),
            };
            if !existing.is_empty() {
                println!("📚 Loaded {} known-event fingerprints", existing.len());
            }

            let fetcher = Fetcher::new();
            let extractor = GeminiClient::from_env(&config.llm.model, config.llm.temperature)?;
            let pipeline = Pipeline::new(&fetcher, &extractor, &config);

            match pipeline.run(existing).await {
                Ok(result) => {
                    println!("\n📊 Pipeline results:");
                    println!("   Accepted: {}", result.counters.accepted);
                    println!("   Known duplicates: {}", result.counters.known_duplicates);
                    println!("   In-run duplicates: {}", result.counters.run_duplicates);
                    println!("   Fetch failures: {}", result.counters.fetch_failures);
                    println!("   LLM errors: {}", result.counters.llm_errors);
                    if let Some(hint) = &result.outcome_hint {
                        println!("   ⚠️  No new records: {}", hint);
                    }

                    if let Some(parent) = output.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    write_csv(&result.records, &output)?;
                    info!(path = %output.display(), "records written");
                    println!("💾 Saved {} records to {}", result.records.len(), output.display());
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}
