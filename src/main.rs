use clap::{Parser, Subcommand};
use flow_scraper::config::Config;
use flow_scraper::fetch::PageFetcher;
use flow_scraper::logging;
use flow_scraper::ocr::TesseractOcr;
use flow_scraper::pipeline::Pipeline;
use flow_scraper::server;
use flow_scraper::store::{FlowStore, SqliteStore};
use flow_scraper::tasks;
use flow_scraper::types::CycleOutcome;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "flow_scraper")]
#[command(about = "Boden hydro plant water flow tracker")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the read API and poll the source on a fixed schedule
    Run,
    /// Execute exactly one poll cycle and exit
    Poll,
    /// Serve the read API without polling
    Serve,
}

fn build_pipeline(config: &Config, store: Arc<dyn FlowStore>) -> anyhow::Result<Pipeline> {
    let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
    let fetcher = PageFetcher::new(&config.source_url, fetch_timeout)?;
    let ocr = TesseractOcr::new(&config.source_url, &config.ocr_language, fetch_timeout)?;
    Ok(Pipeline::new(Arc::new(fetcher), Arc::new(ocr), store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    let store: Arc<dyn FlowStore> = Arc::new(SqliteStore::open(&config.db_path)?);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let pipeline = Arc::new(build_pipeline(&config, store.clone())?);
            let poll_interval = Duration::from_secs(config.poll_interval_secs);
            let cycle_timeout = Duration::from_secs(config.cycle_timeout_secs);

            tokio::spawn(async move {
                tasks::run_poll_loop(pipeline, poll_interval, cycle_timeout).await;
            });

            info!("water flow tracker started");
            server::start_server(store, config.port).await?;
        }
        Commands::Poll => {
            let pipeline = build_pipeline(&config, store)?;
            match pipeline.run_cycle().await? {
                CycleOutcome::Inserted(reading) => {
                    println!("New data saved: {}", reading.last_update);
                }
                CycleOutcome::Duplicate(reading) => {
                    println!("Data already exists for: {}", reading.last_update);
                }
            }
        }
        Commands::Serve => {
            server::start_server(store, config.port).await?;
        }
    }

    Ok(())
}
