use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use radar_common::{Config, Llm};
use radar_scout::{default_fetchers, Aggregator, ScriptGenerator};
use radar_store::PgStore;

#[derive(Parser)]
#[command(name = "radar-scout", about = "AI news radar: aggregation and weekly scripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every source once and store new stories.
    Scrape {
        /// Run fetchers one after another instead of all at once.
        #[arg(long)]
        sequential: bool,
    },
    /// Generate this week's short-video script.
    WeeklyScript {
        /// Backend to use (openai, mistral, llama3, zephyr). Defaults to all.
        #[arg(long)]
        llm: Option<Llm>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("radar=info".parse()?))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    config.log_redacted();

    let store = Arc::new(PgStore::connect(&config.database_url).await?);

    match cli.command {
        Command::Scrape { sequential } => {
            let aggregator = Aggregator::new(default_fetchers(&config)?, store.clone(), store);
            let result = if sequential {
                aggregator.run_sequential().await
            } else {
                aggregator.run().await
            };
            println!("{result}");
        }
        Command::WeeklyScript { llm } => {
            let generator = ScriptGenerator::from_config(&config, store.clone(), store);
            let run = generator.generate(llm).await?;

            for script in &run.scripts {
                match (&script.script_text, &script.error) {
                    (Some(text), _) => println!("=== {} ===\n{text}\n", script.llm),
                    (None, Some(error)) => warn!(llm = %script.llm, error = error.as_str(), "Backend failed"),
                    (None, None) => {}
                }
            }
            if let Some(prompt) = run.fallback_prompt {
                info!("All backends failed; copy this prompt into another tool");
                println!("{prompt}");
            }
        }
    }

    Ok(())
}
