mod search;
mod sources;
mod translate;

use clap::{Parser, Subcommand};
use dealhub_core::SortField;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealhub-cli")]
#[command(about = "DealHub discount aggregator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every configured source and print the merged offers as JSON
    Search {
        /// Free-text product query
        query: String,

        /// Only keep offers from this brand (case-insensitive)
        #[arg(long)]
        brand: Option<String>,

        /// Only keep offers in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Inclusive ceiling on the sale price
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Inclusive minimum discount percentage
        #[arg(long)]
        min_discount: Option<u8>,

        /// price, discount, popularity, date or relevance
        #[arg(long, default_value_t = SortField::Discount)]
        sort: SortField,

        /// Maximum offers to print (1-200)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Translate texts through the configured provider chain
    Translate {
        /// Source language code
        #[arg(long)]
        from: String,

        /// Target language code
        #[arg(long)]
        to: String,

        /// Texts to translate
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Validate the sources file and list its entries
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = dealhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            query,
            brand,
            category,
            max_price,
            min_discount,
            sort,
            limit,
        } => {
            let request = dealhub_core::SearchRequest {
                query,
                filters: dealhub_core::SearchFilters {
                    brand,
                    category,
                    max_price,
                    min_discount,
                },
                sort,
                limit,
            };
            search::run_search(&config, &request).await?;
        }
        Commands::Translate { from, to, texts } => {
            translate::run_translate(&config, &from, &to, &texts).await?;
        }
        Commands::Sources => sources::run_sources(&config)?,
    }

    Ok(())
}
