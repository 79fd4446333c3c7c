//! Command-line entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use byov::config::PipelineConfig;
use byov::dataset::{DatasetProvider, HttpProvider, LocalProvider, Table};
use byov::pipeline;
use byov::reconcile::CollectionIntent;
use byov::store::LanceStore;
use byov::Result;

/// Bring-your-own vector store and search: load a CSV numeric dataset into
/// LanceDB with self-generated vectors and query with nearest vector search.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Delete the collection, if it previously exists, before loading data.
    #[arg(long, conflicts_with = "append_collection")]
    delete_collection: bool,

    /// Append to the previously existing collection, if it already exists.
    #[arg(long)]
    append_collection: bool,

    /// Dataset name.
    #[arg(long, default_value = "atharvaingle/crop-recommendation-dataset")]
    dataset: String,

    /// Data filename within the dataset.
    #[arg(long, default_value = "Crop_recommendation.csv")]
    data_file: String,

    /// Column name for the label column.
    #[arg(long, default_value = "label")]
    label_column: String,

    /// Target collection name in the vector store.
    #[arg(long, default_value = "CropRecommendations")]
    collection: String,

    /// LanceDB database location.
    #[arg(long, default_value = "data/lancedb")]
    db_uri: String,

    /// Directory containing an already-downloaded copy of the dataset.
    #[arg(long, conflicts_with = "dataset_base_url")]
    data_dir: Option<PathBuf>,

    /// Base URL to fetch the data file from, as <base>/<dataset>/<data-file>.
    #[arg(long)]
    dataset_base_url: Option<String>,

    /// Directory used to cache downloaded data files.
    #[arg(long, default_value = "data/cache")]
    cache_dir: PathBuf,
}

impl Cli {
    fn intent(&self) -> CollectionIntent {
        if self.delete_collection {
            CollectionIntent::Delete
        } else if self.append_collection {
            CollectionIntent::Append
        } else {
            CollectionIntent::Neither
        }
    }

    fn provider(&self) -> Box<dyn DatasetProvider> {
        match (&self.data_dir, &self.dataset_base_url) {
            (Some(dir), _) => Box::new(LocalProvider::new(dir.clone())),
            (None, Some(url)) => Box::new(HttpProvider::new(url.clone(), self.cache_dir.clone())),
            (None, None) => Box::new(LocalProvider::new("data")),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "pipeline failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig {
        dataset: cli.dataset.clone(),
        data_file: cli.data_file.clone(),
        label_column: cli.label_column.clone(),
        collection: cli.collection.clone(),
        db_uri: cli.db_uri.clone(),
        intent: cli.intent(),
    };
    tracing::info!(
        dataset = %config.dataset,
        data_file = %config.data_file,
        label_column = %config.label_column,
        collection = %config.collection,
        db_uri = %config.db_uri,
        intent = ?config.intent,
        "starting byov pipeline"
    );

    let provider = cli.provider();
    let path = provider.fetch(&config.dataset, &config.data_file).await?;

    let table = Table::from_csv_path(&path)?;
    tracing::info!(
        rows = table.row_count(),
        columns = ?table.column_names(),
        "dataset loaded"
    );

    let store = LanceStore::connect(&config.db_uri).await?;
    pipeline::run(&config, &table, &store).await
}
