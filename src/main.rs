//! CLI interface for S3 Vectors indexes

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use neighbor_s3::{
    BatchOptions, ClientConfig, Config, DistanceMetric, Filter, HttpClient, IdType, Index,
    IndexConfig, Item, ItemId, Metadata, SearchOptions, SearchResult, Vector,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neighbor-s3")]
#[command(about = "Manage and search S3 Vectors indexes", long_about = None)]
struct Cli {
    /// TOML config file with [client] and [index] tables
    #[arg(long, env = "NEIGHBOR_S3_CONFIG")]
    config: Option<PathBuf>,

    /// Service endpoint URL (overrides region)
    #[arg(long, env = "S3VECTORS_ENDPOINT")]
    endpoint: Option<String>,

    /// AWS region used to derive the endpoint
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Sign requests with SigV4 using the AWS credential chain
    #[arg(long)]
    sign: bool,

    /// Vector bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// Index name
    #[arg(long)]
    index: Option<String>,

    /// Vector dimensions
    #[arg(long)]
    dimensions: Option<usize>,

    /// Distance metric
    #[arg(long, value_enum)]
    distance: Option<DistanceArg>,

    /// Id type
    #[arg(long, value_enum)]
    id_type: Option<IdTypeArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum DistanceArg {
    Euclidean,
    Cosine,
}

impl From<DistanceArg> for DistanceMetric {
    fn from(arg: DistanceArg) -> Self {
        match arg {
            DistanceArg::Euclidean => DistanceMetric::Euclidean,
            DistanceArg::Cosine => DistanceMetric::Cosine,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum IdTypeArg {
    String,
    Integer,
}

impl From<IdTypeArg> for IdType {
    fn from(arg: IdTypeArg) -> Self {
        match arg {
            IdTypeArg::String => IdType::String,
            IdTypeArg::Integer => IdType::Integer,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index
    Create {
        /// Metadata keys to exclude from filtering
        #[arg(long = "non-filterable")]
        non_filterable: Vec<String>,
    },
    /// Delete the index
    Drop,
    /// Check whether the index exists
    Exists,
    /// Show the index description
    Info,
    /// Add or replace a vector
    Add {
        /// Item ID
        id: String,
        /// Vector data as comma-separated values (e.g., "1.0,2.0,3.0")
        #[arg(short, long)]
        vector: String,
        /// Metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Remove vectors
    Remove {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Fetch a vector
    Find {
        /// Item ID
        id: String,
        /// Skip metadata
        #[arg(long)]
        no_metadata: bool,
    },
    /// List all vectors
    List {
        /// Page size (1 to 1000)
        #[arg(long, default_value = "1000")]
        batch_size: u32,
    },
    /// Search for similar vectors
    Search {
        /// Query vector as comma-separated values (e.g., "1.0,2.0,3.0")
        query: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search for vectors similar to an existing item
    SearchId {
        /// Item ID
        id: String,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Number of results to return
    #[arg(short, long, default_value = "5")]
    k: usize,
    /// Metadata filter as a JSON document
    #[arg(short, long)]
    filter: Option<String>,
    /// Include metadata in results
    #[arg(long)]
    with_metadata: bool,
}

impl SearchArgs {
    fn options(&self) -> Result<SearchOptions> {
        let mut options = SearchOptions::default()
            .with_count(self.k)
            .with_metadata(self.with_metadata);
        if let Some(filter) = &self.filter {
            let value: serde_json::Value =
                serde_json::from_str(filter).context("filter must be a JSON document")?;
            options = options.with_filter(Filter::from(value));
        }
        Ok(options)
    }
}

fn index_config(cli: &Cli, file: Option<IndexConfig>) -> Result<IndexConfig> {
    let name = cli
        .index
        .clone()
        .or_else(|| file.as_ref().map(|c| c.name.clone()))
        .ok_or_else(|| anyhow!("--index is required"))?;
    let bucket = cli
        .bucket
        .clone()
        .or_else(|| file.as_ref().map(|c| c.bucket.clone()))
        .ok_or_else(|| anyhow!("--bucket is required"))?;
    let dimensions = cli
        .dimensions
        .or_else(|| file.as_ref().map(|c| c.dimensions))
        .ok_or_else(|| anyhow!("--dimensions is required"))?;
    let distance = cli
        .distance
        .map(DistanceMetric::from)
        .or_else(|| file.as_ref().map(|c| c.distance))
        .ok_or_else(|| anyhow!("--distance is required"))?;
    let id_type = cli
        .id_type
        .map(IdType::from)
        .or_else(|| file.as_ref().map(|c| c.id_type))
        .unwrap_or_default();
    let non_filterable = file.map(|c| c.non_filterable).unwrap_or_default();

    Ok(IndexConfig::new(name, bucket, dimensions, distance)
        .with_id_type(id_type)
        .with_non_filterable(non_filterable))
}

fn parse_metadata(json: &str) -> Result<Metadata> {
    match serde_json::from_str(json).context("metadata must be JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow!("metadata must be a JSON object")),
    }
}

fn print_item(item: &Item) {
    let values: Vec<String> = item.vector.as_slice().iter().map(|x| x.to_string()).collect();
    match &item.metadata {
        Some(metadata) if !metadata.is_empty() => println!(
            "{}\t[{}]\t{}",
            item.id,
            values.join(", "),
            serde_json::Value::Object(metadata.clone())
        ),
        _ => println!("{}\t[{}]", item.id, values.join(", ")),
    }
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found");
        return;
    }
    println!("Top {} results:", results.len());
    for (i, result) in results.iter().enumerate() {
        match &result.metadata {
            Some(metadata) => println!(
                "{}. {} (distance: {:.4}) {}",
                i + 1,
                result.id,
                result.distance,
                serde_json::Value::Object(metadata.clone())
            ),
            None => println!("{}. {} (distance: {:.4})", i + 1, result.id, result.distance),
        }
    }
}

async fn run(index: &Index, command: Commands) -> Result<()> {
    match command {
        Commands::Create { .. } => {
            index.create().await?;
            println!("Created index {}", index.name());
        }
        Commands::Drop => {
            index.drop().await?;
            println!("Dropped index {}", index.name());
        }
        Commands::Exists => {
            println!("{}", index.exists().await?);
        }
        Commands::Info => {
            let info = index.info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Add { id, vector, metadata } => {
            let vector: Vector = vector.parse()?;
            match metadata {
                Some(json) => index.add_with_metadata(id.as_str(), vector, parse_metadata(&json)?).await?,
                None => index.add(id.as_str(), vector).await?,
            }
            println!("Added {}", id);
        }
        Commands::Remove { ids } => {
            let count = ids.len();
            index.remove_all(ids.into_iter().map(ItemId::from)).await?;
            println!("Removed {} item(s)", count);
        }
        Commands::Find { id, no_metadata } => {
            let options = neighbor_s3::FindOptions {
                with_metadata: !no_metadata,
            };
            match index.find_with(id.as_str(), options).await? {
                Some(item) => print_item(&item),
                None => println!("Not found: {}", id),
            }
        }
        Commands::List { batch_size } => {
            let mut total = 0;
            index
                .find_in_batches(BatchOptions::default().with_batch_size(batch_size), |batch| {
                    total += batch.len();
                    for item in &batch {
                        print_item(item);
                    }
                })
                .await?;
            println!("{} item(s)", total);
        }
        Commands::Search { query, search } => {
            let query: Vector = query.parse()?;
            print_results(&index.search(query, &search.options()?).await?);
        }
        Commands::SearchId { id, search } => {
            print_results(&index.search_id(id.as_str(), &search.options()?).await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut client_config: ClientConfig = file.client.clone().merge_env(|k| std::env::var(k).ok())?;
    if let Some(endpoint) = cli.endpoint.clone() {
        client_config.endpoint = Some(endpoint);
    }
    if let Some(region) = cli.region.clone() {
        client_config.region = Some(region);
    }
    if cli.sign {
        client_config.sign_requests = true;
    }

    let mut index_config = index_config(&cli, file.index.clone())?;
    let command = std::mem::replace(&mut cli.command, Commands::Exists);
    if let Commands::Create { non_filterable } = &command {
        if !non_filterable.is_empty() {
            index_config = index_config.with_non_filterable(non_filterable.clone());
        }
    }

    let client = Arc::new(HttpClient::connect(&client_config).await?);
    let index = Index::new(client.clone(), index_config)?;

    let result = run(&index, command).await;

    let metrics = client.metrics();
    debug!(
        requests = metrics.total_requests(),
        failures = metrics.total_failures(),
        avg_latency_us = metrics.avg_latency_us(),
        p95_latency_us = metrics.percentile_latency_us(95.0),
        "client metrics"
    );
    result
}
