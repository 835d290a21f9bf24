//! # neighbor-s3
//!
//! Nearest neighbor search client for S3 Vectors.
//!
//! This library provides:
//! - Index lifecycle management (create, exists, info, drop)
//! - Vector ingestion with local dimension checks and batching
//! - Point lookup and paginated scans
//! - Search by vector or by item id, with metadata filters
//!
//! Indexing and distance computation happen on the service; this crate
//! validates input, shapes requests and translates responses.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use neighbor_s3::{DistanceMetric, HttpClient, Index, IndexConfig, SearchOptions};
//!
//! # async fn run() -> neighbor_s3::Result<()> {
//! // set S3VECTORS_SIGN_REQUESTS=1 to sign with the AWS credential chain
//! let client = Arc::new(HttpClient::from_env().await?);
//! let config = IndexConfig::new("items", "my-bucket", 3, DistanceMetric::Cosine);
//! let index = Index::create_new(client, config).await?;
//!
//! index.add(1, [1.0, 1.0, 1.0]).await?;
//! index.add(2, [-1.0, -1.0, -1.0]).await?;
//!
//! let results = index.search([1.0, 1.0, 1.0], &SearchOptions::default()).await?;
//! for r in results {
//!     println!("{} {}", r.id, r.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod distance;
pub mod error;
pub mod filter;
pub mod id;
pub mod index;
pub mod metrics;
pub mod vector;

pub use api::{HttpClient, Metadata, RequestSigner, VectorsApi};
pub use config::{ClientConfig, Config, IndexConfig};
pub use distance::DistanceMetric;
pub use error::{NeighborError, Result, ServiceError, ServiceErrorKind};
pub use filter::Filter;
pub use id::{IdType, ItemId};
pub use index::{BatchOptions, Batches, FindOptions, Index, Item, SearchOptions, SearchResult};
pub use metrics::MetricsCollector;
pub use vector::Vector;
