//! Remote API seam.
//!
//! [`VectorsApi`] has one method per S3 Vectors operation used by the
//! client. [`HttpClient`] is the bundled implementation, optionally
//! SigV4-signed through [`RequestSigner`]; anything else that speaks the
//! same shapes (a signing proxy, a test double) can be plugged into an
//! [`Index`](crate::Index).

pub mod http;
pub mod signing;
pub mod types;

pub use http::HttpClient;
pub use signing::RequestSigner;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Operations of the remote vector-storage service
#[async_trait]
pub trait VectorsApi: Send + Sync {
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<()>;

    async fn get_index(&self, request: &IndexRef) -> Result<GetIndexResponse>;

    async fn delete_index(&self, request: &IndexRef) -> Result<()>;

    async fn put_vectors(&self, request: &PutVectorsRequest) -> Result<()>;

    async fn get_vectors(&self, request: &GetVectorsRequest) -> Result<GetVectorsResponse>;

    async fn delete_vectors(&self, request: &DeleteVectorsRequest) -> Result<()>;

    async fn list_vectors(&self, request: &ListVectorsRequest) -> Result<ListVectorsResponse>;

    async fn query_vectors(&self, request: &QueryVectorsRequest) -> Result<QueryVectorsResponse>;
}
