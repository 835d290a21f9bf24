//! Request and response shapes of the S3 Vectors API

use crate::distance::DistanceMetric;
use crate::filter::Filter;
use serde::{Deserialize, Serialize};

/// Metadata attached to a vector
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Vector payload; only float32 data is supported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    pub float32: Vec<f32>,
}

/// Identifies an index within a vector bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRef {
    pub vector_bucket_name: String,
    pub index_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataConfiguration {
    pub non_filterable_metadata_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub data_type: String,
    pub dimension: usize,
    pub distance_metric: DistanceMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_configuration: Option<MetadataConfiguration>,
}

/// Description of a remote index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub vector_bucket_name: String,
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_arn: Option<String>,
    /// Seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<f64>,
    pub data_type: String,
    pub dimension: usize,
    pub distance_metric: DistanceMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_configuration: Option<MetadataConfiguration>,
}

impl IndexInfo {
    pub fn non_filterable_keys(&self) -> &[String] {
        self.metadata_configuration
            .as_ref()
            .map(|c| c.non_filterable_metadata_keys.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetIndexResponse {
    pub index: IndexInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutInputVector {
    pub key: String,
    pub data: VectorData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutVectorsRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub vectors: Vec<PutInputVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVectorsRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub keys: Vec<String>,
    pub return_data: bool,
    pub return_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVectorsRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVectorsRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub return_data: bool,
    pub return_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryVectorsRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub top_k: usize,
    pub query_vector: VectorData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub return_metadata: bool,
    pub return_distance: bool,
}

/// A vector as returned by GetVectors, ListVectors and QueryVectors.
///
/// Fields the request did not ask for are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputVector {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<VectorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl OutputVector {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: None,
            metadata: None,
            distance: None,
        }
    }

    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data = Some(VectorData { float32: data });
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetVectorsResponse {
    #[serde(default)]
    pub vectors: Vec<OutputVector>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVectorsResponse {
    #[serde(default)]
    pub vectors: Vec<OutputVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryVectorsResponse {
    #[serde(default)]
    pub vectors: Vec<OutputVector>,
}
