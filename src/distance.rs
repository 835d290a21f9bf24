//! Distance metrics supported by the remote index

use crate::error::{NeighborError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric used by the service to rank vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance
    Euclidean,
    /// Cosine distance (1 - cosine similarity)
    Cosine,
}

impl DistanceMetric {
    /// Wire name of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
        }
    }

    /// Convert a distance as reported by the service into a true distance.
    ///
    /// The service reports squared L2 distance for euclidean indexes.
    pub fn normalize(&self, reported: f64) -> f64 {
        match self {
            DistanceMetric::Euclidean => reported.max(0.0).sqrt(),
            DistanceMetric::Cosine => reported,
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = NeighborError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            other => Err(NeighborError::InvalidDistance(other.to_string())),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
