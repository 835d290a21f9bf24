//! Vector type

use crate::error::{NeighborError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A float32 vector in n-dimensional space
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Check that the vector has exactly `expected` dimensions
    pub fn check_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() != expected {
            return Err(NeighborError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }
}

/// Parse a vector from a comma-separated string
impl FromStr for Vector {
    type Err = NeighborError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_start_matches('[').trim_end_matches(']');
        let data: Result<Vec<f32>> = s
            .split(',')
            .map(|x| {
                x.trim()
                    .parse::<f32>()
                    .map_err(|_| NeighborError::InvalidVector {
                        reason: format!("Invalid float: {}", x),
                    })
            })
            .collect();
        Ok(Vector::new(data?))
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

impl From<&[f32]> for Vector {
    fn from(data: &[f32]) -> Self {
        Vector::new(data.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for Vector {
    fn from(data: [f32; N]) -> Self {
        Vector::new(data.to_vec())
    }
}

/// Narrow f64 data to the float32 values the service stores
impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Vector::new(data.into_iter().map(|x| x as f32).collect())
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(data: [f64; N]) -> Self {
        Vector::new(data.iter().map(|&x| x as f32).collect())
    }
}

impl From<&Vector> for Vector {
    fn from(v: &Vector) -> Self {
        v.clone()
    }
}
