//! Item identifiers and id coercion

use crate::error::{NeighborError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How item ids are typed for an index.
///
/// The service stores every key as a string; integer indexes coerce ids
/// on the way in and parse keys on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    #[default]
    String,
    Integer,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::String => "string",
            IdType::Integer => "integer",
        }
    }

    /// Coerce an id to this type.
    ///
    /// Integer coercion trims surrounding whitespace and accepts a plain
    /// decimal `i64` with an optional sign. Digit separators (`1_000`) and
    /// radix prefixes (`0x10`, `0b1`, `0o7`) are rejected with
    /// [`NeighborError::InvalidId`].
    pub fn coerce(&self, id: ItemId) -> Result<ItemId> {
        match (self, id) {
            (IdType::String, ItemId::Int(i)) => Ok(ItemId::Str(i.to_string())),
            (IdType::String, id @ ItemId::Str(_)) => Ok(id),
            (IdType::Integer, id @ ItemId::Int(_)) => Ok(id),
            (IdType::Integer, ItemId::Str(s)) => {
                let parsed = s.trim().parse::<i64>();
                parsed
                    .map(ItemId::Int)
                    .map_err(|_| NeighborError::InvalidId { value: s })
            }
        }
    }

    /// Parse a key returned by the service.
    pub fn parse_key(&self, key: &str) -> Result<ItemId> {
        self.coerce(ItemId::Str(key.to_string()))
    }
}

impl FromStr for IdType {
    type Err = NeighborError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(IdType::String),
            "integer" => Ok(IdType::Integer),
            other => Err(NeighborError::InvalidIdType(other.to_string())),
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item id, either a string or an integer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl ItemId {
    /// The string key this id is stored under remotely.
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemId::Int(i) => Some(*i),
            ItemId::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemId::Str(s) => Some(s),
            ItemId::Int(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(i) => write!(f, "{}", i),
            ItemId::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ItemId {
                fn from(i: $t) -> Self {
                    ItemId::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

// Values above `i64::MAX` have no integer key; they are kept as their
// decimal string, which an integer index rejects on coercion.
macro_rules! impl_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ItemId {
                fn from(i: $t) -> Self {
                    i64::try_from(i)
                        .map(ItemId::Int)
                        .unwrap_or_else(|_| ItemId::Str(i.to_string()))
                }
            }
        )*
    };
}

impl_from_wide_int!(u64, usize, isize);

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Str(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Str(s.to_string())
    }
}

impl From<&String> for ItemId {
    fn from(s: &String) -> Self {
        ItemId::Str(s.clone())
    }
}
