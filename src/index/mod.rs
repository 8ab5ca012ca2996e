//! Vector index boundary.
//!
//! Records are `(id, vector, metadata)` triples living in one shared
//! namespace. The service only talks to the index through [`VectorIndex`];
//! [`PineconeIndex`] is the production implementation.

mod pinecone;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::query::QueryDescriptor;

pub use pinecone::PineconeIndex;

/// Flat metadata map stored next to every vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A full record as written to (or fetched from) the index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    #[serde(default)]
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A single query hit. `values` is empty unless the index was asked for them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<IndexRecord> for IndexMatch {
    fn from(record: IndexRecord) -> Self {
        IndexMatch {
            id: record.id,
            score: 0.0,
            values: record.values,
            metadata: record.metadata,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("index request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("index returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0}")]
    Other(String),
}

pub trait VectorIndex: Send + Sync {
    /// Writes vector and metadata of every record in a single call.
    fn upsert(&self, records: Vec<IndexRecord>) -> Result<(), IndexError>;

    fn query(&self, query: &QueryDescriptor) -> Result<Vec<IndexMatch>, IndexError>;

    /// Missing ids are simply absent from the returned map.
    fn fetch(&self, ids: &[String]) -> Result<HashMap<String, IndexRecord>, IndexError>;

    /// Deleting an unknown id is not an error.
    fn delete(&self, ids: &[String]) -> Result<(), IndexError>;
}
