//! Query construction for the shared list/item namespace.
//!
//! Everything here is pure: request parameters go in, a [`QueryDescriptor`]
//! comes out. The index adapter decides how to execute it.

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::records::RecordKind;

/// Hard cap on metadata-only scans. There is no pagination past it.
pub const SCAN_LIMIT: usize = 100;

/// List id sentinel meaning "do not filter by list".
pub const ALL_LISTS: &str = "all";

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match on a scalar field.
    Eq(String),
    /// Matches when the field (or one of its elements) is among the values.
    In(Vec<String>),
    /// Substring containment on a string field.
    Contains(String),
}

/// Conjunctive metadata predicate. At most one condition per field; setting
/// a field twice replaces the earlier condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the record discriminator.
    pub fn of_kind(kind: RecordKind) -> Self {
        Self::new().eq("type", kind.as_str())
    }

    pub fn eq(self, field: &str, value: &str) -> Self {
        self.with(field, Condition::Eq(value.to_string()))
    }

    pub fn any_of(self, field: &str, values: Vec<String>) -> Self {
        self.with(field, Condition::In(values))
    }

    pub fn contains(self, field: &str, needle: &str) -> Self {
        self.with(field, Condition::Contains(needle.to_string()))
    }

    fn with(mut self, field: &str, condition: Condition) -> Self {
        match self.clauses.iter_mut().find(|(name, _)| name == field) {
            Some(clause) => clause.1 = condition,
            None => self.clauses.push((field.to_string(), condition)),
        }
        self
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.clauses
            .iter()
            .map(|(field, condition)| (field.as_str(), condition))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Serializes into the index's native predicate language, e.g.
/// `{"type": "item", "tags": {"$in": ["rust"]}, "url": {"$contains": "youtube.com"}}`.
impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, condition) in self.clauses() {
            match condition {
                Condition::Eq(value) => map.serialize_entry(field, value)?,
                Condition::In(values) => {
                    map.serialize_entry(field, &serde_json::json!({ "$in": values }))?
                }
                Condition::Contains(needle) => {
                    map.serialize_entry(field, &serde_json::json!({ "$contains": needle }))?
                }
            }
        }
        map.end()
    }
}

/// User supplied item filters. Every field is optional and they combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ItemFilter {
    #[serde(default, rename = "list", skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Substring of the item url, e.g. `youtube.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ItemFilter {
    /// The list id to filter on, if any. Empty values and the `all`
    /// sentinel mean no list restriction.
    pub fn list_id(&self) -> Option<&str> {
        non_empty(&self.list_id).filter(|id| *id != ALL_LISTS)
    }

    pub fn tag(&self) -> Option<&str> {
        non_empty(&self.tag)
    }

    pub fn platform(&self) -> Option<&str> {
        non_empty(&self.platform)
    }

    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::of_kind(RecordKind::Item);

        if let Some(list_id) = self.list_id() {
            filter = filter.eq("list_id", list_id);
        }
        if let Some(tag) = self.tag() {
            filter = filter.any_of("tags", vec![tag.to_string()]);
        }
        if let Some(platform) = self.platform() {
            filter = filter.contains("url", platform);
        }

        filter
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryMode {
    /// Metadata-only scan. Ranking is meaningless and result order is
    /// undefined.
    Scan,
    /// Nearest-neighbour search around a real embedding.
    Similarity(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub mode: QueryMode,
    pub top_k: usize,
    pub filter: Filter,
    pub include_metadata: bool,
}

impl QueryDescriptor {
    pub fn is_scan(&self) -> bool {
        matches!(self.mode, QueryMode::Scan)
    }
}

pub fn scan(filter: Filter, limit: usize) -> QueryDescriptor {
    QueryDescriptor {
        mode: QueryMode::Scan,
        top_k: limit,
        filter,
        include_metadata: true,
    }
}

pub fn similarity_search(vector: Vec<f32>, filter: Filter, limit: usize) -> QueryDescriptor {
    QueryDescriptor {
        mode: QueryMode::Similarity(vector),
        top_k: limit,
        filter,
        include_metadata: true,
    }
}

pub fn lists_scan(limit: usize) -> QueryDescriptor {
    scan(Filter::of_kind(RecordKind::List), limit)
}

pub fn items_scan(filter: &ItemFilter, limit: usize) -> QueryDescriptor {
    scan(filter.to_filter(), limit)
}

/// Single closest list to the given embedding.
pub fn nearest_list(vector: Vec<f32>) -> QueryDescriptor {
    similarity_search(vector, Filter::of_kind(RecordKind::List), 1)
}
