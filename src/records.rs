//! List and item records sharing one vector namespace.
//!
//! Both kinds are stored as `(id, vector, metadata)` where the `type`
//! metadata key tells them apart. At the application boundary they are a
//! proper sum type, [`Record`].

use serde::{Deserialize, Serialize};

use crate::{
    eid::Eid,
    index::{IndexMatch, IndexRecord, Metadata},
};

/// Dimension of the hosted embedding model.
pub const EMBEDDING_DIM: usize = 1536;

/// Component value of the list placeholder vector. Lists carry no
/// semantics, but the vector must differ from the all-zero scan vector.
const LIST_PLACEHOLDER_COMPONENT: f32 = 0.1;

pub fn placeholder_vector(dimension: usize) -> Vec<f32> {
    vec![LIST_PLACEHOLDER_COMPONENT; dimension]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    List,
    Item,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::List => "list",
            RecordKind::Item => "item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: Eid,
    pub name: String,

    #[serde(skip)]
    pub vector: Vec<f32>,
}

impl List {
    pub fn new(name: &str, dimension: usize) -> Self {
        List {
            id: Eid::new(),
            name: name.to_string(),
            vector: placeholder_vector(dimension),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: Eid,
    pub title: String,
    pub url: String,
    pub note: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub list_id: String,
    /// ISO-8601, stamped once at creation.
    pub date_added: String,

    /// Embedding of `note`.
    #[serde(skip)]
    pub vector: Vec<f32>,
}

/// Input of a save. Required fields are optional here so that missing
/// values surface as validation errors rather than decode failures.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewItem {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial item update. Present fields overwrite, absent ones are kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,

    /// Any other metadata keys, merged as given.
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Keys an update can never overwrite.
const PROTECTED_KEYS: [&str; 2] = ["id", "type"];

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ItemUpdate::default()
    }

    /// Shallow merge over raw metadata. Keys this update does not mention,
    /// including ones written by other tools, stay untouched.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        use serde_json::Value;

        for (key, value) in &self.extra {
            if !PROTECTED_KEYS.contains(&key.as_str()) {
                metadata.insert(key.clone(), value.clone());
            }
        }

        let strings = [
            ("title", &self.title),
            ("url", &self.url),
            ("note", &self.note),
            ("image_url", &self.image_url),
            ("list_id", &self.list_id),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                metadata.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        if let Some(tags) = &self.tags {
            metadata.insert(
                "tags".to_string(),
                Value::Array(tags.iter().cloned().map(Value::String).collect()),
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    List(List),
    Item(Item),
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record {id} has malformed metadata: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

// On-index metadata layout. Every field but the discriminator may be absent.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordMetadata {
    List(ListMetadata),
    Item(ItemMetadata),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemMetadata {
    url: String,
    title: String,
    list_id: String,
    tags: Vec<String>,
    note: String,
    image_url: String,
    date_added: String,
}

impl Record {
    pub fn id(&self) -> &Eid {
        match self {
            Record::List(list) => &list.id,
            Record::Item(item) => &item.id,
        }
    }

    pub fn to_index_record(&self) -> IndexRecord {
        use serde_json::Value;

        let mut metadata = Metadata::new();
        let mut put = |key: &str, value: Value| {
            metadata.insert(key.to_string(), value);
        };

        let values = match self {
            Record::List(list) => {
                put("type", RecordKind::List.as_str().into());
                put("name", list.name.clone().into());
                list.vector.clone()
            }
            Record::Item(item) => {
                put("type", RecordKind::Item.as_str().into());
                put("url", item.url.clone().into());
                put("title", item.title.clone().into());
                put("list_id", item.list_id.clone().into());
                put("tags", item.tags.clone().into());
                put("note", item.note.clone().into());
                put("image_url", item.image_url.clone().into());
                put("date_added", item.date_added.clone().into());
                item.vector.clone()
            }
        };

        IndexRecord {
            id: self.id().to_string(),
            values,
            metadata,
        }
    }

    pub fn from_match(hit: &IndexMatch) -> Result<Record, RecordError> {
        Self::from_parts(&hit.id, &hit.values, &hit.metadata)
    }

    pub fn from_index_record(record: &IndexRecord) -> Result<Record, RecordError> {
        Self::from_parts(&record.id, &record.values, &record.metadata)
    }

    fn from_parts(id: &str, values: &[f32], metadata: &Metadata) -> Result<Record, RecordError> {
        let parsed: RecordMetadata = serde_json::from_value(serde_json::Value::Object(
            metadata.clone(),
        ))
        .map_err(|source| RecordError::Malformed {
            id: id.to_string(),
            source,
        })?;

        let record = match parsed {
            RecordMetadata::List(meta) => Record::List(List {
                id: Eid::from(id),
                name: meta.name,
                vector: values.to_vec(),
            }),
            RecordMetadata::Item(meta) => Record::Item(Item {
                id: Eid::from(id),
                title: meta.title,
                url: meta.url,
                note: meta.note,
                tags: meta.tags,
                image_url: meta.image_url,
                list_id: meta.list_id,
                date_added: meta.date_added,
                vector: values.to_vec(),
            }),
        };

        Ok(record)
    }
}
