use serde::{Deserialize, Serialize};

use crate::{
    query::ItemFilter,
    records::{Item, ItemUpdate, List, NewItem},
};

use super::errors::AppError;

pub trait AppBackend: Send + Sync {
    /// Every list, in no particular order.
    fn list_all_lists(&self) -> Result<Vec<List>, AppError>;

    fn create_list(&self, name: &str) -> Result<List, AppError>;

    fn save_item(&self, item: NewItem) -> Result<Item, AppError>;

    /// Idempotent: deleting an unknown id succeeds.
    fn delete_item(&self, id: &str) -> Result<(), AppError>;

    /// Merges `update` into the stored item without re-embedding it.
    /// A list id is `NotFound`, lists are never modified here.
    fn update_item(&self, id: &str, update: ItemUpdate) -> Result<(), AppError>;

    /// Items matching every given filter, in no particular order.
    fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>, AppError>;

    fn suggest_tags(&self, request: TagRequest) -> Result<Vec<String>, AppError>;

    fn generate_summary(&self, request: SummaryRequest) -> Result<String, AppError>;

    /// Closest list to the page, `None` when no list exists.
    fn get_relevant_list(&self, request: RelevantListRequest) -> Result<Option<List>, AppError>;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TagRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub existing_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelevantListRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}
