//! The retrieval service: lists, items and the AI-assisted helpers.
//!
//! Every operation is independent. Nothing is cached between calls and
//! there is no cross-operation transaction; consistency is whatever a
//! single index call guarantees. Two concurrent updates of one item race
//! between fetch and upsert and the last upsert wins.

use std::sync::Arc;

use crate::{
    config::Config,
    eid::Eid,
    index::{IndexError, IndexRecord, VectorIndex},
    llm::{CompletionRequest, LanguageModel, LlmError},
    query::{self, ItemFilter, SCAN_LIMIT},
    records::{Item, ItemUpdate, List, NewItem, Record, EMBEDDING_DIM},
};

use super::{
    backend::{AppBackend, RelevantListRequest, SummaryRequest, TagRequest},
    errors::AppError,
    prompts,
};

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub dimension: usize,
    pub scan_limit: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
            scan_limit: SCAN_LIMIT,
        }
    }
}

impl From<&Config> for ServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            dimension: config.index.dimension,
            scan_limit: config.index.scan_limit,
        }
    }
}

pub struct CurationService {
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LanguageModel>,
    opts: ServiceOptions,
}

impl CurationService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        opts: ServiceOptions,
    ) -> Self {
        Self { index, llm, opts }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let vector = self.llm.embed(text)?;

        if vector.len() != self.opts.dimension {
            return Err(LlmError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.opts.dimension,
                vector.len()
            )));
        }

        Ok(vector)
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Local time in ISO-8601 with microseconds, e.g. `2024-05-01T10:00:00.123456`.
fn now_iso8601() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn update_error(err: IndexError) -> AppError {
    log::error!("Error updating item: {err}");
    AppError::Update(err)
}

impl AppBackend for CurationService {
    fn list_all_lists(&self) -> Result<Vec<List>, AppError> {
        let matches = self.index.query(&query::lists_scan(self.opts.scan_limit))?;

        let lists = matches
            .iter()
            .filter_map(|hit| match Record::from_match(hit) {
                Ok(Record::List(list)) => Some(list),
                Ok(Record::Item(item)) => {
                    log::warn!("list scan returned item {}", item.id);
                    None
                }
                Err(err) => {
                    log::warn!("skipping list: {err}");
                    None
                }
            })
            .collect();

        Ok(lists)
    }

    fn create_list(&self, name: &str) -> Result<List, AppError> {
        if name.is_empty() {
            return Err(AppError::Validation("List name is required".to_string()));
        }

        let list = List::new(name, self.opts.dimension);
        self.index
            .upsert(vec![Record::List(list.clone()).to_index_record()])?;

        log::info!("created list {} ({name})", list.id);
        Ok(list)
    }

    fn save_item(&self, new_item: NewItem) -> Result<Item, AppError> {
        let (Some(url), Some(title), Some(list_id)) = (
            required(&new_item.url),
            required(&new_item.title),
            required(&new_item.list_id),
        ) else {
            return Err(AppError::Validation(
                "URL, title, and list_id are required".to_string(),
            ));
        };

        let note = new_item.note.clone().unwrap_or_default();
        let vector = self.embed(&note)?;

        let item = Item {
            id: Eid::new(),
            title: title.to_string(),
            url: url.to_string(),
            note,
            tags: new_item.tags.clone().unwrap_or_default(),
            image_url: new_item.image_url.clone().unwrap_or_default(),
            list_id: list_id.to_string(),
            date_added: now_iso8601(),
            vector,
        };

        self.index
            .upsert(vec![Record::Item(item.clone()).to_index_record()])?;

        log::info!("saved item {} to list {}", item.id, item.list_id);
        Ok(item)
    }

    fn delete_item(&self, id: &str) -> Result<(), AppError> {
        if id.is_empty() {
            return Err(AppError::Validation("Item id is required".to_string()));
        }

        self.index.delete(&[id.to_string()]).map_err(|err| {
            log::error!("Error deleting item: {err}");
            AppError::Deletion(err)
        })
    }

    fn update_item(&self, id: &str, update: ItemUpdate) -> Result<(), AppError> {
        if id.is_empty() {
            return Err(AppError::Validation("Item id is required".to_string()));
        }

        let not_found = || AppError::NotFound("Item not found".to_string());

        let mut fetched = self.index.fetch(&[id.to_string()]).map_err(update_error)?;
        let existing = fetched.remove(id).ok_or_else(not_found)?;

        match Record::from_index_record(&existing) {
            Ok(Record::Item(_)) => {}
            Ok(Record::List(_)) => return Err(not_found()),
            Err(err) => {
                log::warn!("refusing to update {id}: {err}");
                return Err(not_found());
            }
        }

        let IndexRecord {
            values,
            mut metadata,
            ..
        } = existing;
        update.apply_to(&mut metadata);

        // the stored vector goes back untouched, metadata edits never re-embed
        let merged = IndexRecord {
            id: id.to_string(),
            values,
            metadata,
        };
        self.index.upsert(vec![merged]).map_err(update_error)?;

        log::info!("updated item {id}");
        Ok(())
    }

    fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>, AppError> {
        let matches = self
            .index
            .query(&query::items_scan(&filter, self.opts.scan_limit))
            .map_err(|err| {
                log::error!("Error fetching items: {err}");
                AppError::Fetch(err)
            })?;

        let items = matches
            .iter()
            .filter_map(|hit| match Record::from_match(hit) {
                Ok(Record::Item(item)) => Some(item),
                Ok(Record::List(list)) => {
                    log::warn!("item scan returned list {}", list.id);
                    None
                }
                Err(err) => {
                    log::warn!("skipping item: {err}");
                    None
                }
            })
            .collect();

        Ok(items)
    }

    fn suggest_tags(&self, request: TagRequest) -> Result<Vec<String>, AppError> {
        let completion = self.llm.complete(&CompletionRequest {
            system_prompt: prompts::TAG_SYSTEM_PROMPT.to_string(),
            user_prompt: prompts::tag_prompt(
                &request.url,
                &request.title,
                &request.content,
                &request.existing_tags,
            ),
            max_tokens: Some(prompts::TAG_MAX_TOKENS),
            temperature: prompts::TEMPERATURE,
        })?;

        Ok(prompts::split_tags(&completion))
    }

    fn generate_summary(&self, request: SummaryRequest) -> Result<String, AppError> {
        let completion = self.llm.complete(&CompletionRequest {
            system_prompt: prompts::SUMMARY_SYSTEM_PROMPT.to_string(),
            user_prompt: prompts::summary_prompt(&request.url, &request.title, &request.content),
            max_tokens: None,
            temperature: prompts::TEMPERATURE,
        })?;

        Ok(completion.trim().to_string())
    }

    fn get_relevant_list(&self, request: RelevantListRequest) -> Result<Option<List>, AppError> {
        let vector = self.embed(&format!("{} {}", request.title, request.url))?;
        let matches = self.index.query(&query::nearest_list(vector))?;

        let Some(hit) = matches.first() else {
            return Ok(None);
        };

        match Record::from_match(hit) {
            Ok(Record::List(list)) => Ok(Some(list)),
            Ok(Record::Item(item)) => {
                log::warn!("list query returned item {}", item.id);
                Ok(None)
            }
            Err(err) => {
                log::warn!("ignoring relevant list match: {err}");
                Ok(None)
            }
        }
    }
}
