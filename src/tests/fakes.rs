//! In-process stand-ins for the hosted index and language model.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use serde_json::Value;

use crate::{
    app::{AppBackend, CurationService, ServiceOptions},
    index::{IndexError, IndexMatch, IndexRecord, Metadata, VectorIndex},
    llm::{CompletionRequest, LanguageModel, LlmError},
    query::{Condition, Filter, QueryDescriptor, QueryMode},
};

pub const TEST_DIM: usize = 8;

/// Index kept in insertion order. Scans return records in that order,
/// similarity queries rank by cosine similarity.
#[derive(Default)]
pub struct MemoryIndex {
    records: Mutex<Vec<IndexRecord>>,
    queries: Mutex<Vec<QueryDescriptor>>,
    failing: AtomicBool,
}

impl MemoryIndex {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<IndexRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn insert_raw(&self, record: IndexRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<QueryDescriptor> {
        self.queries.lock().unwrap().last().cloned()
    }

    fn check(&self) -> Result<(), IndexError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::Other("index unavailable".to_string()));
        }
        Ok(())
    }
}

fn matches_condition(value: Option<&Value>, condition: &Condition) -> bool {
    match (condition, value) {
        (Condition::Eq(expected), Some(Value::String(actual))) => actual == expected,
        (Condition::In(options), Some(Value::Array(values))) => values
            .iter()
            .filter_map(Value::as_str)
            .any(|v| options.iter().any(|o| o == v)),
        (Condition::In(options), Some(Value::String(actual))) => {
            options.iter().any(|o| o == actual)
        }
        (Condition::Contains(needle), Some(Value::String(actual))) => actual.contains(needle),
        _ => false,
    }
}

fn matches_filter(metadata: &Metadata, filter: &Filter) -> bool {
    filter
        .clauses()
        .all(|(field, condition)| matches_condition(metadata.get(field), condition))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert(&self, records: Vec<IndexRecord>) -> Result<(), IndexError> {
        self.check()?;
        let mut stored = self.records.lock().unwrap();

        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    fn query(&self, query: &QueryDescriptor) -> Result<Vec<IndexMatch>, IndexError> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());

        let stored = self.records.lock().unwrap();
        let mut hits: Vec<IndexMatch> = stored
            .iter()
            .filter(|record| matches_filter(&record.metadata, &query.filter))
            .map(|record| {
                let score = match &query.mode {
                    QueryMode::Scan => 0.0,
                    QueryMode::Similarity(vector) => cosine(vector, &record.values),
                };
                IndexMatch {
                    id: record.id.clone(),
                    score,
                    values: Vec::new(),
                    metadata: record.metadata.clone(),
                }
            })
            .collect();

        if !query.is_scan() {
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        hits.truncate(query.top_k);

        Ok(hits)
    }

    fn fetch(&self, ids: &[String]) -> Result<HashMap<String, IndexRecord>, IndexError> {
        self.check()?;
        let stored = self.records.lock().unwrap();

        Ok(stored
            .iter()
            .filter(|record| ids.contains(&record.id))
            .map(|record| (record.id.clone(), record.clone()))
            .collect())
    }

    fn delete(&self, ids: &[String]) -> Result<(), IndexError> {
        self.check()?;
        self.records
            .lock()
            .unwrap()
            .retain(|record| !ids.contains(&record.id));
        Ok(())
    }
}

/// Language model with deterministic embeddings and a canned completion.
pub struct ScriptedLlm {
    pub dimension: usize,
    completion: Mutex<String>,
    requests: Mutex<Vec<CompletionRequest>>,
    embedded: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl ScriptedLlm {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            completion: Mutex::new(String::new()),
            requests: Mutex::new(Vec::new()),
            embedded: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn reply_with(&self, completion: &str) {
        *self.completion.lock().unwrap() = completion.to_string();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }

    /// Bag-of-bytes embedding: similar texts land close together.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize + i % 3) % self.dimension] += 1.0;
        }
        if vector.iter().all(|v| *v == 0.0) {
            vector[0] = 1.0;
        }
        vector
    }
}

impl LanguageModel for ScriptedLlm {
    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Embedding("provider unavailable".to_string()));
        }
        self.embedded.lock().unwrap().push(text.to_string());
        Ok(self.vector_for(text))
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Completion("provider unavailable".to_string()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.completion.lock().unwrap().clone())
    }
}

pub struct TestContext {
    pub index: Arc<MemoryIndex>,
    pub llm: Arc<ScriptedLlm>,
    pub service: CurationService,
}

impl TestContext {
    /// Another service over the same fakes, for handing off to the router.
    pub fn backend(&self) -> Arc<dyn AppBackend> {
        Arc::new(CurationService::new(
            self.index.clone(),
            self.llm.clone(),
            ServiceOptions {
                dimension: self.llm.dimension,
                scan_limit: 100,
            },
        ))
    }
}

pub fn create_service() -> TestContext {
    let index = Arc::new(MemoryIndex::default());
    let llm = Arc::new(ScriptedLlm::new(TEST_DIM));

    let service = CurationService::new(
        index.clone(),
        llm.clone(),
        ServiceOptions {
            dimension: TEST_DIM,
            scan_limit: 100,
        },
    );

    TestContext {
        index,
        llm,
        service,
    }
}
