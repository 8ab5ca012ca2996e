use std::{borrow::Cow, collections::HashMap};

use reqwest::blocking::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::query::{Filter, QueryDescriptor, QueryMode};

use super::{IndexError, IndexMatch, IndexRecord, VectorIndex};

/// Blocking client for a Pinecone index data plane.
pub struct PineconeIndex {
    client: reqwest::blocking::Client,
    host: String,
    api_key: String,
    namespace: String,
    dimension: usize,
}

impl PineconeIndex {
    /// `host` is the index host as shown in the console, with or without a scheme.
    pub fn new(host: &str, api_key: &str, namespace: &str, dimension: usize) -> Self {
        let host = host.strip_suffix('/').unwrap_or(host);
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };

        PineconeIndex {
            client: reqwest::blocking::Client::new(),
            host,
            api_key: api_key.to_string(),
            namespace: namespace.to_string(),
            dimension,
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        log::debug!("POST {}{}", self.host, path);
        self.client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        log::debug!("GET {}{}", self.host, path);
        self.client
            .get(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
    }
}

fn check_status(response: Response) -> Result<Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(IndexError::Status { status, body })
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Cow<'a, [f32]>,
    top_k: usize,
    #[serde(skip_serializing_if = "Filter::is_empty")]
    filter: &'a Filter,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, IndexRecord>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

impl VectorIndex for PineconeIndex {
    fn upsert(&self, records: Vec<IndexRecord>) -> Result<(), IndexError> {
        let resp = self
            .post("/vectors/upsert")
            .json(&UpsertRequest {
                vectors: &records,
                namespace: &self.namespace,
            })
            .send()?;

        check_status(resp)?;
        Ok(())
    }

    fn query(&self, query: &QueryDescriptor) -> Result<Vec<IndexMatch>, IndexError> {
        // the API insists on a vector even when only the filter matters
        let vector = match &query.mode {
            QueryMode::Scan => Cow::Owned(vec![0.0; self.dimension]),
            QueryMode::Similarity(vector) => Cow::Borrowed(vector.as_slice()),
        };

        let resp = self
            .post("/query")
            .json(&QueryRequest {
                vector,
                top_k: query.top_k,
                filter: &query.filter,
                include_metadata: query.include_metadata,
                include_values: false,
                namespace: &self.namespace,
            })
            .send()?;

        let body: QueryResponse = check_status(resp)?.json()?;
        Ok(body.matches)
    }

    fn fetch(&self, ids: &[String]) -> Result<HashMap<String, IndexRecord>, IndexError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut params: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        if !self.namespace.is_empty() {
            params.push(("namespace", self.namespace.as_str()));
        }

        let resp = self.get("/vectors/fetch").query(&params).send()?;

        let body: FetchResponse = check_status(resp)?.json()?;
        Ok(body.vectors)
    }

    fn delete(&self, ids: &[String]) -> Result<(), IndexError> {
        let resp = self
            .post("/vectors/delete")
            .json(&DeleteRequest {
                ids,
                namespace: &self.namespace,
            })
            .send()?;

        check_status(resp)?;
        Ok(())
    }
}
