use anyhow::anyhow;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::{
    query::ItemFilter,
    records::{Item, ItemUpdate, List, NewItem},
};

use super::{backend::*, errors::AppError};

/// Talks to a running `kpin daemon` over its JSON api.
pub struct AppRemote {
    remote_addr: String,
    client: reqwest::blocking::Client,
}

impl AppRemote {
    pub fn new(addr: &str) -> AppRemote {
        let remote_addr = addr.strip_suffix("/").unwrap_or(addr).to_string();

        AppRemote {
            remote_addr,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        log::info!("{}{}", self.remote_addr, url);
        self.client.get(format!("{}{}", self.remote_addr, url))
    }

    fn post(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        log::info!("{}{}", self.remote_addr, url);
        self.client.post(format!("{}{}", self.remote_addr, url))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum WebResponse<T> {
    Error { error: String },
    Data(T),
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

fn handle_response<T>(response: reqwest::blocking::Response) -> Result<T, AppError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let text = response.text()?;

    let web_response = serde_json::from_str::<WebResponse<T>>(&text).map_err(|err| {
        log::error!("{err}. tried to parse: {text:?}");
        AppError::Other(err.into())
    })?;

    match web_response {
        WebResponse::Data(data) => Ok(data),
        WebResponse::Error { error } => Err(match status {
            StatusCode::BAD_REQUEST => AppError::Validation(error),
            StatusCode::NOT_FOUND => AppError::NotFound(error),
            _ => AppError::Other(anyhow!(error)),
        }),
    }
}

impl AppBackend for AppRemote {
    fn list_all_lists(&self) -> Result<Vec<List>, AppError> {
        let resp = self.get("/get_lists").send()?;
        handle_response(resp)
    }

    fn create_list(&self, name: &str) -> Result<List, AppError> {
        let resp = self
            .post("/create_list")
            .json(&json!({ "name": name }))
            .send()?;

        handle_response(resp)
    }

    fn save_item(&self, item: NewItem) -> Result<Item, AppError> {
        let resp = self.post("/save_item").json(&item).send()?;
        handle_response(resp)
    }

    fn delete_item(&self, id: &str) -> Result<(), AppError> {
        let resp = self
            .post("/delete_item")
            .json(&json!({ "id": id }))
            .send()?;

        handle_response::<MessageResponse>(resp).map(|_| ())
    }

    fn update_item(&self, id: &str, update: ItemUpdate) -> Result<(), AppError> {
        let mut body = serde_json::to_value(&update).map_err(|err| AppError::Other(err.into()))?;
        body["id"] = json!(id);

        let resp = self.post("/update_item").json(&body).send()?;
        handle_response::<MessageResponse>(resp).map(|_| ())
    }

    fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>, AppError> {
        log::debug!("list_items: {filter:?}");
        let resp = self.get("/get_items").query(&filter).send()?;
        handle_response(resp)
    }

    fn suggest_tags(&self, request: TagRequest) -> Result<Vec<String>, AppError> {
        let resp = self.post("/suggest_tags").json(&request).send()?;
        handle_response(resp)
    }

    fn generate_summary(&self, request: SummaryRequest) -> Result<String, AppError> {
        let resp = self.post("/generate_summary").json(&request).send()?;
        handle_response(resp)
    }

    fn get_relevant_list(&self, request: RelevantListRequest) -> Result<Option<List>, AppError> {
        let resp = self.post("/get_relevant_list").json(&request).send()?;
        handle_response(resp)
    }
}
