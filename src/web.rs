use crate::{
    app::{AppBackend, AppError, RelevantListRequest, SummaryRequest, TagRequest},
    config::Config,
    query::ItemFilter,
    records::{Item, ItemUpdate, List, NewItem},
};
use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<dyn AppBackend>,
}

pub fn router(app: Arc<dyn AppBackend>, cors: bool) -> Router {
    let shared_state = Arc::new(SharedState { app });

    let router = Router::new()
        .route("/health_check", get(health_check))
        .route("/get_lists", get(get_lists))
        .route("/create_list", post(create_list))
        .route("/suggest_tags", post(suggest_tags))
        .route("/save_item", post(save_item))
        .route("/delete_item", post(delete_item))
        .route("/get_relevant_list", post(get_relevant_list))
        .route("/generate_summary", post(generate_summary))
        .route("/update_item", post(update_item))
        .route("/get_items", get(get_items))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state);

    if cors {
        router.layer(tower_http::cors::CorsLayer::permissive())
    } else {
        router
    }
}

async fn start_app(app: Arc<dyn AppBackend>, config: &Config) -> anyhow::Result<()> {
    let router = router(app, config.cors);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    log::info!("listening on {}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => log::warn!("received Ctrl+C, shutting down"),
        _ = terminate => log::warn!("received terminate, shutting down"),
    }
}

pub fn start_daemon(app: Arc<dyn AppBackend>, config: &Config) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(app, config))
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            AppError::Deletion(_) | AppError::Update(_) | AppError::Fetch(_) => {
                log::error!("{:?}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
            AppError::Upstream(_) | AppError::Remote(_) | AppError::Other(_) => {
                log::error!("{:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// `Json` extractor whose rejections answer with the usual error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(HttpError))]
struct JsonBody<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(HttpError))]
struct QueryParams<T>(T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SaveItemResponse {
    pub message: String,
    pub item_id: String,
    #[serde(flatten)]
    pub item: Item,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateListRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub update: ItemUpdate,
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_lists(State(state): State<Arc<SharedState>>) -> Result<Json<Vec<List>>, HttpError> {
    let app = state.app.clone();

    tokio::task::block_in_place(move || app.list_all_lists().map(Json).map_err(Into::into))
}

async fn create_list(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<CreateListRequest>,
) -> Result<Json<List>, HttpError> {
    log::debug!("payload: {payload:?}");
    let app = state.app.clone();
    let name = payload.name.unwrap_or_default();

    tokio::task::block_in_place(move || app.create_list(&name).map(Json).map_err(Into::into))
}

async fn save_item(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<NewItem>,
) -> Result<Json<SaveItemResponse>, HttpError> {
    log::debug!("payload: {payload:?}");
    let app = state.app.clone();

    let item = tokio::task::block_in_place(move || app.save_item(payload))?;

    Ok(Json(SaveItemResponse {
        message: "Item saved successfully".to_string(),
        item_id: item.id.to_string(),
        item,
    }))
}

async fn delete_item(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<IdRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    log::debug!("payload: {payload:?}");
    let app = state.app.clone();
    let id = payload.id.unwrap_or_default();

    tokio::task::block_in_place(move || app.delete_item(&id))?;

    Ok(MessageResponse::new("Item deleted successfully"))
}

async fn update_item(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<UpdateItemRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    log::debug!("payload: {payload:?}");
    let app = state.app.clone();
    let id = payload.id.unwrap_or_default();

    tokio::task::block_in_place(move || app.update_item(&id, payload.update))?;

    Ok(MessageResponse::new("Item updated successfully"))
}

async fn get_items(
    State(state): State<Arc<SharedState>>,
    QueryParams(filter): QueryParams<ItemFilter>,
) -> Result<Json<Vec<Item>>, HttpError> {
    log::debug!("filter: {filter:?}");
    let app = state.app.clone();

    tokio::task::block_in_place(move || app.list_items(filter).map(Json).map_err(Into::into))
}

async fn suggest_tags(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<TagRequest>,
) -> Result<Json<Vec<String>>, HttpError> {
    let app = state.app.clone();

    tokio::task::block_in_place(move || app.suggest_tags(payload).map(Json).map_err(Into::into))
}

async fn generate_summary(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<SummaryRequest>,
) -> Result<Json<String>, HttpError> {
    let app = state.app.clone();

    tokio::task::block_in_place(move || {
        app.generate_summary(payload)
            .map(Json)
            .map_err(Into::into)
    })
}

async fn get_relevant_list(
    State(state): State<Arc<SharedState>>,
    JsonBody(payload): JsonBody<RelevantListRequest>,
) -> Result<Json<Option<List>>, HttpError> {
    log::debug!("payload: {payload:?}");
    let app = state.app.clone();

    tokio::task::block_in_place(move || {
        app.get_relevant_list(payload)
            .map(Json)
            .map_err(Into::into)
    })
}
