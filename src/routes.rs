use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::db::{Database, Feed, NewFeed};
use crate::fetcher::{FetchError, Fetcher};

pub struct AppState {
    pub db: Arc<Database>,
    pub fetcher: Arc<Fetcher>,
}

/// Errors surfaced by the HTTP API as `{"error": "..."}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] FetchError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(e) => {
                error!("Proxy fetch failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// OData-style collection wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedList {
    pub value: Vec<Feed>,
}

/// The API surface: feed CRUD, the fetch proxy, and a health probe.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/RssFeeds", get(list_feeds).post(create_feed))
        .route("/api/RssFeeds/:id", delete(delete_feed))
        .route("/rss/fetch", get(fetch_proxy))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn list_feeds(State(state): State<Arc<AppState>>) -> Result<Json<FeedList>, AppError> {
    let feeds = state.db.list_feeds().await?;
    Ok(Json(FeedList { value: feeds }))
}

pub async fn create_feed(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewFeed>, JsonRejection>,
) -> Result<(StatusCode, Json<Feed>), AppError> {
    let Json(new_feed) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if new_feed.name.trim().is_empty() || new_feed.url.trim().is_empty() {
        return Err(AppError::BadRequest("Both name and url are required".to_string()));
    }

    let feed = state.db.create_feed(new_feed).await?;
    info!("Created feed '{}' ({})", feed.name, feed.id);
    Ok((StatusCode::CREATED, Json(feed)))
}

pub async fn delete_feed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_feed(&id).await? {
        return Err(AppError::NotFound(format!("Feed {} not found", id)));
    }

    info!("Deleted feed {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct FetchQuery {
    pub url: Option<String>,
}

pub async fn fetch_proxy(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing url parameter".to_string()))?;

    let body = state.fetcher.fetch_raw(&url).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], body))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
