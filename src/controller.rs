//! Client side of the reader: talks to the backend, feeds proxy responses
//! through the parser and produces the next [`ReaderState`].
//!
//! Every operation takes the current state by value and returns the next
//! one; nothing is mutated behind the caller's back. Feed loads are numbered
//! by a generation counter. Starting a load bumps the counter, and any load
//! still in flight for an older generation is dropped and reported as
//! [`LoadOutcome::Superseded`], so a slow response can never overwrite the
//! state of a newer selection.

use std::fmt;

use reqwest::{Client, StatusCode};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dates::DateFormatter;
use crate::db::{Feed, NewFeed};
use crate::parser::{parse_articles, Article};
use crate::routes::{ErrorBody, FeedList};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to fetch feed")]
    FeedUnavailable,
    #[error("backend answered {status}: {message}")]
    Backend { status: StatusCode, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A message for the user: transient toast or blocking error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast(String),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderState {
    pub feeds: Vec<Feed>,
    pub items: Vec<Article>,
    /// URL of the selected feed
    pub selected_feed: Option<String>,
    pub loading: bool,
    /// Notices raised by the last operation, oldest first
    pub notices: Vec<Notice>,
}

impl ReaderState {
    fn toast(&mut self, message: &str) {
        self.notices.push(Notice::Toast(message.to_string()));
    }

    fn error(&mut self, message: String) {
        self.notices.push(Notice::Error(message));
    }

    /// The state to show while `url` is being fetched: selected, empty, loading.
    pub fn loading_view(&self, url: &str) -> ReaderState {
        ReaderState {
            feeds: self.feeds.clone(),
            items: Vec::new(),
            selected_feed: Some(url.to_string()),
            loading: true,
            notices: self.notices.clone(),
        }
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Feeds:")?;
        for feed in &self.feeds {
            let marker = if self.selected_feed.as_deref() == Some(feed.url.as_str()) {
                '*'
            } else {
                ' '
            };
            writeln!(f, " {} {} <{}>", marker, feed.name, feed.url)?;
        }

        if self.loading {
            writeln!(f, "Loading...")?;
        } else {
            writeln!(f, "Articles ({}):", self.items.len())?;
            for article in &self.items {
                write!(f, "  - {}", article.title)?;
                if !article.published_label.is_empty() {
                    write!(f, " [{}]", article.published_label)?;
                }
                writeln!(f)?;
                if !article.link.is_empty() {
                    writeln!(f, "    {}", article.link)?;
                }
                if !article.description.is_empty() {
                    writeln!(f, "    {}", article.description)?;
                }
            }
        }

        for notice in &self.notices {
            match notice {
                Notice::Toast(message) => writeln!(f, "[info] {}", message)?,
                Notice::Error(message) => writeln!(f, "[error] {}", message)?,
            }
        }
        Ok(())
    }
}

/// Result of a feed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(ReaderState),
    /// A newer load started before this one finished. The response was
    /// dropped and the state handed in is returned untouched.
    Superseded(ReaderState),
}

/// HTTP access to the reader backend.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>, ClientError> {
        let response = self.client.get(self.endpoint("/api/RssFeeds")).send().await?;
        let list: FeedList = check_status(response).await?.json().await?;
        Ok(list.value)
    }

    pub async fn create_feed(&self, new_feed: &NewFeed) -> Result<Feed, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/api/RssFeeds"))
            .json(new_feed)
            .send()
            .await?;
        let feed = check_status(response).await?.json().await?;
        Ok(feed)
    }

    pub async fn delete_feed(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/api/RssFeeds/{}", id)))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Raw feed text through the backend's same-origin proxy.
    pub async fn fetch_feed_xml(&self, feed_url: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(self.endpoint("/rss/fetch"))
            .query(&[("url", feed_url)])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Proxy answered {} for {}", response.status(), feed_url);
            return Err(ClientError::FeedUnavailable);
        }
        Ok(response.text().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Backend { status, message })
}

pub struct ReaderController {
    backend: BackendClient,
    dates: DateFormatter,
    generation: watch::Sender<u64>,
}

impl ReaderController {
    pub fn new(backend: BackendClient, dates: DateFormatter) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            backend,
            dates,
            generation,
        }
    }

    /// Load the feed list and open the first feed, if any.
    pub async fn init(&self, mut state: ReaderState) -> LoadOutcome {
        state.notices.clear();

        match self.backend.list_feeds().await {
            Ok(feeds) => state.feeds = feeds,
            Err(e) => {
                warn!("Listing feeds failed: {}", e);
                state.error(format!("Failed to load feeds: {}", e));
                return LoadOutcome::Loaded(state);
            }
        }

        match state.feeds.first().map(|feed| feed.url.clone()) {
            Some(url) => self.load_feed(state, &url).await,
            None => LoadOutcome::Loaded(state),
        }
    }

    pub async fn select_feed(&self, mut state: ReaderState, url: &str) -> LoadOutcome {
        state.notices.clear();
        self.load_feed(state, url).await
    }

    pub async fn refresh(&self, mut state: ReaderState) -> LoadOutcome {
        state.notices.clear();

        let Some(url) = state.selected_feed.clone() else {
            state.toast("Please select a feed first");
            return LoadOutcome::Loaded(state);
        };

        state.toast("Refreshing feed...");
        self.load_feed(state, &url).await
    }

    pub async fn add_feed(&self, mut state: ReaderState, name: &str, url: &str) -> ReaderState {
        state.notices.clear();

        if name.trim().is_empty() || url.trim().is_empty() {
            state.toast("Please fill in both fields");
            return state;
        }

        let new_feed = NewFeed {
            id: None,
            name: name.to_string(),
            url: url.to_string(),
        };
        match self.backend.create_feed(&new_feed).await {
            Ok(feed) => {
                info!("Added feed '{}'", feed.name);
                state.feeds.push(feed);
                state.toast("Feed added!");
            }
            Err(e) => state.error(format!("Failed to add feed: {}", e)),
        }
        state
    }

    pub async fn remove_feed(&self, mut state: ReaderState, id: &str) -> ReaderState {
        state.notices.clear();

        if let Err(e) = self.backend.delete_feed(id).await {
            state.error(format!("Failed to remove feed: {}", e));
            return state;
        }

        let removed_url = state
            .feeds
            .iter()
            .find(|feed| feed.id == id)
            .map(|feed| feed.url.clone());
        state.feeds.retain(|feed| feed.id != id);

        if removed_url.is_some() && state.selected_feed == removed_url {
            // the shown articles belonged to the removed feed
            self.invalidate_loads();
            state.selected_feed = None;
            state.items.clear();
            state.loading = false;
        }
        state.toast("Feed removed");
        state
    }

    /// Fetch `url` through the proxy and replace the shown articles.
    ///
    /// While the fetch runs the caller can render `state.loading_view(url)`.
    pub async fn load_feed(&self, state: ReaderState, url: &str) -> LoadOutcome {
        let generation = self.invalidate_loads();
        let mut newer = self.generation.subscribe();

        let fetched = tokio::select! {
            result = self.backend.fetch_feed_xml(url) => result,
            _ = wait_for_newer(&mut newer, generation) => {
                info!("Load of {} superseded before completion", url);
                return LoadOutcome::Superseded(state);
            }
        };

        if *self.generation.borrow() != generation {
            info!("Discarding stale response for {}", url);
            return LoadOutcome::Superseded(state);
        }

        let mut state = state.loading_view(url);
        state.loading = false;
        match fetched {
            Ok(xml) => {
                state.items = parse_articles(&xml, &self.dates);
                debug!("Parsed {} articles from {}", state.items.len(), url);
                if state.items.is_empty() {
                    state.toast("No articles found in this feed");
                }
            }
            Err(e) => {
                warn!("Loading {} failed: {}", url, e);
                state.error(format!("Failed to load feed: {}", e));
            }
        }
        LoadOutcome::Loaded(state)
    }

    /// Start a new generation, making every in-flight load stale.
    fn invalidate_loads(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });
        current
    }
}

async fn wait_for_newer(newer: &mut watch::Receiver<u64>, generation: u64) {
    if newer.wait_for(|current| *current != generation).await.is_err() {
        // sender gone: nothing can supersede this load any more
        std::future::pending::<()>().await;
    }
}
