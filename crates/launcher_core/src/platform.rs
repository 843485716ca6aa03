//! Host-environment seams: opening URLs and receiving inbound deep links.

use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

const LINK_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenUrlError {
    #[error("no handler registered for {0}")]
    NoHandler(String),
    #[error("failed to open {url}: {reason}")]
    Launch { url: String, reason: String },
}

#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<(), OpenUrlError>;
}

/// Hands URLs to the operating system's registered handler.
///
/// The handler runs on a blocking worker; a missing handler or a non-zero
/// exit status from the platform launcher is reported as an error.
pub struct SystemUrlOpener;

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open_url(&self, url: &str) -> Result<(), OpenUrlError> {
        let target = url.to_string();
        let outcome = tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|err| OpenUrlError::Launch {
                url: url.to_string(),
                reason: format!("opener task failed: {err}"),
            })?;
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(OpenUrlError::NoHandler(url.to_string()))
            }
            Err(err) => Err(OpenUrlError::Launch {
                url: url.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

pub struct MissingUrlOpener;

#[async_trait]
impl UrlOpener for MissingUrlOpener {
    async fn open_url(&self, url: &str) -> Result<(), OpenUrlError> {
        Err(OpenUrlError::NoHandler(url.to_string()))
    }
}

#[async_trait]
pub trait LinkSource: Send + Sync {
    /// URL the process was launched with, if any. Yields it at most once.
    async fn initial_url(&self) -> Option<String>;
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

/// In-process link hub. The host forwards every URL it is asked to open
/// through [`ChannelLinkSource::deliver`].
pub struct ChannelLinkSource {
    initial: Mutex<Option<String>>,
    events: broadcast::Sender<String>,
}

impl ChannelLinkSource {
    pub fn new() -> Self {
        Self::with_initial(None)
    }

    pub fn with_initial_url(url: impl Into<String>) -> Self {
        Self::with_initial(Some(url.into()))
    }

    fn with_initial(initial: Option<String>) -> Self {
        let (events, _) = broadcast::channel(LINK_EVENT_CAPACITY);
        Self {
            initial: Mutex::new(initial),
            events,
        }
    }

    /// Returns how many listeners received the URL.
    pub fn deliver(&self, url: impl Into<String>) -> usize {
        let url = url.into();
        match self.events.send(url) {
            Ok(listeners) => listeners,
            Err(broadcast::error::SendError(url)) => {
                debug!(url = %url, "deeplink: no listener for inbound url");
                0
            }
        }
    }
}

impl Default for ChannelLinkSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkSource for ChannelLinkSource {
    async fn initial_url(&self) -> Option<String> {
        self.initial.lock().await.take()
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
