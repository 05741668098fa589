//! Request-log API client

use async_trait::async_trait;
use printhook_core::{RawEvent, RelayConfig};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::RelayError;

/// Source of captured-request batches
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the current page of captured requests, in upstream order.
    async fn fetch_batch(&self) -> Result<Vec<RawEvent>, RelayError>;

    /// Where batches come from, for logging
    fn describe(&self) -> String;
}

/// Body of the request listing; the API has returned both shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RequestListing {
    Bare(Vec<Value>),
    Envelope {
        #[serde(default)]
        data: Option<Vec<Value>>,
    },
}

impl RequestListing {
    /// Normalize to a list of events, dropping entries that are not event
    /// objects.
    pub fn into_events(self) -> Vec<RawEvent> {
        let items = match self {
            RequestListing::Bare(items) => items,
            RequestListing::Envelope { data } => data.unwrap_or_default(),
        };

        items
            .into_iter()
            .filter_map(|item| {
                if !item.is_object() {
                    debug!("Skipping non-object request entry: {}", item);
                    return None;
                }
                match serde_json::from_value::<RawEvent>(item) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        debug!("Skipping undecodable request entry: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// HTTP client for the webhook.site request listing
pub struct WebhookSiteClient {
    client: Client,
    requests_url: String,
    api_key: Option<String>,
}

impl WebhookSiteClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("printhook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RelayError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            requests_url: config.requests_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn requests_url(&self) -> &str {
        &self.requests_url
    }
}

#[async_trait]
impl EventSource for WebhookSiteClient {
    async fn fetch_batch(&self) -> Result<Vec<RawEvent>, RelayError> {
        let mut request = self
            .client
            .get(&self.requests_url)
            .header("Accept", "application/json");

        if let Some(ref api_key) = self.api_key {
            request = request.header("Api-Key", api_key);
        }

        let response = request.send().await?;
        debug!(
            "Request listing {} responded with {}",
            self.requests_url,
            response.status()
        );
        let response = response.error_for_status()?;

        let body = response.bytes().await?;
        let listing: RequestListing = serde_json::from_slice(&body)?;
        Ok(listing.into_events())
    }

    fn describe(&self) -> String {
        self.requests_url.clone()
    }
}
