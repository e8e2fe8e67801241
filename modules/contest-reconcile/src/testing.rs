// Test mocks for the reconciliation chain.
//
// MockBackend implements both TextExtractor and ImageExtractor, so one mock
// can stand in for any link of the chain. Responses are canned JSON keyed by
// input (caption text or poster URL) with an optional default; unregistered
// inputs fail, as do mocks built with `failing`. Every call is counted.
//
// Plus helpers for constructing ContestItems.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use contest_common::ContestItem;

use crate::traits::{ImageExtractor, TextExtractor};

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockBackend {
    responses: HashMap<String, Value>,
    default_response: Option<Value>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `value` for every input.
    pub fn returning(value: Value) -> Self {
        Self::new().with_default(value)
    }

    /// Fails every call with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Register a response for one caption or poster URL.
    pub fn on_input(mut self, input: &str, value: Value) -> Self {
        self.responses.insert(input.to_string(), value);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_response = Some(value);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn respond(&self, input: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        if let Some(value) = self.responses.get(input).or(self.default_response.as_ref()) {
            return Ok(value.clone());
        }
        bail!("MockBackend: no response registered for {input}")
    }
}

#[async_trait]
impl TextExtractor for MockBackend {
    async fn extract_text(&self, caption: &str) -> Result<Value> {
        self.respond(caption).await
    }
}

#[async_trait]
impl ImageExtractor for MockBackend {
    async fn extract_image(&self, poster_url: &str) -> Result<Value> {
        self.respond(poster_url).await
    }
}

// ---------------------------------------------------------------------------
// Item helpers
// ---------------------------------------------------------------------------

pub fn caption_item(id: &str, caption: &str) -> ContestItem {
    ContestItem {
        id: Some(id.to_string()),
        caption: Some(caption.to_string()),
        poster_url: None,
    }
}

pub fn poster_item(id: &str, poster_url: &str) -> ContestItem {
    ContestItem {
        id: Some(id.to_string()),
        caption: None,
        poster_url: Some(poster_url.to_string()),
    }
}

pub fn full_item(id: &str, caption: &str, poster_url: &str) -> ContestItem {
    ContestItem {
        id: Some(id.to_string()),
        caption: Some(caption.to_string()),
        poster_url: Some(poster_url.to_string()),
    }
}
