// Injected extraction capabilities.
//
// One trait per input kind: TextExtractor reads a caption, ImageExtractor
// reads a poster. Real clients (LLM, OCR, vision APIs) live outside this
// crate and are handed to the Orchestrator as Backends; tests use the mocks
// in `testing`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use contest_common::{BackendInput, ContestItem, SourceTag};

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract raw, loosely-shaped JSON from a caption.
    async fn extract_text(&self, caption: &str) -> Result<Value>;
}

#[async_trait]
pub trait ImageExtractor: Send + Sync {
    /// Extract raw, loosely-shaped JSON from the poster at `poster_url`.
    async fn extract_image(&self, poster_url: &str) -> Result<Value>;
}

#[derive(Clone)]
pub enum BackendKind {
    Text(Arc<dyn TextExtractor>),
    Image(Arc<dyn ImageExtractor>),
}

/// One entry in the fallback chain: a source tag plus the capability that
/// produces its raw output.
#[derive(Clone)]
pub struct Backend {
    pub tag: SourceTag,
    pub kind: BackendKind,
}

impl Backend {
    pub fn text(tag: impl Into<SourceTag>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            tag: tag.into(),
            kind: BackendKind::Text(extractor),
        }
    }

    pub fn image(tag: impl Into<SourceTag>, extractor: Arc<dyn ImageExtractor>) -> Self {
        Self {
            tag: tag.into(),
            kind: BackendKind::Image(extractor),
        }
    }

    pub fn input(&self) -> BackendInput {
        match self.kind {
            BackendKind::Text(_) => BackendInput::Caption,
            BackendKind::Image(_) => BackendInput::Poster,
        }
    }

    /// Call the capability with the input it reads from `item`.
    pub async fn invoke(&self, item: &ContestItem) -> Result<Value> {
        match &self.kind {
            BackendKind::Text(extractor) => {
                let caption = item
                    .caption()
                    .ok_or_else(|| anyhow!("{}: item has no caption", self.tag))?;
                extractor.extract_text(caption).await
            }
            BackendKind::Image(extractor) => {
                let poster_url = item
                    .poster_url()
                    .ok_or_else(|| anyhow!("{}: item has no poster", self.tag))?;
                extractor.extract_image(poster_url).await
            }
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("tag", &self.tag)
            .field("input", &self.input())
            .finish()
    }
}
