//! Recorded backend responses, replayed through the reconciliation chain.
//!
//! Input file shape:
//!
//! ```json
//! {
//!   "items": [{
//!     "id": "ig-1",
//!     "caption": "...",
//!     "posterUrl": "https://...",
//!     "responses": {
//!       "caption-text": { "title": "..." },
//!       "poster-ocr": { "error": "503 Service Unavailable" }
//!     }
//!   }]
//! }
//! ```
//!
//! A response of the form `{"error": "..."}` replays as a failed call.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use contest_common::{BackendInput, ChainConfig, ContestItem, SourceTag};
use contest_reconcile::{Backend, ImageExtractor, TextExtractor};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayFile {
    pub items: Vec<RecordedItem>,
}

#[derive(Debug, Deserialize)]
pub struct RecordedItem {
    #[serde(flatten)]
    pub item: ContestItem,
    #[serde(default)]
    pub responses: HashMap<SourceTag, Value>,
}

pub fn load_replay_file(path: &Path) -> Result<ReplayFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file: {}", path.display()))?;
    parse_replay(&content).with_context(|| format!("Failed to parse replay file: {}", path.display()))
}

pub fn parse_replay(content: &str) -> Result<ReplayFile> {
    Ok(serde_json::from_str(content)?)
}

impl ReplayFile {
    pub fn contest_items(&self) -> Vec<ContestItem> {
        self.items.iter().map(|r| r.item.clone()).collect()
    }

    /// One backend per chain entry, each answering from the recorded
    /// responses for its tag.
    pub fn backends(&self, chain: &ChainConfig) -> Vec<Backend> {
        chain
            .sources
            .iter()
            .map(|entry| {
                let extractor = Arc::new(ReplayExtractor::for_source(self, &entry.tag, entry.input));
                match entry.input {
                    BackendInput::Caption => Backend::text(entry.tag.clone(), extractor),
                    BackendInput::Poster => Backend::image(entry.tag.clone(), extractor),
                }
            })
            .collect()
    }
}

/// Answers for one source tag, keyed by caption text or poster URL.
pub struct ReplayExtractor {
    tag: SourceTag,
    responses: HashMap<String, Value>,
}

impl ReplayExtractor {
    pub fn for_source(file: &ReplayFile, tag: &SourceTag, input: BackendInput) -> Self {
        let responses = file
            .items
            .iter()
            .filter_map(|recorded| {
                let key = match input {
                    BackendInput::Caption => recorded.item.caption()?,
                    BackendInput::Poster => recorded.item.poster_url()?,
                };
                let response = recorded.responses.get(tag)?;
                Some((key.to_string(), response.clone()))
            })
            .collect();
        Self {
            tag: tag.clone(),
            responses,
        }
    }

    fn replay(&self, input: &str) -> Result<Value> {
        let Some(response) = self.responses.get(input) else {
            bail!("{}: no recorded response", self.tag);
        };
        if let Some(error) = recorded_error(response) {
            bail!("{error}");
        }
        Ok(response.clone())
    }
}

fn recorded_error(response: &Value) -> Option<&str> {
    let map = response.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("error")?.as_str()
}

#[async_trait]
impl TextExtractor for ReplayExtractor {
    async fn extract_text(&self, caption: &str) -> Result<Value> {
        self.replay(caption)
    }
}

#[async_trait]
impl ImageExtractor for ReplayExtractor {
    async fn extract_image(&self, poster_url: &str) -> Result<Value> {
        self.replay(poster_url)
    }
}

#[cfg(test)]
mod tests {
    use contest_common::{CanonicalSchema, Field};
    use contest_reconcile::{AttemptOutcome, Orchestrator, ReconcileStatus};

    use super::*;

    const SAMPLE: &str = r#"{
        "items": [
            {
                "id": "ig-1",
                "caption": "Hology 8.0 dibuka!",
                "posterUrl": "https://cdn.example.com/hology.jpg",
                "responses": {
                    "caption-text": {"title": "Hology 8.0", "startDate": "2026-01-10"},
                    "poster-ocr": {"error": "503 Service Unavailable"},
                    "poster-vision": {"organizer": "Universitas Brawijaya", "url": "https://hology.ub.ac.id"}
                }
            },
            {
                "id": "ig-2",
                "caption": "   "
            }
        ]
    }"#;

    #[test]
    fn parses_items_and_responses() {
        let file = parse_replay(SAMPLE).unwrap();
        assert_eq!(file.items.len(), 2);
        assert_eq!(file.items[0].item.poster_url(), Some("https://cdn.example.com/hology.jpg"));
        assert_eq!(file.items[0].responses.len(), 3);
        assert!(file.items[1].responses.is_empty());
        assert_eq!(file.items[1].item.caption(), None);
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        assert!(parse_replay(r#"{"items": [], "extra": 1}"#).is_err());
    }

    #[test]
    fn error_objects_replay_as_failures() {
        assert_eq!(recorded_error(&serde_json::json!({"error": "timeout"})), Some("timeout"));
        assert_eq!(recorded_error(&serde_json::json!({"error": "x", "title": "y"})), None);
        assert_eq!(recorded_error(&serde_json::json!({"title": "y"})), None);
    }

    #[tokio::test]
    async fn replays_through_default_chain() {
        let file = parse_replay(SAMPLE).unwrap();
        let orchestrator = Orchestrator::new(
            file.backends(&ChainConfig::default()),
            CanonicalSchema::default(),
        );

        let results = orchestrator.reconcile_all(&file.contest_items(), 2).await;

        assert_eq!(results[0].status, ReconcileStatus::Accepted);
        assert_eq!(
            results[0].provenance.get(Field::Organizer).map(SourceTag::as_str),
            Some("poster-vision")
        );
        assert!(matches!(
            results[0].trail_for("poster-ocr").unwrap().outcome,
            AttemptOutcome::Failed { .. }
        ));
        assert_eq!(results[1].status, ReconcileStatus::Exhausted);
    }
}
