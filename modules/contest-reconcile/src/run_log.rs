//! Reconcile run log: a persisted JSON timeline of one batch run.
//!
//! Each run produces a single `{DATA_DIR}/reconcile-runs/{run_id}.json` file
//! with an ordered list of events and the batch stats.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use contest_common::{DroppedField, ProvenanceMap};

use crate::orchestrator::{AttemptOutcome, ReconcileStatus, Reconciliation, SkipReason, TrailEntry};

// ---------------------------------------------------------------------------
// ReconcileLog
// ---------------------------------------------------------------------------

pub struct ReconcileLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    stats: BatchStats,
    seq: u32,
}

#[derive(Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    RunStarted {
        items: usize,
        chain: Vec<String>,
    },
    ItemReconciled {
        item_id: Option<String>,
        status: ReconcileStatus,
        provenance: ProvenanceMap,
        dropped: Vec<DroppedField>,
        trail: Vec<TrailEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostic: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub items: u32,
    pub accepted: u32,
    pub degraded: u32,
    pub exhausted: u32,
    /// Backend calls that failed or returned malformed output.
    pub soft_failures: u32,
    /// Backends never called because an earlier one was enough.
    pub calls_saved: u32,
}

impl BatchStats {
    pub fn record(&mut self, result: &Reconciliation) {
        self.items += 1;
        match result.status {
            ReconcileStatus::Accepted => self.accepted += 1,
            ReconcileStatus::Degraded => self.degraded += 1,
            ReconcileStatus::Exhausted => self.exhausted += 1,
        }
        for entry in &result.trail {
            match entry.outcome {
                AttemptOutcome::Failed { .. } | AttemptOutcome::Malformed { .. } => {
                    self.soft_failures += 1
                }
                AttemptOutcome::Skipped {
                    reason: SkipReason::ChainAccepted,
                } => self.calls_saved += 1,
                _ => {}
            }
        }
    }
}

impl Default for ReconcileLog {
    fn default() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

impl ReconcileLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            stats: BatchStats::default(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    /// Log one item's outcome and fold it into the batch stats.
    pub fn log_item(&mut self, result: &Reconciliation) {
        self.stats.record(result);
        self.log(EventKind::ItemReconciled {
            item_id: result.item_id.clone(),
            status: result.status,
            provenance: result.provenance.clone(),
            dropped: result.dropped.clone(),
            trail: result.trail.clone(),
            diagnostic: result.diagnostic.clone(),
        });
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Serialize the run log to JSON and write it under `data_dir`.
    /// Returns the file path on success.
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf> {
        let dir = data_dir.join("reconcile-runs");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats: &self.stats,
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)
            .with_context(|| format!("Failed to write run log {}", path.display()))?;
        info!(path = %path.display(), events = self.events.len(), "Reconcile run log saved");

        Ok(path)
    }
}

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &'a BatchStats,
    events: &'a [RunEvent],
}

#[cfg(test)]
mod tests {
    use contest_common::{CanonicalPartial, SourceTag};

    use super::*;

    fn result(status: ReconcileStatus, trail: Vec<TrailEntry>) -> Reconciliation {
        Reconciliation {
            item_id: Some("ig-1".into()),
            status,
            record: CanonicalPartial::default(),
            provenance: ProvenanceMap::new(),
            dropped: Vec::new(),
            trail,
            diagnostic: None,
        }
    }

    fn entry(source: &str, outcome: AttemptOutcome) -> TrailEntry {
        TrailEntry {
            source: SourceTag::new(source),
            outcome,
            contributed: Vec::new(),
            dropped: Vec::new(),
            elapsed_ms: 3,
        }
    }

    #[test]
    fn stats_count_statuses_and_soft_failures() {
        let mut stats = BatchStats::default();
        stats.record(&result(
            ReconcileStatus::Accepted,
            vec![
                entry("caption-text", AttemptOutcome::Accepted),
                entry(
                    "poster-ocr",
                    AttemptOutcome::Skipped {
                        reason: SkipReason::ChainAccepted,
                    },
                ),
            ],
        ));
        stats.record(&result(
            ReconcileStatus::Degraded,
            vec![entry(
                "poster-ocr",
                AttemptOutcome::Failed {
                    error: "timeout".into(),
                },
            )],
        ));

        assert_eq!(
            stats,
            BatchStats {
                items: 2,
                accepted: 1,
                degraded: 1,
                exhausted: 0,
                soft_failures: 1,
                calls_saved: 1,
            }
        );
    }

    #[test]
    fn save_writes_json_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ReconcileLog::new("run-42".into());
        log.log(EventKind::RunStarted {
            items: 1,
            chain: vec!["caption-text".into()],
        });
        log.log_item(&result(
            ReconcileStatus::Exhausted,
            vec![entry(
                "caption-text",
                AttemptOutcome::Skipped {
                    reason: SkipReason::MissingInput,
                },
            )],
        ));

        let path = log.save(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("reconcile-runs").join("run-42.json"));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["run_id"], "run-42");
        assert_eq!(written["stats"]["exhausted"], 1);
        assert_eq!(written["events"][0]["type"], "run_started");
        assert_eq!(written["events"][1]["type"], "item_reconciled");
        assert_eq!(written["events"][1]["seq"], 1);
        assert_eq!(written["events"][1]["trail"][0]["reason"], "missing_input");
    }
}
