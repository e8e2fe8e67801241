//! Per-item fallback chain.
//!
//! Backends run strictly in priority order. Each raw result goes through
//! normalize, merge and a validity check before the next one is considered.
//! The chain stops at the first fully valid record. A backend failure never
//! aborts the item; it is recorded in the trail and treated as an empty
//! result.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use contest_common::{
    CanonicalPartial, CanonicalSchema, ContestItem, DroppedField, Field, ProvenanceMap,
    ReconcileError, SourceTag,
};

use crate::merger::{contributed_fields, merge};
use crate::normalizer::{normalize, RawExtractionResult};
use crate::traits::Backend;
use crate::validation::ValidationGate;

pub const NO_DATA_EXTRACTED: &str = "no data extracted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Pending,
    TryingSource(usize),
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The item lacks the caption or poster this backend reads.
    MissingInput,
    /// An earlier backend already produced a fully valid record.
    ChainAccepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Called and merged; the record is still incomplete.
    Attempted,
    /// Called and merged; the record is now fully valid.
    Accepted,
    /// The call returned an error. Treated as an empty result.
    Failed { error: String },
    /// The call returned something that isn't a record. Treated as empty.
    Malformed { reason: String },
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailEntry {
    pub source: SourceTag,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    /// Fields this source filled in.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributed: Vec<Field>,
    /// Rules the accumulated record still broke after this source.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedField>,
    pub elapsed_ms: u64,
}

impl TrailEntry {
    fn skipped(source: &SourceTag, reason: SkipReason) -> Self {
        Self {
            source: source.clone(),
            outcome: AttemptOutcome::Skipped { reason },
            contributed: Vec::new(),
            dropped: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// Fully valid record.
    Accepted,
    /// Chain ran out; the record is the largest valid subset.
    Degraded,
    /// No backend produced any present-valued field.
    Exhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub item_id: Option<String>,
    pub status: ReconcileStatus,
    pub record: CanonicalPartial,
    /// Provenance of the fields in `record`.
    pub provenance: ProvenanceMap,
    pub dropped: Vec<DroppedField>,
    pub trail: Vec<TrailEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Reconciliation {
    pub fn is_accepted(&self) -> bool {
        self.status == ReconcileStatus::Accepted
    }

    pub fn trail_for(&self, source: &str) -> Option<&TrailEntry> {
        self.trail.iter().find(|e| e.source.as_str() == source)
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct Orchestrator {
    /// Fallback chain, highest priority first.
    backends: Vec<Backend>,
    #[builder(default)]
    gate: ValidationGate,
}

impl Orchestrator {
    pub fn new(backends: Vec<Backend>, schema: CanonicalSchema) -> Self {
        Self {
            backends,
            gate: ValidationGate::new(schema),
        }
    }

    pub async fn reconcile(&self, item: &ContestItem) -> Reconciliation {
        let mut record = CanonicalPartial::default();
        let mut provenance = ProvenanceMap::new();
        let mut trail = Vec::with_capacity(self.backends.len());
        let mut state = ChainState::Pending;

        for (i, backend) in self.backends.iter().enumerate() {
            if state == ChainState::Accepted {
                trail.push(TrailEntry::skipped(&backend.tag, SkipReason::ChainAccepted));
                continue;
            }
            if !item.has_input(backend.input()) {
                debug!(item = item.label(), source = %backend.tag, "No input for backend, skipping");
                trail.push(TrailEntry::skipped(&backend.tag, SkipReason::MissingInput));
                continue;
            }

            state = ChainState::TryingSource(i);
            let started = Instant::now();

            let (raw, soft_failure) = match backend.invoke(item).await {
                Ok(value) => match RawExtractionResult::decode(value) {
                    RawExtractionResult::Malformed(reason) => {
                        let err = ReconcileError::MalformedResponse {
                            source_tag: backend.tag.clone(),
                            reason: reason.clone(),
                        };
                        warn!(item = item.label(), error = %err, "Backend output unusable, continuing");
                        (
                            RawExtractionResult::Empty,
                            Some(AttemptOutcome::Malformed { reason }),
                        )
                    }
                    raw => (raw, None),
                },
                Err(e) => {
                    let err = ReconcileError::SourceUnavailable {
                        source_tag: backend.tag.clone(),
                        message: format!("{e:#}"),
                    };
                    warn!(item = item.label(), error = %err, "Backend call failed, continuing");
                    (
                        RawExtractionResult::Empty,
                        Some(AttemptOutcome::Failed {
                            error: format!("{e:#}"),
                        }),
                    )
                }
            };

            let partial = normalize(&raw);
            let (merged, merged_provenance) = merge(&record, &partial, &backend.tag, &provenance);
            let contributed = contributed_fields(&record, &merged);
            record = merged;
            provenance = merged_provenance;

            let violations = self.gate.violations(&record);
            let accepted = violations.is_empty() && record.has_any_value();
            let outcome = match soft_failure {
                Some(outcome) => outcome,
                None if accepted => AttemptOutcome::Accepted,
                None => AttemptOutcome::Attempted,
            };

            debug!(
                item = item.label(),
                source = %backend.tag,
                contributed = contributed.len(),
                violations = violations.len(),
                "Backend merged"
            );

            trail.push(TrailEntry {
                source: backend.tag.clone(),
                outcome,
                contributed,
                dropped: violations,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });

            if accepted {
                state = ChainState::Accepted;
            }
        }

        let status = match state {
            ChainState::Accepted => ReconcileStatus::Accepted,
            ChainState::TryingSource(last) => {
                debug!(item = item.label(), last_source = %self.backends[last].tag, "Chain exhausted");
                if record.has_any_value() {
                    ReconcileStatus::Degraded
                } else {
                    ReconcileStatus::Exhausted
                }
            }
            ChainState::Pending => {
                debug!(item = item.label(), "No backend had input for item");
                ReconcileStatus::Exhausted
            }
        };

        let (record, dropped, diagnostic) = match status {
            ReconcileStatus::Exhausted => (
                CanonicalPartial::default(),
                Vec::new(),
                Some(NO_DATA_EXTRACTED.to_string()),
            ),
            ReconcileStatus::Accepted | ReconcileStatus::Degraded => {
                let (record, dropped) = self.gate.validate(&record).into_parts();
                (record, dropped, None)
            }
        };
        let provenance = provenance.project(&record);

        info!(
            item = item.label(),
            status = ?status,
            fields = record.present_fields().len(),
            dropped = dropped.len(),
            "Item reconciled"
        );

        Reconciliation {
            item_id: item.id.clone(),
            status,
            record,
            provenance,
            dropped,
            trail,
            diagnostic,
        }
    }

    /// Reconcile independent items, at most `concurrency` at a time.
    /// Results are returned in input order.
    pub async fn reconcile_all(&self, items: &[ContestItem], concurrency: usize) -> Vec<Reconciliation> {
        let mut results: Vec<(usize, Reconciliation)> = stream::iter(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| async move { (idx, self.reconcile(item).await) }),
        )
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }
}
