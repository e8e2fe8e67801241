pub mod merger;
pub mod normalizer;
pub mod orchestrator;
pub mod run_log;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod validation;

pub use merger::{contributed_fields, merge};
pub use normalizer::{normalize, normalize_value, RawExtractionResult};
pub use orchestrator::{
    AttemptOutcome, Orchestrator, ReconcileStatus, Reconciliation, SkipReason, TrailEntry,
    NO_DATA_EXTRACTED,
};
pub use run_log::{BatchStats, EventKind, ReconcileLog};
pub use traits::{Backend, BackendKind, ImageExtractor, TextExtractor};
pub use validation::{Validation, ValidationGate};
