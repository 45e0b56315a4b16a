//! Classification client: one request/response exchange with a completion
//! service, reconciled back onto the batch's prompt order.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod classifier;
pub(crate) mod error_classification;
pub mod predicate;
pub mod service;

pub use classifier::{reconcile_choices, Classifier, ClassifyOutcome};
pub use predicate::{AcceptancePredicate, AffirmativeMarker, PatternPredicate};
pub use service::{
    Choice, CompletionOutcome, CompletionRequest, CompletionService, GenerationParams,
};
