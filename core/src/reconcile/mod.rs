//! Reconcile engine: readiness-gated configuration and plan publication.
//!
//! The `reconciler` module runs the guard sequence for one event and pushes
//! configuration into the workload. The `publisher` module builds the
//! supervisor layer and merges it idempotently.

pub mod publisher;
pub mod reconciler;

pub use publisher::{build_plan, publish, PublishOutcome};
pub use reconciler::{Collaborators, Outcome, Reconciler};
