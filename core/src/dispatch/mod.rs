//! Event dispatch: deferral queue, retry policy and the dispatcher loop.
//!
//! The `queue` module holds deferred events keyed by kind. The `retry` module
//! provides backoff policies and per-event attempt tracking. The `dispatcher`
//! module ties both to the reconciler.

pub mod dispatcher;
pub mod queue;
pub mod retry;

pub use dispatcher::{Dispatcher, Handled};
