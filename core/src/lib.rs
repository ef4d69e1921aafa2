//! Reconcile engine for the SMF workload operator.
//!
//! Drives an SMF container to a running, correctly configured state once its
//! database and NRF peers (and optionally a UPF) are related and have
//! published their connection strings.

pub mod dispatch;
pub mod error;
pub mod infrastructure;
pub mod readiness;
pub mod reconcile;
pub mod render;
pub mod settings;
pub mod types;
pub mod workload;
