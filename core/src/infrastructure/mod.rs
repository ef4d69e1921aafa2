//! Collaborator interfaces and their backends.
//!
//! The operator never talks to the host runtime, the workload container or
//! remote applications directly. It goes through three narrow traits:
//!
//! - `Workload`: the container filesystem and its process supervisor.
//! - `RelationSource`: read-only view of relations and their published data.
//! - `HostRuntime`: unit status, port declarations, pod address.
//!
//! `mock` holds recording test doubles, `fs` a directory-backed workload for
//! local runs, `host` a runtime that shells out to hook tools, and
//! `relations` a static relation table.

pub mod fs;
pub mod host;
pub mod mock;
pub mod relations;
pub mod runner;
pub mod supervisor;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::Result;
use crate::types::plan::{Layer, ScrapeJob, ServiceChange, ServicePort};
use crate::types::status::UnitStatus;

/// The workload container: its filesystem and its process supervisor.
pub trait Workload {
    /// Whether the supervisor endpoint answers.
    fn can_connect(&self) -> bool;

    /// Whether a file exists at an absolute path inside the container.
    fn exists(&self, path: &str) -> Result<bool>;

    /// Read a file. `Ok(None)` if it does not exist.
    fn pull(&self, path: &str) -> Result<Option<String>>;

    /// Write a file, creating parent directories.
    fn push(&mut self, path: &str, content: &str) -> Result<()>;

    /// Add a layer to the supervisor. With `combine`, an existing layer of the
    /// same label is merged with the new one instead of rejected.
    fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<()>;

    /// The merged plan across all layers.
    fn plan(&self) -> Result<Layer>;

    /// Bring running services in line with the plan.
    fn replan(&mut self) -> Result<Vec<ServiceChange>>;
}

/// Read-only view of relations with remote applications.
pub trait RelationSource {
    /// Whether a relation with this name has been established.
    fn relation_exists(&self, name: &str) -> bool;

    /// The data the remote application published on the relation.
    fn relation_data(&self, name: &str) -> Option<BTreeMap<String, String>>;
}

/// The orchestration runtime hosting this unit.
pub trait HostRuntime {
    /// The pod's own address.
    fn pod_ip(&self) -> Result<Ipv4Addr>;

    fn set_status(&mut self, status: &UnitStatus) -> Result<()>;

    fn open_ports(&mut self, ports: &[ServicePort]) -> Result<()>;

    fn register_scrape_job(&mut self, job: &ScrapeJob) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::mock::{MockHost, MockWorkload};
    use super::relations::StaticRelations;
    use super::*;

    #[test]
    fn mocks_implement_collaborator_traits() {
        let workload = MockWorkload::new();
        let relations = StaticRelations::new();
        let host = MockHost::new("10.0.0.1".parse().unwrap());
        let _: &dyn Workload = &workload;
        let _: &dyn RelationSource = &relations;
        let _: &dyn HostRuntime = &host;
    }
}
