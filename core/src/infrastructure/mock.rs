//! Mock collaborators for testing.
//!
//! Records every side effect and provides controllable responses, making it
//! easy to write deterministic tests for the reconcile sequence.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::supervisor::SupervisorState;
use super::{HostRuntime, Workload};
use crate::error::{OperatorError, Result};
use crate::types::plan::{Layer, ScrapeJob, ServiceChange, ServicePort};
use crate::types::status::UnitStatus;

/// A test-double workload container with an in-memory filesystem.
pub struct MockWorkload {
    /// Whether `can_connect` answers true.
    pub connected: bool,
    /// When set, supervisor calls fail with `Unavailable` even if connected.
    pub supervisor_down: bool,
    /// Files currently present, keyed by absolute path.
    pub files: BTreeMap<String, String>,
    /// Every push, in order.
    pub pushes: Vec<String>,
    /// Every `add_layer` label, in order.
    pub layers_added: Vec<String>,
    pub supervisor: SupervisorState,
}

impl MockWorkload {
    pub fn new() -> Self {
        MockWorkload {
            connected: true,
            supervisor_down: false,
            files: BTreeMap::new(),
            pushes: Vec::new(),
            layers_added: Vec::new(),
            supervisor: SupervisorState::new(),
        }
    }

    /// A workload whose container is not reachable yet.
    pub fn disconnected() -> Self {
        MockWorkload {
            connected: false,
            ..Self::new()
        }
    }

    /// Pre-load a file.
    pub fn set_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    /// Forget recorded pushes and layer additions.
    pub fn clear_history(&mut self) {
        self.pushes.clear();
        self.layers_added.clear();
    }

    fn check_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(OperatorError::Unavailable("mock: container not connected".into()))
        }
    }

    fn check_supervisor(&self) -> Result<()> {
        self.check_connected()?;
        if self.supervisor_down {
            return Err(OperatorError::Unavailable("mock: supervisor down".into()));
        }
        Ok(())
    }
}

impl Default for MockWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl Workload for MockWorkload {
    fn can_connect(&self) -> bool {
        self.connected
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.check_connected()?;
        Ok(self.files.contains_key(path))
    }

    fn pull(&self, path: &str) -> Result<Option<String>> {
        self.check_connected()?;
        Ok(self.files.get(path).cloned())
    }

    fn push(&mut self, path: &str, content: &str) -> Result<()> {
        self.check_connected()?;
        self.files.insert(path.to_string(), content.to_string());
        self.pushes.push(path.to_string());
        Ok(())
    }

    fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<()> {
        self.check_supervisor()?;
        self.supervisor.add_layer(label, layer, combine)?;
        self.layers_added.push(label.to_string());
        Ok(())
    }

    fn plan(&self) -> Result<Layer> {
        self.check_supervisor()?;
        Ok(self.supervisor.plan())
    }

    fn replan(&mut self) -> Result<Vec<ServiceChange>> {
        self.check_supervisor()?;
        Ok(self.supervisor.replan())
    }
}

/// A test-double host runtime that records statuses and declarations.
pub struct MockHost {
    /// Address returned by `pod_ip`; `None` makes the lookup fail.
    pub pod_ip: Option<Ipv4Addr>,
    /// All statuses set, in order.
    pub statuses: Vec<UnitStatus>,
    pub ports: Vec<ServicePort>,
    pub scrape_jobs: Vec<ScrapeJob>,
}

impl MockHost {
    pub fn new(pod_ip: Ipv4Addr) -> Self {
        MockHost {
            pod_ip: Some(pod_ip),
            statuses: Vec::new(),
            ports: Vec::new(),
            scrape_jobs: Vec::new(),
        }
    }

    /// The most recently reported status.
    pub fn status(&self) -> UnitStatus {
        self.statuses.last().cloned().unwrap_or_default()
    }
}

impl HostRuntime for MockHost {
    fn pod_ip(&self) -> Result<Ipv4Addr> {
        self.pod_ip
            .ok_or_else(|| OperatorError::Unavailable("mock: no pod address".into()))
    }

    fn set_status(&mut self, status: &UnitStatus) -> Result<()> {
        self.statuses.push(status.clone());
        Ok(())
    }

    fn open_ports(&mut self, ports: &[ServicePort]) -> Result<()> {
        for port in ports {
            if !self.ports.contains(port) {
                self.ports.push(port.clone());
            }
        }
        Ok(())
    }

    fn register_scrape_job(&mut self, job: &ScrapeJob) -> Result<()> {
        if !self.scrape_jobs.contains(job) {
            self.scrape_jobs.push(job.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_records_and_stores() {
        let mut mock = MockWorkload::new();
        mock.push("/etc/smf/a", "x").unwrap();
        assert_eq!(mock.pushes, vec!["/etc/smf/a"]);
        assert!(mock.exists("/etc/smf/a").unwrap());
        assert_eq!(mock.pull("/etc/smf/a").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn disconnected_rejects_filesystem_calls() {
        let mut mock = MockWorkload::disconnected();
        assert!(!mock.can_connect());
        let err = mock.push("/etc/smf/a", "x").unwrap_err();
        assert!(err.is_retryable());
        assert!(mock.pushes.is_empty());
    }

    #[test]
    fn supervisor_down_fails_replan_only() {
        let mut mock = MockWorkload::new();
        mock.supervisor_down = true;
        assert!(mock.push("/etc/smf/a", "x").is_ok());
        assert!(mock.replan().unwrap_err().is_retryable());
    }

    #[test]
    fn clear_history() {
        let mut mock = MockWorkload::new();
        mock.push("/a", "1").unwrap();
        mock.clear_history();
        assert!(mock.pushes.is_empty());
        assert!(mock.exists("/a").unwrap());
    }

    #[test]
    fn host_records_status_and_ports() {
        let mut host = MockHost::new(Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(host.status(), UnitStatus::Unknown);
        host.set_status(&UnitStatus::Active).unwrap();
        assert_eq!(host.status(), UnitStatus::Active);

        let ports = [ServicePort::udp("pfcp", 8805)];
        host.open_ports(&ports).unwrap();
        host.open_ports(&ports).unwrap();
        assert_eq!(host.ports.len(), 1);
    }

    #[test]
    fn host_without_address_is_unavailable() {
        let mut host = MockHost::new(Ipv4Addr::LOCALHOST);
        host.pod_ip = None;
        assert!(host.pod_ip().unwrap_err().is_retryable());
    }
}
