//! Host runtime for local runs without hook tools.
//!
//! Status changes and declarations are logged instead of sent anywhere. The
//! last status is kept so `smfctl event` can print it.

use std::net::Ipv4Addr;

use smf_operator_core::error::{OperatorError, Result};
use smf_operator_core::infrastructure::HostRuntime;
use smf_operator_core::types::plan::{ScrapeJob, ServicePort};
use smf_operator_core::types::status::UnitStatus;
use tracing::info;

pub struct LocalHost {
    pod_ip: Option<Ipv4Addr>,
    status: UnitStatus,
}

impl LocalHost {
    pub fn new(pod_ip: Option<Ipv4Addr>) -> Self {
        LocalHost {
            pod_ip,
            status: UnitStatus::Unknown,
        }
    }

    pub fn status(&self) -> &UnitStatus {
        &self.status
    }
}

impl HostRuntime for LocalHost {
    fn pod_ip(&self) -> Result<Ipv4Addr> {
        self.pod_ip
            .ok_or_else(|| OperatorError::Unavailable("no pod address given".into()))
    }

    fn set_status(&mut self, status: &UnitStatus) -> Result<()> {
        info!(status = status.name(), message = status.message(), "unit status");
        self.status = status.clone();
        Ok(())
    }

    fn open_ports(&mut self, ports: &[ServicePort]) -> Result<()> {
        for port in ports {
            info!(name = %port.name, port = port.port, protocol = ?port.protocol, "port declared");
        }
        Ok(())
    }

    fn register_scrape_job(&mut self, job: &ScrapeJob) -> Result<()> {
        info!(job = ?job, "scrape job declared");
        Ok(())
    }
}
