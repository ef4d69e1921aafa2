//! Host runtime backed by hook tools.
//!
//! Every call becomes one hook-tool invocation through a `CommandRunner`:
//! `unit-get private-address`, `status-set`, `open-port` and `relation-set`
//! on the metrics relation.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::runner::CommandRunner;
use super::HostRuntime;
use crate::error::{OperatorError, Result};
use crate::types::plan::{Protocol, ScrapeJob, ServicePort};
use crate::types::status::UnitStatus;

/// Relation on which scrape jobs are published.
pub const METRICS_RELATION: &str = "metrics-endpoint";

pub struct HookToolHost<R: CommandRunner> {
    runner: R,
    /// Fixed address that bypasses `unit-get`, for local runs.
    pod_ip_override: Option<Ipv4Addr>,
}

impl<R: CommandRunner> HookToolHost<R> {
    pub fn new(runner: R) -> Self {
        HookToolHost {
            runner,
            pod_ip_override: None,
        }
    }

    pub fn with_pod_ip(runner: R, pod_ip: Ipv4Addr) -> Self {
        HookToolHost {
            runner,
            pod_ip_override: Some(pod_ip),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> HostRuntime for HookToolHost<R> {
    fn pod_ip(&self) -> Result<Ipv4Addr> {
        if let Some(ip) = self.pod_ip_override {
            return Ok(ip);
        }
        let out = self.runner.run("unit-get", &["private-address"])?;
        let trimmed = out.trim();
        trimmed.parse::<Ipv4Addr>().map_err(|e| {
            OperatorError::Unavailable(format!("pod address '{}' is not IPv4: {}", trimmed, e))
        })
    }

    fn set_status(&mut self, status: &UnitStatus) -> Result<()> {
        info!(status = status.name(), message = status.message(), "setting unit status");
        let name = status.name();
        let args: Vec<&str> = if status.message().is_empty() {
            vec![name]
        } else {
            vec![name, status.message()]
        };
        self.runner.run("status-set", &args)?;
        Ok(())
    }

    fn open_ports(&mut self, ports: &[ServicePort]) -> Result<()> {
        for port in ports {
            let proto = match port.protocol {
                Protocol::Tcp => "tcp",
                Protocol::Udp => "udp",
            };
            let port_arg = format!("{}/{}", port.port, proto);
            debug!(name = %port.name, port = %port_arg, "opening port");
            self.runner.run("open-port", &[port_arg.as_str()])?;
        }
        Ok(())
    }

    fn register_scrape_job(&mut self, job: &ScrapeJob) -> Result<()> {
        let jobs = serde_json::to_string(&[job])?;
        let setting = format!("scrape_jobs={}", jobs);
        self.runner
            .run("relation-set", &["-r", METRICS_RELATION, setting.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runner::MockRunner;

    #[test]
    fn pod_ip_parses_unit_get_output() {
        let host = HookToolHost::new(MockRunner::scripted(vec![Ok("1.1.3.4\n".into())]));
        assert_eq!(host.pod_ip().unwrap(), Ipv4Addr::new(1, 1, 3, 4));
        assert_eq!(host.runner().calls(), vec!["unit-get private-address"]);
    }

    #[test]
    fn pod_ip_rejects_non_ipv4() {
        let host = HookToolHost::new(MockRunner::scripted(vec![Ok("fe80::1".into())]));
        assert!(host.pod_ip().unwrap_err().is_retryable());
    }

    #[test]
    fn pod_ip_override_skips_runner() {
        let host = HookToolHost::with_pod_ip(MockRunner::new(), Ipv4Addr::new(8, 7, 6, 5));
        assert_eq!(host.pod_ip().unwrap(), Ipv4Addr::new(8, 7, 6, 5));
        assert!(host.runner().calls().is_empty());
    }

    #[test]
    fn status_set_quotes_message() {
        let mut host = HookToolHost::new(MockRunner::new());
        host.set_status(&UnitStatus::blocked("Waiting for NRF relation to be created"))
            .unwrap();
        host.set_status(&UnitStatus::Active).unwrap();
        assert_eq!(
            host.runner().calls(),
            vec![
                "status-set blocked 'Waiting for NRF relation to be created'",
                "status-set active",
            ]
        );
    }

    #[test]
    fn open_ports_one_call_per_port() {
        let mut host = HookToolHost::new(MockRunner::new());
        host.open_ports(&[ServicePort::udp("pfcp", 8805), ServicePort::tcp("sbi", 29502)])
            .unwrap();
        assert_eq!(
            host.runner().calls(),
            vec!["open-port 8805/udp", "open-port 29502/tcp"]
        );
    }

    #[test]
    fn scrape_job_published_on_metrics_relation() {
        let mut host = HookToolHost::new(MockRunner::new());
        host.register_scrape_job(&ScrapeJob::all_units(9089)).unwrap();
        let cmds = host.runner().calls();
        assert!(cmds[0].starts_with("relation-set -r metrics-endpoint "));
        assert!(cmds[0].contains("*:9089"));
    }
}
