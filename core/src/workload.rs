//! Fixed facts about the SMF workload container.

use crate::types::plan::{ScrapeJob, ServicePort};

/// Container and supervisor service name.
pub const SERVICE_NAME: &str = "smf";

pub const BASE_CONFIG_PATH: &str = "/etc/smf";
pub const CONFIG_FILE_NAME: &str = "smfcfg.yaml";
pub const UE_ROUTING_FILE_NAME: &str = "uerouting.conf";

pub const DEFAULT_DATABASE_NAME: &str = "free5gc";
pub const SMF_DATABASE_NAME: &str = "sdcore_smf";

pub const PFCP_PORT: u16 = 8805;
pub const PROMETHEUS_PORT: u16 = 9089;
pub const SBI_PORT: u16 = 29502;

pub fn config_path() -> String {
    format!("{}/{}", BASE_CONFIG_PATH, CONFIG_FILE_NAME)
}

pub fn routing_path() -> String {
    format!("{}/{}", BASE_CONFIG_PATH, UE_ROUTING_FILE_NAME)
}

/// Ports exposed on the workload's service.
pub fn service_ports() -> Vec<ServicePort> {
    vec![
        ServicePort::udp("pfcp", PFCP_PORT),
        ServicePort::tcp("prometheus-exporter", PROMETHEUS_PORT),
        ServicePort::tcp("sbi", SBI_PORT),
    ]
}

pub fn scrape_job() -> ScrapeJob {
    ScrapeJob::all_units(PROMETHEUS_PORT)
}
