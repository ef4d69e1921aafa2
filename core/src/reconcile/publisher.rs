//! Process plan construction and publication.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::error::Result;
use crate::infrastructure::Workload;
use crate::types::plan::{Layer, Override, Service, ServiceChange, Startup};
use crate::workload::{config_path, routing_path, PFCP_PORT, SERVICE_NAME};

/// Build the supervisor layer for the SMF service.
///
/// The routing file flag is only added once the file exists in the container.
pub fn build_plan(pod_ip: Ipv4Addr, with_routing: bool) -> Layer {
    let mut command = format!("./smf --smfcfg {}", config_path());
    if with_routing {
        command.push_str(&format!(" --uerouting {}", routing_path()));
    }

    let mut services = BTreeMap::new();
    services.insert(
        SERVICE_NAME.to_string(),
        Service {
            override_: Override::Replace,
            startup: Startup::Enabled,
            command,
            environment: environment(pod_ip),
        },
    );
    Layer {
        summary: "smf layer".to_string(),
        description: "pebble config layer for smf".to_string(),
        services,
    }
}

fn environment(pod_ip: Ipv4Addr) -> BTreeMap<String, String> {
    [
        ("GRPC_GO_LOG_VERBOSITY_LEVEL", "99".to_string()),
        ("GRPC_GO_LOG_SEVERITY_LEVEL", "info".to_string()),
        ("GRPC_TRACE", "all".to_string()),
        ("GRPC_VERBOSITY", "debug".to_string()),
        ("PFCP_PORT_UPF", PFCP_PORT.to_string()),
        ("POD_IP", pod_ip.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Result of one publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Whether the layer differed from the current plan and was added.
    pub layer_changed: bool,
    /// What replan did to running services.
    pub changes: Vec<ServiceChange>,
}

/// Merge `layer` into the supervisor and replan.
///
/// A layer whose services already match the current plan is not re-added.
/// Replan always runs, so a service that stopped is started again.
pub fn publish(workload: &mut dyn Workload, layer: &Layer) -> Result<PublishOutcome> {
    let current = workload.plan()?;
    let up_to_date = layer
        .services
        .iter()
        .all(|(name, service)| current.services.get(name) == Some(service));

    if !up_to_date {
        workload.add_layer(SERVICE_NAME, layer, true)?;
        debug!(label = SERVICE_NAME, "added supervisor layer");
    }

    let changes = workload.replan()?;
    if !changes.is_empty() {
        info!(?changes, "replanned workload services");
    }
    Ok(PublishOutcome {
        layer_changed: !up_to_date,
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockWorkload;

    #[test]
    fn plan_without_routing_file() {
        let layer = build_plan(Ipv4Addr::new(1, 1, 1, 1), false);
        let smf = &layer.services["smf"];
        assert_eq!(smf.command, "./smf --smfcfg /etc/smf/smfcfg.yaml");
        assert_eq!(smf.override_, Override::Replace);
        assert_eq!(smf.startup, Startup::Enabled);
    }

    #[test]
    fn plan_with_routing_file() {
        let layer = build_plan(Ipv4Addr::new(1, 1, 1, 1), true);
        assert_eq!(
            layer.services["smf"].command,
            "./smf --smfcfg /etc/smf/smfcfg.yaml --uerouting /etc/smf/uerouting.conf"
        );
    }

    #[test]
    fn plan_environment() {
        let layer = build_plan(Ipv4Addr::new(1, 2, 3, 4), false);
        let expected: BTreeMap<String, String> = [
            ("GRPC_GO_LOG_VERBOSITY_LEVEL", "99"),
            ("GRPC_GO_LOG_SEVERITY_LEVEL", "info"),
            ("GRPC_TRACE", "all"),
            ("GRPC_VERBOSITY", "debug"),
            ("PFCP_PORT_UPF", "8805"),
            ("POD_IP", "1.2.3.4"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(layer.services["smf"].environment, expected);
    }

    #[test]
    fn publish_starts_then_is_idempotent() {
        let mut workload = MockWorkload::new();
        let layer = build_plan(Ipv4Addr::new(1, 1, 1, 1), false);

        let first = publish(&mut workload, &layer).unwrap();
        assert!(first.layer_changed);
        assert_eq!(first.changes, vec![ServiceChange::Started("smf".into())]);

        let second = publish(&mut workload, &layer).unwrap();
        assert_eq!(second, PublishOutcome::default());
        assert_eq!(workload.layers_added.len(), 1);
    }

    #[test]
    fn publish_restarts_on_changed_command() {
        let mut workload = MockWorkload::new();
        publish(&mut workload, &build_plan(Ipv4Addr::new(1, 1, 1, 1), false)).unwrap();
        let outcome =
            publish(&mut workload, &build_plan(Ipv4Addr::new(1, 1, 1, 1), true)).unwrap();
        assert!(outcome.layer_changed);
        assert_eq!(outcome.changes, vec![ServiceChange::Restarted("smf".into())]);
    }

    #[test]
    fn publish_propagates_unreachable_supervisor() {
        let mut workload = MockWorkload::new();
        workload.supervisor_down = true;
        let err = publish(&mut workload, &build_plan(Ipv4Addr::LOCALHOST, false)).unwrap_err();
        assert!(err.is_retryable());
    }
}
