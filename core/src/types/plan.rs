use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a service in a new layer combines with an existing definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    Merge,
    Replace,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Startup {
    Enabled,
    Disabled,
}

/// One supervised process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    #[serde(rename = "override")]
    pub override_: Override,
    pub startup: Startup,
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// A declarative set of services merged into the supervisor's plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Layer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl Layer {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// What the supervisor did to a service while replanning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", content = "service", rename_all = "snake_case")]
pub enum ServiceChange {
    Started(String),
    Restarted(String),
    Stopped(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A port exposed on the workload's Kubernetes service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl ServicePort {
    pub fn tcp(name: &str, port: u16) -> Self {
        ServicePort {
            name: name.to_string(),
            port,
            protocol: Protocol::Tcp,
        }
    }

    pub fn udp(name: &str, port: u16) -> Self {
        ServicePort {
            name: name.to_string(),
            port,
            protocol: Protocol::Udp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticConfig {
    pub targets: Vec<String>,
}

/// A metrics scrape job advertised to the monitoring stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeJob {
    pub static_configs: Vec<StaticConfig>,
}

impl ScrapeJob {
    /// Scrape every unit of the application on `port`.
    pub fn all_units(port: u16) -> Self {
        ScrapeJob {
            static_configs: vec![StaticConfig {
                targets: vec![format!("*:{}", port)],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_serializes_override_key() {
        let service = Service {
            override_: Override::Replace,
            startup: Startup::Enabled,
            command: "./smf".into(),
            environment: BTreeMap::new(),
        };
        let yaml = serde_yaml::to_string(&service).unwrap();
        assert!(yaml.contains("override: replace"));
        assert!(yaml.contains("startup: enabled"));
        assert!(!yaml.contains("environment"));
    }

    #[test]
    fn layer_yaml_round_trip() {
        let mut services = BTreeMap::new();
        services.insert(
            "smf".to_string(),
            Service {
                override_: Override::Replace,
                startup: Startup::Enabled,
                command: "./smf --smfcfg /etc/smf/smfcfg.yaml".into(),
                environment: BTreeMap::from([("POD_IP".to_string(), "1.1.1.1".to_string())]),
            },
        );
        let layer = Layer {
            summary: "smf layer".into(),
            description: "pebble config layer for smf".into(),
            services,
        };
        let yaml = layer.to_yaml().unwrap();
        let back: Layer = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn scrape_job_targets_all_units() {
        let job = ScrapeJob::all_units(9089);
        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(json, r#"{"static_configs":[{"targets":["*:9089"]}]}"#);
    }

    #[test]
    fn protocol_serializes_lowercase() {
        let port = ServicePort::udp("pfcp", 8805);
        let json = serde_json::to_string(&port).unwrap();
        assert!(json.contains("\"protocol\":\"udp\""));
    }
}
