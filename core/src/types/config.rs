use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Fixed,
}

/// What a required peer contributes to the rendered configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PeerRole {
    /// Database provider; publishes a comma separated `uris` list.
    Database,
    /// Network repository function; publishes a single `url`.
    Nrf,
    /// User plane function; publishes a single `url`.
    Upf,
}

impl PeerRole {
    /// Relation data key holding this peer's connection string.
    pub fn credential_key(self) -> &'static str {
        match self {
            PeerRole::Database => "uris",
            PeerRole::Nrf | PeerRole::Upf => "url",
        }
    }

    /// Message reported while the peer's connection string is missing.
    pub fn waiting_message(self) -> String {
        match self {
            PeerRole::Database => "Waiting for database to be available".to_string(),
            other => format!("Waiting for {} data to be available", other),
        }
    }
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerRole::Database => write!(f, "database"),
            PeerRole::Nrf => write!(f, "NRF"),
            PeerRole::Upf => write!(f, "UPF"),
        }
    }
}

/// One upstream relation the operator requires before it can configure the
/// workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    pub relation: String,
    pub role: PeerRole,
}

impl Dependency {
    pub fn new(relation: &str, role: PeerRole) -> Self {
        Dependency {
            relation: relation.to_string(),
            role,
        }
    }
}

/// Retry settings for deferred events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_strategy")]
    pub backoff_strategy: BackoffStrategy,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    10
}

fn default_backoff_strategy() -> BackoffStrategy {
    BackoffStrategy::Exponential
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_retries: default_max_retries(),
            backoff_strategy: default_backoff_strategy(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Operator settings, normally loaded from `operator.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatorSettings {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<Dependency>,
    /// UPF node id written into the user-plane topology when no UPF relation
    /// is declared.
    #[serde(default = "default_upf_node")]
    pub upf_node: String,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_app_name() -> String {
    "smf".to_string()
}

fn default_model_name() -> String {
    "sdcore".to_string()
}

fn default_dependencies() -> Vec<Dependency> {
    vec![
        Dependency::new("database", PeerRole::Database),
        Dependency::new("nrf", PeerRole::Nrf),
    ]
}

fn default_upf_node() -> String {
    "upf".to_string()
}

impl Default for OperatorSettings {
    fn default() -> Self {
        OperatorSettings {
            app_name: default_app_name(),
            model_name: default_model_name(),
            dependencies: default_dependencies(),
            upf_node: default_upf_node(),
            retry: RetrySettings::default(),
        }
    }
}

impl OperatorSettings {
    /// Settings for the three-relation topology (database, NRF and UPF).
    pub fn with_upf() -> Self {
        let mut settings = OperatorSettings::default();
        settings
            .dependencies
            .push(Dependency::new("upf", PeerRole::Upf));
        settings
    }

    /// The dependency playing `role`, if the topology declares one.
    pub fn dependency(&self, role: PeerRole) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.role == role)
    }

    /// Fully qualified in-cluster service hostname.
    pub fn hostname(&self) -> String {
        format!("{}.{}.svc.cluster.local", self.app_name, self.model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_strategy_serde() {
        let json = serde_json::to_string(&BackoffStrategy::Exponential).unwrap();
        assert_eq!(json, "\"exponential\"");
    }

    #[test]
    fn default_topology_is_database_and_nrf() {
        let settings = OperatorSettings::default();
        let roles: Vec<PeerRole> = settings.dependencies.iter().map(|d| d.role).collect();
        assert_eq!(roles, vec![PeerRole::Database, PeerRole::Nrf]);
        assert!(settings.dependency(PeerRole::Upf).is_none());
    }

    #[test]
    fn with_upf_adds_third_dependency() {
        let settings = OperatorSettings::with_upf();
        assert_eq!(settings.dependencies.len(), 3);
        assert_eq!(settings.dependency(PeerRole::Upf).unwrap().relation, "upf");
    }

    #[test]
    fn hostname_uses_app_and_model() {
        let settings = OperatorSettings {
            app_name: "smf-a".into(),
            model_name: "core".into(),
            ..OperatorSettings::default()
        };
        assert_eq!(settings.hostname(), "smf-a.core.svc.cluster.local");
    }

    #[test]
    fn role_messages_name_the_peer() {
        assert_eq!(
            PeerRole::Database.waiting_message(),
            "Waiting for database to be available"
        );
        assert_eq!(
            PeerRole::Nrf.waiting_message(),
            "Waiting for NRF data to be available"
        );
        assert_eq!(PeerRole::Upf.credential_key(), "url");
        assert_eq!(PeerRole::Database.credential_key(), "uris");
    }
}
