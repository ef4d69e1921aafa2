//! Loader for `operator.yaml` settings files.
//!
//! Every field has a default, so an empty file yields the two-relation
//! topology (database + NRF). Validation runs after parsing so that a
//! topology the renderer cannot satisfy is rejected before any event is
//! handled.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{OperatorError, Result};
use crate::types::config::{OperatorSettings, PeerRole};

/// Load settings from a YAML file.
pub fn load(path: &Path) -> Result<OperatorSettings> {
    let content =
        std::fs::read_to_string(path).map_err(|e| OperatorError::io(path, e))?;
    parse(&content)
}

/// Parse and validate settings from a YAML string.
pub fn parse(content: &str) -> Result<OperatorSettings> {
    let settings: OperatorSettings = if content.trim().is_empty() {
        OperatorSettings::default()
    } else {
        serde_yaml::from_str(content)?
    };
    validate(&settings)?;
    Ok(settings)
}

/// Check that the declared topology can feed the config renderer.
pub fn validate(settings: &OperatorSettings) -> Result<()> {
    if settings.app_name.is_empty() || settings.model_name.is_empty() {
        return Err(OperatorError::Settings(
            "app_name and model_name must not be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for dep in &settings.dependencies {
        if dep.relation.is_empty() {
            return Err(OperatorError::Settings("relation name must not be empty".into()));
        }
        if !seen.insert(dep.relation.as_str()) {
            return Err(OperatorError::Settings(format!(
                "relation '{}' declared twice",
                dep.relation
            )));
        }
    }

    for role in [PeerRole::Database, PeerRole::Nrf, PeerRole::Upf] {
        let count = settings.dependencies.iter().filter(|d| d.role == role).count();
        let required = role != PeerRole::Upf;
        if count > 1 || (required && count == 0) {
            return Err(OperatorError::Settings(format!(
                "expected {} {} dependency, found {}",
                if required { "exactly one" } else { "at most one" },
                role,
                count
            )));
        }
    }

    if settings.dependency(PeerRole::Upf).is_none() && settings.upf_node.is_empty() {
        return Err(OperatorError::Settings(
            "upf_node is required when no UPF relation is declared".into(),
        ));
    }

    if settings.retry.base_delay_ms == 0 {
        return Err(OperatorError::Settings("retry.base_delay_ms must be positive".into()));
    }

    Ok(())
}
