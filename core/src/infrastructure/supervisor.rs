//! In-process model of a layered process supervisor.
//!
//! Layers are kept in insertion order and merged into a single plan. Replan
//! compares the plan with what is running and reports starts, restarts and
//! stops. Both the mock and the directory-backed workloads delegate here so
//! they share one set of merge rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{OperatorError, Result};
use crate::types::plan::{Layer, Override, Service, ServiceChange, Startup};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct LabeledLayer {
    label: String,
    layer: Layer,
}

/// Layers plus the set of services currently running.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisorState {
    layers: Vec<LabeledLayer>,
    running: BTreeMap<String, Service>,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<()> {
        match self.layers.iter_mut().find(|l| l.label == label) {
            Some(existing) if combine => {
                combine_layer(&mut existing.layer, layer);
                Ok(())
            }
            Some(_) => Err(OperatorError::Invariant(format!(
                "layer '{}' already exists",
                label
            ))),
            None => {
                self.layers.push(LabeledLayer {
                    label: label.to_string(),
                    layer: layer.clone(),
                });
                Ok(())
            }
        }
    }

    /// All layers merged in order.
    pub fn plan(&self) -> Layer {
        let mut merged = Layer::default();
        for labeled in &self.layers {
            combine_layer(&mut merged, &labeled.layer);
        }
        merged
    }

    pub fn replan(&mut self) -> Vec<ServiceChange> {
        let plan = self.plan();
        let mut changes = Vec::new();

        for (name, service) in &plan.services {
            if service.startup != Startup::Enabled {
                continue;
            }
            match self.running.get(name) {
                None => changes.push(ServiceChange::Started(name.clone())),
                Some(current) if current != service => {
                    changes.push(ServiceChange::Restarted(name.clone()))
                }
                Some(_) => {}
            }
        }

        for name in self.running.keys() {
            let still_enabled = plan
                .services
                .get(name)
                .map(|s| s.startup == Startup::Enabled)
                .unwrap_or(false);
            if !still_enabled {
                changes.push(ServiceChange::Stopped(name.clone()));
            }
        }

        self.running = plan
            .services
            .into_iter()
            .filter(|(_, s)| s.startup == Startup::Enabled)
            .collect();
        changes
    }

    pub fn running(&self) -> &BTreeMap<String, Service> {
        &self.running
    }
}

fn combine_layer(base: &mut Layer, other: &Layer) {
    if !other.summary.is_empty() {
        base.summary = other.summary.clone();
    }
    if !other.description.is_empty() {
        base.description = other.description.clone();
    }
    for (name, service) in &other.services {
        match (base.services.get_mut(name), service.override_) {
            (Some(existing), Override::Merge) => {
                if !service.command.is_empty() {
                    existing.command = service.command.clone();
                }
                existing.startup = service.startup;
                existing
                    .environment
                    .extend(service.environment.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => {
                base.services.insert(name.clone(), service.clone());
            }
        }
    }
}
