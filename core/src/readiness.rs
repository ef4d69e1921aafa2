//! Readiness predicates and the fail-fast readiness assessment.
//!
//! The predicates are side-effect free queries against collaborators. `assess`
//! runs them in fixed priority order (relations, container, credentials) and
//! stops at the first one that fails, so a later check is never evaluated
//! while an earlier one is unmet.

use std::collections::BTreeMap;

use crate::infrastructure::{RelationSource, Workload};
use crate::types::config::{Dependency, PeerRole};
use crate::types::event::Event;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub fn relation_exists(relations: &dyn RelationSource, name: &str) -> bool {
    relations.relation_exists(name)
}

pub fn container_reachable(workload: &dyn Workload) -> bool {
    workload.can_connect()
}

/// The connection string a peer published, if non-empty. For a database the
/// first entry of the comma separated URI list is returned.
pub fn published_credential(relations: &dyn RelationSource, dep: &Dependency) -> Option<String> {
    let data = relations.relation_data(&dep.relation)?;
    let raw = data.get(dep.role.credential_key())?;
    let value = match dep.role {
        PeerRole::Database => raw.split(',').next().unwrap_or_default(),
        PeerRole::Nrf | PeerRole::Upf => raw.as_str(),
    };
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn credentials_available(relations: &dyn RelationSource, dep: &Dependency) -> bool {
    published_credential(relations, dep).is_some()
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Where a peer's connection string was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// The triggering event delivered it.
    Event,
    /// Point-in-time query of the relation data.
    Relation,
}

/// Connection strings for every required peer, keyed by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCredentials {
    entries: BTreeMap<PeerRole, (String, CredentialSource)>,
}

impl PeerCredentials {
    pub fn get(&self, role: PeerRole) -> Option<&str> {
        self.entries.get(&role).map(|(v, _)| v.as_str())
    }

    pub fn source(&self, role: PeerRole) -> Option<CredentialSource> {
        self.entries.get(&role).map(|(_, s)| *s)
    }

    fn insert(&mut self, role: PeerRole, value: String, source: CredentialSource) {
        self.entries.insert(role, (value, source));
    }
}

/// Outcome of the fail-fast readiness checks for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    MissingRelation(Dependency),
    ContainerUnreachable,
    MissingCredentials(Dependency),
    Ready(PeerCredentials),
}

/// Run the readiness checks for `event` in priority order.
///
/// A credential carried by the event itself is authoritative for the relation
/// that produced it; every other peer is read from the relation data.
pub fn assess(
    dependencies: &[Dependency],
    relations: &dyn RelationSource,
    workload: &dyn Workload,
    event: &Event,
) -> ReadinessState {
    if let Some(dep) = dependencies
        .iter()
        .find(|d| !relation_exists(relations, &d.relation))
    {
        return ReadinessState::MissingRelation(dep.clone());
    }

    if !container_reachable(workload) {
        return ReadinessState::ContainerUnreachable;
    }

    let mut credentials = PeerCredentials::default();
    for dep in dependencies {
        let from_event = event
            .credential_for(&dep.relation)
            .map(str::trim)
            .filter(|v| !v.is_empty());
        match from_event {
            Some(value) => credentials.insert(dep.role, value.to_string(), CredentialSource::Event),
            None => match published_credential(relations, dep) {
                Some(value) => credentials.insert(dep.role, value, CredentialSource::Relation),
                None => return ReadinessState::MissingCredentials(dep.clone()),
            },
        }
    }
    ReadinessState::Ready(credentials)
}
