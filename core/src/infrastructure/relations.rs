//! Static relation table.
//!
//! Serves a fixed set of relations and their published data. Used by tests
//! and by `smfctl event`, which loads the table from a YAML file shaped as
//! `relation-name: {key: value, ...}`.

use std::collections::BTreeMap;
use std::path::Path;

use super::RelationSource;
use crate::error::{OperatorError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRelations {
    relations: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a relation table from YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| OperatorError::io(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let relations: BTreeMap<String, Option<BTreeMap<String, String>>> =
            serde_yaml::from_str(content)?;
        Ok(StaticRelations {
            relations: relations
                .into_iter()
                .map(|(name, data)| (name, data.unwrap_or_default()))
                .collect(),
        })
    }

    /// Establish a relation with no published data.
    pub fn join(&mut self, name: &str) {
        self.relations.entry(name.to_string()).or_default();
    }

    /// Publish a key on a relation, establishing it if needed.
    pub fn publish(&mut self, name: &str, key: &str, value: &str) {
        self.relations
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn depart(&mut self, name: &str) {
        self.relations.remove(name);
    }
}

impl RelationSource for StaticRelations {
    fn relation_exists(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    fn relation_data(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.relations.get(name).cloned()
    }
}
