use serde::{Deserialize, Serialize};

/// Lifecycle and relation events delivered to the operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The unit was installed. Declares ports and writes the routing file.
    Install,
    /// The workload container's supervisor is reachable (pebble-ready).
    WorkloadReady,
    /// A relation was established with a remote application.
    RelationJoined { relation: String },
    /// The database provider created our database. `uris` is a comma
    /// separated list whose first entry is authoritative.
    DatabaseCreated { relation: String, uris: String },
    /// A peer service published its URL.
    UrlAvailable { relation: String, url: String },
}

impl Event {
    /// Key used to de-duplicate deferred copies of this event.
    pub fn key(&self) -> String {
        match self {
            Event::Install => "install".to_string(),
            Event::WorkloadReady => "workload_ready".to_string(),
            Event::RelationJoined { relation } => format!("relation_joined:{}", relation),
            Event::DatabaseCreated { relation, .. } => format!("database_created:{}", relation),
            Event::UrlAvailable { relation, .. } => format!("url_available:{}", relation),
        }
    }

    /// The connection string this event delivers for `relation`, if it is the
    /// event that produced it.
    pub fn credential_for(&self, relation: &str) -> Option<&str> {
        match self {
            Event::DatabaseCreated { relation: r, uris } if r == relation => {
                uris.split(',').next().map(str::trim)
            }
            Event::UrlAvailable { relation: r, url } if r == relation => Some(url.as_str()),
            _ => None,
        }
    }

    /// Whether the event carries a freshly published connection string.
    pub fn carries_credentials(&self) -> bool {
        matches!(
            self,
            Event::DatabaseCreated { .. } | Event::UrlAvailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_distinguish_relations() {
        let a = Event::UrlAvailable { relation: "nrf".into(), url: "x".into() };
        let b = Event::UrlAvailable { relation: "upf".into(), url: "x".into() };
        let c = Event::UrlAvailable { relation: "nrf".into(), url: "y".into() };
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), c.key());
    }

    #[test]
    fn database_created_first_uri_wins() {
        let event = Event::DatabaseCreated {
            relation: "database".into(),
            uris: "1.9.7.4:1234,5.6.7.8:1111".into(),
        };
        assert_eq!(event.credential_for("database"), Some("1.9.7.4:1234"));
        assert_eq!(event.credential_for("nrf"), None);
    }

    #[test]
    fn only_credential_events_carry_credentials() {
        assert!(!Event::WorkloadReady.carries_credentials());
        assert!(!Event::RelationJoined { relation: "nrf".into() }.carries_credentials());
        assert!(Event::UrlAvailable { relation: "nrf".into(), url: "u".into() }
            .carries_credentials());
    }

    #[test]
    fn event_serde_tagged() {
        let event = Event::RelationJoined { relation: "database".into() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"relation_joined\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
