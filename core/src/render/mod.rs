//! Workload configuration rendering.
//!
//! `render` turns a `RenderInputs` into the exact text of `smfcfg.yaml`. Most
//! of the document is static: network slice info, per-module log levels and
//! the user-plane topology never change. Only the NRF URI, database URL and
//! name, pod address, service hostname and UPF node are substituted.
//!
//! The routing file is fully static and is exposed as `UE_ROUTING`.

pub mod template;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::Result;
use crate::workload::{DEFAULT_DATABASE_NAME, SMF_DATABASE_NAME};

const SMFCFG_TEMPLATE: &str = include_str!("../../templates/smfcfg.yaml.tmpl");

/// Static UE routing file, copied verbatim into the container.
pub const UE_ROUTING: &str = include_str!("../../templates/uerouting.yaml");

/// Validated values substituted into the config template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInputs {
    /// First entry of the database provider's URI list.
    pub database_url: String,
    pub nrf_url: String,
    /// UPF node id: the UPF relation's URL, or the static node name.
    pub upf_node: String,
    pub pod_ip: Ipv4Addr,
    pub hostname: String,
}

/// Rendered `smfcfg.yaml` contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig(String);

impl RenderedConfig {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Render `smfcfg.yaml`.
///
/// Fails with `OperatorError::Invariant` if any input is empty; the
/// reconciler's readiness gates are expected to rule that out.
pub fn render(inputs: &RenderInputs) -> Result<RenderedConfig> {
    let mut values = BTreeMap::new();
    values.insert("database_url", inputs.database_url.clone());
    values.insert("nrf_url", inputs.nrf_url.clone());
    values.insert("upf_node", inputs.upf_node.clone());
    values.insert("pod_ip", inputs.pod_ip.to_string());
    values.insert("smf_hostname", inputs.hostname.clone());
    values.insert("default_database_name", DEFAULT_DATABASE_NAME.to_string());
    values.insert("smf_database_name", SMF_DATABASE_NAME.to_string());

    let mut text = template::substitute(SMFCFG_TEMPLATE, &values)?;
    // The workload's reference rendering has no trailing newline.
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(RenderedConfig(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperatorError;

    fn inputs() -> RenderInputs {
        RenderInputs {
            database_url: "1.9.7.4:1234".into(),
            nrf_url: "2.2.2.2".into(),
            upf_node: "upf".into(),
            pod_ip: Ipv4Addr::new(1, 1, 3, 4),
            hostname: "smf.sdcore.svc.cluster.local".into(),
        }
    }

    fn field<'a>(doc: &'a serde_yaml::Value, path: &[&str]) -> &'a serde_yaml::Value {
        path.iter().fold(doc, |v, key| &v[*key])
    }

    #[test]
    fn substituted_fields() {
        let rendered = render(&inputs()).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(rendered.as_str()).unwrap();
        assert_eq!(field(&doc, &["configuration", "nrfUri"]).as_str(), Some("2.2.2.2"));
        assert_eq!(
            field(&doc, &["configuration", "mongodb", "url"]).as_str(),
            Some("1.9.7.4:1234")
        );
        assert_eq!(
            field(&doc, &["configuration", "mongodb", "name"]).as_str(),
            Some("free5gc")
        );
        assert_eq!(
            field(&doc, &["configuration", "pfcp", "addr"]).as_str(),
            Some("1.1.3.4")
        );
        assert_eq!(
            field(&doc, &["configuration", "sbi", "registerIPv4"]).as_str(),
            Some("smf.sdcore.svc.cluster.local")
        );
        assert_eq!(
            field(&doc, &["configuration", "smfDBName"]).as_str(),
            Some("sdcore_smf")
        );
    }

    #[test]
    fn whole_document_matches_reference() {
        let expected = include_str!("../../testdata/smfcfg.golden.yaml");
        assert_eq!(render(&inputs()).unwrap().as_str(), expected);
    }

    #[test]
    fn static_section_is_preserved() {
        let text = render(&inputs()).unwrap().into_string();
        assert!(text.starts_with("configuration:\n  debugProfilePort: 5001\n"));
        assert!(text.contains("      sd: \"010203\"\n      sst: 1\n"));
        assert!(text.contains("            mcc: \"208\"\n            mnc: \"93\"\n"));
        assert!(text.contains("        ipv6: 2001:4860:4860::8888\n"));
        assert!(text.ends_with("  WEBUI:\n    ReportCaller: false\n    debugLevel: info"));

        let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let sd = field(&doc, &["configuration", "snssaiInfos"])[0]["sNssai"]["sd"].clone();
        assert_eq!(sd.as_str(), Some("010203"));
        assert_eq!(
            field(&doc, &["info", "description"]).as_str(),
            Some("SMF initial local configuration")
        );
    }

    #[test]
    fn exact_mongodb_and_pfcp_lines() {
        let text = render(&inputs()).unwrap().into_string();
        assert!(text.contains("  mongodb:\n    name: free5gc\n    url: 1.9.7.4:1234\n"));
        assert!(text.contains("  nrfUri: 2.2.2.2\n  pfcp:\n    addr: 1.1.3.4\n"));
    }

    #[test]
    fn upf_node_feeds_topology() {
        let mut i = inputs();
        i.upf_node = "upf-0.upf-endpoints".into();
        let text = render(&i).unwrap().into_string();
        assert!(text.contains("          - upf-0.upf-endpoints\n"));
        assert!(text.contains("        node_id: upf-0.upf-endpoints\n"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(render(&inputs()).unwrap(), render(&inputs()).unwrap());
    }

    #[test]
    fn empty_input_is_fatal() {
        let mut i = inputs();
        i.nrf_url.clear();
        let err = render(&i).unwrap_err();
        assert!(matches!(err, OperatorError::Invariant(_)));
    }

    #[test]
    fn routing_file_is_yaml() {
        let doc: serde_yaml::Value = serde_yaml::from_str(UE_ROUTING).unwrap();
        assert!(doc["ueRoutingInfo"].is_mapping());
    }
}
