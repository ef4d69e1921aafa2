//! Minimal `{{ name }}` substitution.
//!
//! Values are inserted verbatim: no escaping, no filters. Every placeholder
//! must have a non-empty value and every supplied value must be used, so a
//! typo on either side fails loudly instead of producing a config the
//! workload would misparse.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{OperatorError, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

pub fn substitute(template: &str, values: &BTreeMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut used = BTreeSet::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open.find(CLOSE).ok_or_else(|| {
            OperatorError::Invariant("unterminated placeholder in template".into())
        })?;
        let name = after_open[..end].trim();
        let value = values.get(name).ok_or_else(|| {
            OperatorError::Invariant(format!("no value for template placeholder '{}'", name))
        })?;
        if value.is_empty() {
            return Err(OperatorError::Invariant(format!(
                "template placeholder '{}' is empty",
                name
            )));
        }
        out.push_str(value);
        used.insert(name);
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);

    if let Some(unused) = values.keys().find(|k| !used.contains(**k)) {
        return Err(OperatorError::Invariant(format!(
            "template value '{}' is never used",
            unused
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn substitutes_all_occurrences() {
        let out = substitute("a: {{ x }}\nb: {{x}}\n", &values(&[("x", "1")])).unwrap();
        assert_eq!(out, "a: 1\nb: 1\n");
    }

    #[test]
    fn values_are_not_escaped() {
        let out = substitute("url: {{ u }}", &values(&[("u", "mongodb://a:b@c/?x=\"y\"")])).unwrap();
        assert_eq!(out, "url: mongodb://a:b@c/?x=\"y\"");
    }

    #[test]
    fn empty_value_is_invariant_violation() {
        let err = substitute("a: {{ x }}", &values(&[("x", "")])).unwrap_err();
        assert!(matches!(err, OperatorError::Invariant(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_value_fails() {
        assert!(substitute("a: {{ y }}", &values(&[])).is_err());
    }

    #[test]
    fn unused_value_fails() {
        assert!(substitute("a: 1", &values(&[("x", "1")])).is_err());
    }

    #[test]
    fn unterminated_placeholder_fails() {
        assert!(substitute("a: {{ x", &values(&[("x", "1")])).is_err());
    }
}
