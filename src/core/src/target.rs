//! Controller reference parsing.
//!
//! Parses explicit target references like `payments/Deployment/api` into
//! structured components.

use crate::error::{KrarError, Result};

/// Reference to a top-level workload controller.
///
/// Identity is the `(namespace, kind, name)` tuple; the derived ordering
/// keeps target sets deterministic in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerRef {
    /// Namespace the controller lives in
    pub namespace: String,
    /// Controller kind (e.g. "Deployment", "StatefulSet")
    pub kind: String,
    /// Controller name
    pub name: String,
}

impl ControllerRef {
    /// Create a reference from its components.
    pub fn new(
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Parse an explicit target reference of the form `namespace/Kind/name`.
    ///
    /// All three components must be non-empty.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let mut parts = reference.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(kind), Some(name), None)
                if !namespace.is_empty() && !kind.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(namespace, kind, name))
            }
            _ => Err(KrarError::InvalidReference {
                reference: reference.to_string(),
                message: "expected namespace/Kind/name".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ControllerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let r = ControllerRef::parse("payments/Deployment/api").unwrap();
        assert_eq!(r.namespace, "payments");
        assert_eq!(r.kind, "Deployment");
        assert_eq!(r.name, "api");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let r = ControllerRef::parse("  ns1/DaemonSet/agent ").unwrap();
        assert_eq!(r.namespace, "ns1");
    }

    #[test]
    fn test_parse_too_few_components() {
        assert!(ControllerRef::parse("ns1/Deployment").is_err());
        assert!(ControllerRef::parse("ns1").is_err());
        assert!(ControllerRef::parse("").is_err());
    }

    #[test]
    fn test_parse_too_many_components() {
        assert!(ControllerRef::parse("ns1/Deployment/api/extra").is_err());
    }

    #[test]
    fn test_parse_empty_component() {
        assert!(ControllerRef::parse("/Deployment/api").is_err());
        assert!(ControllerRef::parse("ns1//api").is_err());
        assert!(ControllerRef::parse("ns1/Deployment/").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let r = ControllerRef::new("ns1", "StatefulSet", "db");
        assert_eq!(ControllerRef::parse(&r.to_string()).unwrap(), r);
    }

    #[test]
    fn test_set_identity() {
        use std::collections::BTreeSet;

        let mut set = BTreeSet::new();
        set.insert(ControllerRef::new("ns1", "Deployment", "api"));
        set.insert(ControllerRef::new("ns1", "Deployment", "api"));
        set.insert(ControllerRef::new("ns2", "Deployment", "api"));
        assert_eq!(set.len(), 2);
    }
}
