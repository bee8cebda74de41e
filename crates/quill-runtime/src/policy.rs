//! Capability policy: which calls need which capability.

use std::collections::BTreeMap;

/// Maps a gated call name to the capability it requires.
///
/// Capability names are free-form dot-namespaced strings; the policy is
/// plain data handed to the executor at construction, so tests can
/// substitute their own.
#[derive(Debug, Clone, Default)]
pub struct CapabilityPolicy {
    rules: BTreeMap<String, String>,
}

impl CapabilityPolicy {
    /// An empty policy: no call is gated.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard effectful calls and their capabilities.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule("read_file", "io.read")
            .with_rule("write_file", "io.write")
            .with_rule("print", "io.stdout")
            .with_rule("read_line", "io.stdin")
            .with_rule("exit", "sys.exit")
    }

    /// Add a gating rule.
    pub fn with_rule(mut self, call: impl Into<String>, capability: impl Into<String>) -> Self {
        self.rules.insert(call.into(), capability.into());
        self
    }

    /// The capability required by `call`, if the call is gated.
    pub fn required_capability(&self, call: &str) -> Option<&str> {
        self.rules.get(call).map(String::as_str)
    }

    /// Returns `true` if the policy gates `call`.
    pub fn is_gated(&self, call: &str) -> bool {
        self.rules.contains_key(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules() {
        let policy = CapabilityPolicy::standard();
        assert_eq!(policy.required_capability("read_file"), Some("io.read"));
        assert_eq!(policy.required_capability("print"), Some("io.stdout"));
        assert_eq!(policy.required_capability("unknown_call"), None);
    }

    #[test]
    fn test_custom_rule_overrides() {
        let policy = CapabilityPolicy::standard().with_rule("print", "audit.stdout");
        assert_eq!(policy.required_capability("print"), Some("audit.stdout"));
    }
}
