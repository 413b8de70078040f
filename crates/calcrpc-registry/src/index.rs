use calcrpc_common::config::{Config, Endpoint};
use calcrpc_common::{OpCode, ServerRole};

/// One operation server known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub operations: Vec<OpCode>,
    pub endpoint: Endpoint,
}

impl RegistryEntry {
    pub fn new(name: impl Into<String>, operations: Vec<OpCode>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            operations,
            endpoint,
        }
    }

    /// Entry for a configured server role.
    pub fn for_role(role: ServerRole, endpoint: Endpoint) -> Self {
        Self::new(role.name(), role.operations().to_vec(), endpoint)
    }

    pub fn serves(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| op.as_str() == operation)
    }
}

/// Static, ordered list of operation servers.
///
/// Entries may share operations; resolution returns the first entry in
/// registration order that lists the operation.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    entries: Vec<RegistryEntry>,
}

impl RegistryIndex {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Registers every server role of `config`, in role order.
    pub fn from_config(config: &Config) -> Self {
        let entries = ServerRole::ALL
            .iter()
            .map(|role| RegistryEntry::for_role(*role, config.endpoint(*role).clone()))
            .collect();
        Self::new(entries)
    }

    /// Linear scan for the first entry serving `operation`.
    pub fn resolve(&self, operation: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.serves(operation))
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_registers_three_roles() {
        let index = RegistryIndex::from_config(&Config::default());
        let names: Vec<&str> = index.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["arithmetic", "number_theory", "news"]);
    }

    #[test]
    fn test_every_opcode_resolves() {
        let index = RegistryIndex::from_config(&Config::default());
        for op in OpCode::ALL {
            assert!(index.resolve(op.as_str()).is_some(), "{} did not resolve", op);
        }

        assert_eq!(index.resolve("fat").unwrap().endpoint.port, 7002);
        assert_eq!(index.resolve("news").unwrap().endpoint.port, 7003);
    }

    #[test]
    fn test_unknown_operation_does_not_resolve() {
        let index = RegistryIndex::from_config(&Config::default());
        assert!(index.resolve("pow").is_none());
        assert!(index.resolve("").is_none());
        assert!(index.resolve("SUM").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let index = RegistryIndex::new(vec![
            RegistryEntry::new(
                "primary",
                vec![OpCode::Sum],
                Endpoint::new("10.0.0.1", 7001),
            ),
            RegistryEntry::new(
                "shadow",
                vec![OpCode::Sum, OpCode::Sub],
                Endpoint::new("10.0.0.2", 7001),
            ),
        ]);

        for _ in 0..3 {
            assert_eq!(index.resolve("sum").unwrap().name, "primary");
        }
        assert_eq!(index.resolve("sub").unwrap().name, "shadow");
    }

    #[test]
    fn test_empty_index() {
        let index = RegistryIndex::default();
        assert!(index.is_empty());
        assert!(index.resolve("sum").is_none());
    }
}
