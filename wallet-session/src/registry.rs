use std::collections::HashSet;
use std::sync::Arc;

use crate::adapter::{SharedAdapter, WalletAdapter};

/// Ordered, fixed list of the adapters an application offers.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<SharedAdapter>,
}

impl AdapterRegistry {
    /// Build a registry, keeping the first adapter for each distinct name.
    pub fn new(adapters: Vec<SharedAdapter>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            if seen.insert(adapter.name().to_string()) {
                unique.push(adapter);
            } else {
                log::warn!(
                    "Ignoring duplicate wallet adapter registration: {}",
                    adapter.name()
                );
            }
        }
        Self { adapters: unique }
    }

    pub fn adapters(&self) -> &[SharedAdapter] {
        &self.adapters
    }

    pub fn get(&self, name: &str) -> Option<&SharedAdapter> {
        self.adapters.iter().find(|adapter| adapter.name() == name)
    }

    pub fn contains(&self, adapter: &Arc<dyn WalletAdapter>) -> bool {
        self.adapters
            .iter()
            .any(|candidate| Arc::ptr_eq(candidate, adapter))
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| adapter.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ReadyState;
    use crate::testing::MockAdapter;

    #[test]
    fn empty_registry_is_valid() {
        let registry = AdapterRegistry::new(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.get("Petra").is_none());
    }

    #[test]
    fn keeps_order_and_drops_duplicate_names() {
        let first = MockAdapter::new("Petra", ReadyState::Installed).shared();
        let registry = AdapterRegistry::new(vec![
            first.clone(),
            MockAdapter::new("Martian", ReadyState::Loadable).shared(),
            MockAdapter::new("Petra", ReadyState::NotDetected).shared(),
        ]);

        assert_eq!(registry.names(), vec!["Petra", "Martian"]);
        assert!(registry.contains(&first));
        assert_eq!(
            registry.get("Petra").map(|adapter| adapter.ready_state()),
            Some(ReadyState::Installed)
        );
    }
}
