//! Catalog of registered neuron types

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{IrError, Result};
use crate::neuron_type::NeuronType;

/// Name-keyed store of neuron types.
///
/// Groups bind a type by cloning its `Arc`; a bound type can no longer be
/// removed from the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: BTreeMap<String, Arc<NeuronType>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its own name
    pub fn register(&mut self, ty: NeuronType) -> Result<Arc<NeuronType>> {
        if self.types.contains_key(ty.name()) {
            return Err(IrError::DuplicateType {
                name: ty.name().to_string(),
            });
        }
        let ty = Arc::new(ty);
        log::debug!(
            "Registered neuron type '{}' ({} state vars, {} synapse types, {} event sources)",
            ty.name(),
            ty.state_vars().len(),
            ty.synapse_types().len(),
            ty.event_source_count()
        );
        self.types.insert(ty.name().to_string(), Arc::clone(&ty));
        Ok(ty)
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Result<Arc<NeuronType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| IrError::TypeNotFound { name: name.to_string() })
    }

    /// Remove a type no group has bound
    pub fn unregister(&mut self, name: &str) -> Result<Arc<NeuronType>> {
        let ty = self
            .types
            .get(name)
            .ok_or_else(|| IrError::TypeNotFound { name: name.to_string() })?;

        let bindings = Arc::strong_count(ty) - 1;
        if bindings > 0 {
            return Err(IrError::TypeInUse {
                name: name.to_string(),
                groups: bindings,
            });
        }
        self.types
            .remove(name)
            .ok_or_else(|| IrError::TypeNotFound { name: name.to_string() })
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::stock;

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = Catalog::new();
        catalog.register(stock::regular().unwrap()).unwrap();
        assert!(catalog.contains("Regular"));
        assert_eq!(catalog.get("Regular").unwrap().name(), "Regular");
        assert_eq!(catalog.get("Bursting").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Regular"]);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut catalog = Catalog::new();
        catalog.register(stock::regular().unwrap()).unwrap();
        let err = catalog.register(stock::regular().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_bound_type_cannot_be_removed() {
        let mut catalog = Catalog::new();
        catalog.register(stock::regular().unwrap()).unwrap();

        let binding = catalog.get("Regular").unwrap();
        let err = catalog.unregister("Regular").unwrap_err();
        assert_eq!(err, IrError::TypeInUse { name: "Regular".into(), groups: 1 });

        drop(binding);
        catalog.unregister("Regular").unwrap();
        assert!(catalog.is_empty());
    }
}
