//! Field type registry.

use crate::codec::FieldCodec;
use crate::handlers::StandardCodec;
use ironmodel_core::FieldType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps field type identifiers to codecs.
///
/// Populated before parsing starts and read-only afterwards.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    codecs: HashMap<String, Arc<dyn FieldCodec>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Creates a registry holding codecs for every standard field type.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for field_type in FieldType::ALL {
            registry.register(field_type.identifier(), StandardCodec::for_type(field_type));
        }
        tracing::debug!(types = registry.len(), "standard field types registered");
        registry
    }

    /// Registers a codec, replacing any codec under the same identifier.
    pub fn register<C: FieldCodec + 'static>(&mut self, type_name: impl Into<String>, codec: C) {
        let type_name = type_name.into();
        if self.codecs.insert(type_name.clone(), Arc::new(codec)).is_some() {
            tracing::warn!("Replacing codec for field type {}", type_name);
        }
    }

    /// Returns the codec for a type identifier.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn FieldCodec>> {
        self.codecs.get(type_name)
    }

    /// Returns true if a codec is registered for the identifier.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.codecs.contains_key(type_name)
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered codecs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("zope.schema.Int").is_none());
    }

    #[test]
    fn test_standard_registry() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.len(), FieldType::ALL.len());
        assert!(registry.contains("zope.schema.TextLine"));
        assert!(registry.contains("zope.schema.Choice"));
        assert!(!registry.contains("zope.schema.Nope"));
        let names = registry.names();
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_register_custom_identifier() {
        let mut registry = TypeRegistry::new();
        registry.register(
            "example.Rating",
            StandardCodec::for_type(FieldType::Int).with_identifier("example.Rating"),
        );
        assert!(registry.contains("example.Rating"));
        assert_eq!(registry.names(), vec!["example.Rating"]);
    }
}
