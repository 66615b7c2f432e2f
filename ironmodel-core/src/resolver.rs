//! Dotted-name resolution.
//!
//! Models refer to live objects (base schemas, invariants, default
//! factories, vocabulary sources) by dotted name. A [`Resolver`] maps those
//! names to objects; [`SymbolTable`] is the in-memory implementation.

use crate::field::DefaultFactory;
use crate::schema::{Invariant, Schema};
use crate::vocabulary::Vocabulary;
use std::collections::HashMap;
use std::sync::Arc;

/// An object a dotted name resolved to.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A schema, usable as a base or as an interface-field value.
    Schema(Arc<Schema>),
    /// An invariant.
    Invariant(Invariant),
    /// A default factory.
    DefaultFactory(DefaultFactory),
    /// A fixed vocabulary used as a choice source.
    Vocabulary(Vocabulary),
    /// A programmatic vocabulary source.
    Source,
    /// Any other object.
    Object,
}

impl Resolved {
    /// Short description of the object kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::Invariant(_) => "invariant",
            Self::DefaultFactory(_) => "default factory",
            Self::Vocabulary(_) => "vocabulary",
            Self::Source => "vocabulary source",
            Self::Object => "object",
        }
    }
}

/// Resolves dotted names.
pub trait Resolver: Send + Sync {
    /// Looks up `identifier`.
    fn resolve(&self, identifier: &str) -> Option<Resolved>;
}

/// In-memory name table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, Resolved>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object under `identifier`, replacing any previous one.
    pub fn register(&mut self, identifier: impl Into<String>, object: Resolved) {
        self.entries.insert(identifier.into(), object);
    }

    /// Registers a schema under its own identifier.
    pub fn register_schema(&mut self, schema: Arc<Schema>) {
        let identifier = schema.identifier();
        self.register(identifier, Resolved::Schema(schema));
    }

    /// Registers an invariant under its identifier.
    pub fn register_invariant(&mut self, invariant: Invariant) {
        let identifier = invariant.identifier.clone();
        self.register(identifier, Resolved::Invariant(invariant));
    }

    /// Registers a default factory under its identifier.
    pub fn register_default_factory(&mut self, factory: DefaultFactory) {
        let identifier = factory.identifier.clone();
        self.register(identifier, Resolved::DefaultFactory(factory));
    }

    /// Returns true if `identifier` is registered.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for SymbolTable {
    fn resolve(&self, identifier: &str) -> Option<Resolved> {
        if identifier == crate::schema::ROOT_SCHEMA {
            return Some(Resolved::Schema(Schema::root()));
        }
        self.entries.get(identifier).cloned()
    }
}
