//! Parse and serialize configuration.

use crate::codec::FieldCodec;
use crate::error::ParseError;
use crate::metadata::{FieldMetadataHandler, SchemaMetadataHandler};
use crate::parser;
use crate::policy::{DEFAULT_POLICY, DefaultSchemaPolicy, SchemaPolicy};
use crate::registry::TypeRegistry;
use crate::serializer::{self, SerializeOptions};
use ironmodel_core::{Model, Resolver, SymbolTable};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything the parser and serializer look up while they run.
///
/// A context is built once with [`ModelContextBuilder`] and is immutable
/// afterwards, so it can be shared between threads.
#[derive(Clone)]
pub struct ModelContext {
    registry: TypeRegistry,
    resolver: Arc<dyn Resolver>,
    schema_handlers: Vec<Arc<dyn SchemaMetadataHandler>>,
    field_handlers: Vec<Arc<dyn FieldMetadataHandler>>,
    policies: HashMap<String, Arc<dyn SchemaPolicy>>,
}

impl ModelContext {
    /// Creates a builder starting from the standard field types.
    #[must_use]
    pub fn builder() -> ModelContextBuilder {
        ModelContextBuilder::new()
    }

    /// The field type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The dotted-name resolver.
    #[must_use]
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Schema metadata handlers in registration order.
    #[must_use]
    pub fn schema_handlers(&self) -> &[Arc<dyn SchemaMetadataHandler>] {
        &self.schema_handlers
    }

    /// Field metadata handlers in registration order.
    #[must_use]
    pub fn field_handlers(&self) -> &[Arc<dyn FieldMetadataHandler>] {
        &self.field_handlers
    }

    /// Looks up a schema policy.
    ///
    /// # Errors
    /// Returns `ParseError::UnknownPolicy` if no policy has that name.
    pub fn policy(&self, name: &str) -> Result<&dyn SchemaPolicy, ParseError> {
        self.policies
            .get(name)
            .map(|policy| &**policy)
            .ok_or_else(|| ParseError::UnknownPolicy {
                name: name.to_string(),
            })
    }

    /// Registered policy names, sorted.
    #[must_use]
    pub fn policy_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parses a model document with the default policy.
    ///
    /// # Errors
    /// See [`parser::parse_model`].
    pub fn parse(&self, xml: &str) -> Result<Model, ParseError> {
        parser::parse_model(xml, self)
    }

    /// Parses a model document, naming the source file and the policy.
    ///
    /// # Errors
    /// See [`parser::parse_model_with`].
    pub fn parse_with(
        &self,
        xml: &str,
        file_name: Option<&str>,
        policy: &str,
    ) -> Result<Model, ParseError> {
        parser::parse_model_with(xml, file_name, policy, self)
    }

    /// Serializes a model.
    ///
    /// # Errors
    /// See [`serializer::serialize_model`].
    pub fn serialize(&self, model: &Model, options: &SerializeOptions) -> Result<String, ParseError> {
        serializer::serialize_model(model, self, options)
    }
}

impl Default for ModelContext {
    fn default() -> Self {
        ModelContextBuilder::new().build()
    }
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("registry", &self.registry)
            .field("schema_handlers", &self.schema_handlers.len())
            .field("field_handlers", &self.field_handlers.len())
            .field("policies", &self.policy_names())
            .finish()
    }
}

/// Builder for configuring and creating a [`ModelContext`].
pub struct ModelContextBuilder {
    registry: TypeRegistry,
    resolver: Arc<dyn Resolver>,
    schema_handlers: Vec<Arc<dyn SchemaMetadataHandler>>,
    field_handlers: Vec<Arc<dyn FieldMetadataHandler>>,
    policies: HashMap<String, Arc<dyn SchemaPolicy>>,
}

impl ModelContextBuilder {
    /// Creates a builder with the standard field types, an empty symbol
    /// table and the default policy.
    #[must_use]
    pub fn new() -> Self {
        let mut policies: HashMap<String, Arc<dyn SchemaPolicy>> = HashMap::new();
        policies.insert(DEFAULT_POLICY.to_string(), Arc::new(DefaultSchemaPolicy));
        Self {
            registry: TypeRegistry::standard(),
            resolver: Arc::new(SymbolTable::new()),
            schema_handlers: Vec::new(),
            field_handlers: Vec::new(),
            policies,
        }
    }

    /// Replaces the whole type registry.
    #[must_use]
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers a codec for a field type identifier.
    #[must_use]
    pub fn register_type<C: FieldCodec + 'static>(
        mut self,
        type_name: impl Into<String>,
        codec: C,
    ) -> Self {
        self.registry.register(type_name, codec);
        self
    }

    /// Sets the dotted-name resolver.
    #[must_use]
    pub fn resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Sets a shared dotted-name resolver.
    #[must_use]
    pub fn shared_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Adds a schema metadata handler.
    #[must_use]
    pub fn schema_handler<H: SchemaMetadataHandler + 'static>(mut self, handler: H) -> Self {
        self.schema_handlers.push(Arc::new(handler));
        self
    }

    /// Adds a field metadata handler.
    #[must_use]
    pub fn field_handler<H: FieldMetadataHandler + 'static>(mut self, handler: H) -> Self {
        self.field_handlers.push(Arc::new(handler));
        self
    }

    /// Registers a schema policy, replacing any policy with the same name.
    #[must_use]
    pub fn policy<P: SchemaPolicy + 'static>(mut self, name: impl Into<String>, policy: P) -> Self {
        let name = name.into();
        if self.policies.insert(name.clone(), Arc::new(policy)).is_some() {
            tracing::debug!("Replacing schema policy '{}'", name);
        }
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> ModelContext {
        tracing::debug!(
            types = self.registry.len(),
            schema_handlers = self.schema_handlers.len(),
            field_handlers = self.field_handlers.len(),
            policies = self.policies.len(),
            "model context built"
        );
        ModelContext {
            registry: self.registry,
            resolver: self.resolver,
            schema_handlers: self.schema_handlers,
            field_handlers: self.field_handlers,
            policies: self.policies,
        }
    }
}

impl Default for ModelContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::StandardCodec;
    use crate::metadata::PrimaryFieldHandler;
    use crate::xml::Element;
    use ironmodel_core::{FieldType, Schema};

    struct PrefixPolicy;

    impl SchemaPolicy for PrefixPolicy {
        fn module(&self, _schema_name: &str, _document: &Element) -> String {
            "plugins".to_string()
        }

        fn bases(&self, _schema_name: &str, _document: &Element) -> Vec<Arc<Schema>> {
            Vec::new()
        }

        fn name(&self, schema_name: &str, _document: &Element) -> String {
            format!("I{schema_name}")
        }
    }

    #[test]
    fn test_default_context() {
        let ctx = ModelContext::default();
        assert_eq!(ctx.registry().len(), FieldType::ALL.len());
        assert!(ctx.schema_handlers().is_empty());
        assert!(ctx.field_handlers().is_empty());
        assert_eq!(ctx.policy_names(), vec![DEFAULT_POLICY]);
        assert!(ctx.resolver().resolve("nope.Nothing").is_none());
    }

    #[test]
    fn test_unknown_policy() {
        let ctx = ModelContext::default();
        assert!(matches!(
            ctx.policy("custom"),
            Err(ParseError::UnknownPolicy { name }) if name == "custom"
        ));
    }

    #[test]
    fn test_builder() {
        let ctx = ModelContext::builder()
            .register_type(
                "example.Rating",
                StandardCodec::for_type(FieldType::Int).with_identifier("example.Rating"),
            )
            .field_handler(PrimaryFieldHandler)
            .policy("plugins", PrefixPolicy)
            .build();

        assert!(ctx.registry().contains("example.Rating"));
        assert_eq!(ctx.field_handlers().len(), 1);
        let policy = ctx.policy("plugins").unwrap();
        assert_eq!(policy.name("Thing", &Element::new("model")), "IThing");
        assert_eq!(ctx.policy_names(), vec!["", "plugins"]);
    }
}
