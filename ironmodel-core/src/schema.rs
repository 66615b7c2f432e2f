//! Schemas, fieldsets and invariants.

use crate::error::{Error, Result};
use crate::field::Field;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Fieldset order used when none is given.
pub const DEFAULT_ORDER: i64 = 9999;

/// Identifier of the root marker schema every parsed schema extends.
pub const ROOT_SCHEMA: &str = "ironmodel.model.Schema";

/// Marker identifying a schema's primary field.
pub const PRIMARY_MARKER: &str = "ironmodel.interfaces.IPrimaryField";

static ROOT: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    let (module, name) = ROOT_SCHEMA.rsplit_once('.').unwrap_or(("", ROOT_SCHEMA));
    Arc::new(Schema::new(name, module))
});

/// Named group of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fieldset {
    /// Unique name within the schema.
    pub name: String,
    /// Display label; defaults to the name.
    pub label: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Sort key among fieldsets.
    pub order: i64,
    /// Field names in display order.
    pub fields: Vec<String>,
}

impl Fieldset {
    /// Creates an empty fieldset labelled with its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: Some(name.clone()),
            name,
            description: None,
            order: DEFAULT_ORDER,
            fields: Vec::new(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the order.
    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Sets the fields.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

type InvariantCheck = dyn Fn(&BTreeMap<String, Value>) -> std::result::Result<(), String> + Send + Sync;

/// Cross-field constraint attached to a schema.
#[derive(Clone)]
pub struct Invariant {
    /// Dotted name the invariant is registered under.
    pub identifier: String,
    check: Arc<InvariantCheck>,
}

impl Invariant {
    /// Wraps a check closure.
    pub fn new(
        identifier: impl Into<String>,
        check: impl Fn(&BTreeMap<String, Value>) -> std::result::Result<(), String>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            check: Arc::new(check),
        }
    }

    /// Runs the check against field data.
    ///
    /// # Errors
    /// Returns the invariant's failure message.
    pub fn check(&self, data: &BTreeMap<String, Value>) -> std::result::Result<(), String> {
        (self.check)(data)
    }
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Invariant").field(&self.identifier).finish()
    }
}

impl PartialEq for Invariant {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

/// A named set of fields with bases, tagged values, fieldsets and invariants.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    module: String,
    bases: Vec<Arc<Schema>>,
    fields: BTreeMap<String, Field>,
    tagged_values: BTreeMap<String, Value>,
    fieldsets: Vec<Fieldset>,
    invariants: Vec<Invariant>,
}

impl Schema {
    /// Creates an empty schema without bases.
    #[must_use]
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            bases: Vec::new(),
            fields: BTreeMap::new(),
            tagged_values: BTreeMap::new(),
            fieldsets: Vec::new(),
            invariants: Vec::new(),
        }
    }

    /// Returns the shared root marker schema.
    #[must_use]
    pub fn root() -> Arc<Schema> {
        Arc::clone(&ROOT)
    }

    /// Returns true for the root marker schema.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.identifier() == ROOT_SCHEMA
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module the schema lives in.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Dotted identifier, `module.name`.
    #[must_use]
    pub fn identifier(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }

    /// Returns true if both refer to the same schema.
    #[must_use]
    pub fn same_as(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other) || (self.name == other.name && self.module == other.module)
    }

    /// Direct bases in declaration order.
    #[must_use]
    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    /// Replaces the bases.
    pub fn set_bases(&mut self, bases: Vec<Arc<Schema>>) {
        self.bases = bases;
    }

    /// Appends a base.
    pub fn add_base(&mut self, base: Arc<Schema>) {
        self.bases.push(base);
    }

    /// Returns true if `other` is this schema or one of its ancestors.
    #[must_use]
    pub fn extends(&self, other: &Schema) -> bool {
        self.resolution_order().iter().any(|s| s.same_as(other))
    }

    /// Own field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Own field by name, mutably.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Field by name, searching bases in resolution order.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.resolution_order()
            .into_iter()
            .find_map(|schema| schema.fields.get(name))
    }

    /// Field by name, failing with [`Error::FieldNotFound`].
    ///
    /// # Errors
    /// Returns an error if neither the schema nor its bases define `name`.
    pub fn require(&self, name: &str) -> Result<&Field> {
        self.get(name).ok_or_else(|| Error::FieldNotFound {
            schema: self.identifier(),
            field: name.to_string(),
        })
    }

    /// Returns true if `name` is an own field.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Own fields keyed by name.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    /// Adds or replaces an own field, binding it to this schema.
    pub fn insert_field(&mut self, mut field: Field) {
        field.interface = Some(self.identifier());
        self.fields.insert(field.name().to_string(), field);
    }

    /// Removes an own field.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    /// Own fields sorted by creation order.
    #[must_use]
    pub fn fields_in_order(&self) -> Vec<&Field> {
        let mut fields: Vec<_> = self.fields.values().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    /// Own and inherited fields; nearer definitions win.
    #[must_use]
    pub fn all_fields(&self) -> BTreeMap<&str, &Field> {
        let mut all = BTreeMap::new();
        for schema in self.resolution_order().into_iter().rev() {
            for (name, field) in &schema.fields {
                all.insert(name.as_str(), field);
            }
        }
        all
    }

    /// Own and inherited field names sorted by creation order.
    #[must_use]
    pub fn names_in_order(&self) -> Vec<&str> {
        let mut fields: Vec<_> = self.all_fields().into_iter().collect();
        fields.sort_by_key(|(_, f)| f.order);
        fields.into_iter().map(|(name, _)| name).collect()
    }

    /// This schema followed by its ancestors in C3 order.
    ///
    /// Falls back to depth-first order when the hierarchy has no consistent
    /// linearisation.
    #[must_use]
    pub fn resolution_order(&self) -> Vec<&Schema> {
        let mut sequences: Vec<Vec<&Schema>> =
            self.bases.iter().map(|b| b.resolution_order()).collect();
        sequences.push(self.bases.iter().map(|b| &**b).collect());
        let mut order = vec![self];
        match c3_merge(sequences) {
            Some(merged) => order.extend(merged),
            None => {
                for base in &self.bases {
                    for schema in base.resolution_order() {
                        if !order.iter().any(|s| s.same_as(schema)) {
                            order.push(schema);
                        }
                    }
                }
            }
        }
        order
    }

    /// Own tagged value.
    #[must_use]
    pub fn tagged_value(&self, key: &str) -> Option<&Value> {
        self.tagged_values.get(key)
    }

    /// Tagged value searching bases in resolution order.
    #[must_use]
    pub fn query_tagged_value(&self, key: &str) -> Option<&Value> {
        self.resolution_order()
            .into_iter()
            .find_map(|schema| schema.tagged_values.get(key))
    }

    /// Sets an own tagged value.
    pub fn set_tagged_value(&mut self, key: impl Into<String>, value: Value) {
        self.tagged_values.insert(key.into(), value);
    }

    /// Own tagged values.
    #[must_use]
    pub fn tagged_values(&self) -> &BTreeMap<String, Value> {
        &self.tagged_values
    }

    /// Fieldsets in declaration order.
    #[must_use]
    pub fn fieldsets(&self) -> &[Fieldset] {
        &self.fieldsets
    }

    /// Fieldsets sorted by their `order`; ties keep declaration order.
    #[must_use]
    pub fn sorted_fieldsets(&self) -> Vec<&Fieldset> {
        let mut sorted: Vec<_> = self.fieldsets.iter().collect();
        sorted.sort_by_key(|f| f.order);
        sorted
    }

    /// Fieldset by name.
    #[must_use]
    pub fn fieldset(&self, name: &str) -> Option<&Fieldset> {
        self.fieldsets.iter().find(|f| f.name == name)
    }

    /// Replaces the fieldsets.
    pub fn set_fieldsets(&mut self, fieldsets: Vec<Fieldset>) {
        self.fieldsets = fieldsets;
    }

    /// Adds a fieldset, merging fields into an existing one of the same name.
    pub fn add_fieldset(&mut self, fieldset: Fieldset) {
        match self.fieldsets.iter_mut().find(|f| f.name == fieldset.name) {
            Some(existing) => {
                for name in fieldset.fields {
                    if !existing.fields.contains(&name) {
                        existing.fields.push(name);
                    }
                }
            }
            None => self.fieldsets.push(fieldset),
        }
    }

    /// Invariants in declaration order.
    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Appends an invariant.
    pub fn add_invariant(&mut self, invariant: Invariant) {
        self.invariants.push(invariant);
    }

    /// Replaces the invariants.
    pub fn set_invariants(&mut self, invariants: Vec<Invariant>) {
        self.invariants = invariants;
    }

    /// Runs every invariant of this schema and its bases.
    ///
    /// # Errors
    /// Returns every failure message, in resolution order.
    pub fn validate_invariants(
        &self,
        data: &BTreeMap<String, Value>,
    ) -> std::result::Result<(), Vec<String>> {
        let failures: Vec<String> = self
            .resolution_order()
            .into_iter()
            .flat_map(|schema| schema.invariants.iter())
            .filter_map(|invariant| invariant.check(data).err())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Marks the named own fields as primary.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] for the first unknown name; no field
    /// is marked in that case.
    pub fn mark_primary<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if let Some(missing) = names.iter().find(|n| !self.fields.contains_key(n.as_ref())) {
            return Err(Error::FieldNotFound {
                schema: self.identifier(),
                field: missing.as_ref().to_string(),
            });
        }
        for name in &names {
            if let Some(field) = self.fields.get_mut(name.as_ref()) {
                field.markers.insert(PRIMARY_MARKER.to_string());
            }
        }
        Ok(())
    }

    /// Returns the primary field, if one is marked.
    #[must_use]
    pub fn primary_field(&self) -> Option<&Field> {
        self.fields_in_order()
            .into_iter()
            .find(|f| f.provides(PRIMARY_MARKER))
    }
}

fn c3_merge<'a>(mut sequences: Vec<Vec<&'a Schema>>) -> Option<Vec<&'a Schema>> {
    let mut merged = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(merged);
        }
        let head = sequences.iter().map(|s| s[0]).find(|candidate| {
            sequences
                .iter()
                .all(|s| !s[1..].iter().any(|other| other.same_as(candidate)))
        })?;
        for sequence in &mut sequences {
            if sequence[0].same_as(head) {
                sequence.remove(0);
            }
        }
        merged.push(head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn schema_with(name: &str, fields: &[&str]) -> Schema {
        let mut schema = Schema::new(name, "tests");
        for field in fields {
            schema.insert_field(Field::new(FieldType::TextLine).with_name(*field));
        }
        schema
    }

    #[test]
    fn test_insert_binds_interface() {
        let schema = schema_with("IContact", &["name"]);
        assert_eq!(
            schema.field("name").and_then(|f| f.interface.as_deref()),
            Some("tests.IContact")
        );
    }

    #[test]
    fn test_inherited_lookup_and_order() {
        let base = Arc::new(schema_with("IBase", &["base"]));
        let mut schema = schema_with("IChild", &["one", "two"]);
        schema.set_bases(vec![base, Schema::root()]);

        assert!(schema.get("base").is_some());
        assert!(schema.field("base").is_none());
        assert_eq!(schema.names_in_order(), vec!["base", "one", "two"]);
        assert!(schema.extends(&Schema::root()));
    }

    #[test]
    fn test_c3_resolution_order() {
        let root = Arc::new(schema_with("IRoot", &[]));
        let mut left = schema_with("ILeft", &[]);
        left.set_bases(vec![Arc::clone(&root)]);
        let mut right = schema_with("IRight", &[]);
        right.set_bases(vec![Arc::clone(&root)]);
        let mut bottom = schema_with("IBottom", &[]);
        bottom.set_bases(vec![Arc::new(left), Arc::new(right)]);

        let names: Vec<_> = bottom.resolution_order().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["IBottom", "ILeft", "IRight", "IRoot"]);
    }

    #[test]
    fn test_nearer_field_definition_wins() {
        let base = Arc::new(schema_with("IBase", &["title"]));
        let mut schema = Schema::new("IChild", "tests");
        schema.set_bases(vec![base]);
        schema.insert_field(Field::new(FieldType::Text).with_name("title"));
        let all = schema.all_fields();
        assert_eq!(all["title"].field_type(), FieldType::Text);
    }

    #[test]
    fn test_add_fieldset_merges_by_name() {
        let mut schema = Schema::new("IForm", "tests");
        schema.add_fieldset(Fieldset::new("extra").with_fields(["a"]));
        schema.add_fieldset(Fieldset::new("extra").with_fields(["a", "b"]));
        schema.add_fieldset(Fieldset::new("meta").with_order(1));
        assert_eq!(schema.fieldsets().len(), 2);
        assert_eq!(schema.fieldsets()[0].fields, vec!["a", "b"]);
        assert_eq!(schema.sorted_fieldsets()[0].name, "meta");
    }

    #[test]
    fn test_validate_invariants_collects_failures() {
        let mut schema = Schema::new("IRange", "tests");
        schema.add_invariant(Invariant::new("tests.ordered", |data| {
            match (data.get("start"), data.get("end")) {
                (Some(start), Some(end)) if start > end => Err("start after end".to_string()),
                _ => Ok(()),
            }
        }));
        let mut data = BTreeMap::new();
        data.insert("start".to_string(), Value::Int(5));
        data.insert("end".to_string(), Value::Int(1));
        assert_eq!(
            schema.validate_invariants(&data),
            Err(vec!["start after end".to_string()])
        );
        data.insert("end".to_string(), Value::Int(9));
        assert!(schema.validate_invariants(&data).is_ok());
    }

    #[test]
    fn test_mark_primary() {
        let mut schema = schema_with("IDocument", &["title", "body"]);
        assert!(schema.mark_primary(["body", "missing"]).is_err());
        assert!(schema.primary_field().is_none());
        schema.mark_primary(["body"]).unwrap();
        assert_eq!(schema.primary_field().map(Field::name), Some("body"));
    }
}
