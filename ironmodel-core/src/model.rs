//! Models: named collections of schemas.

use crate::schema::Schema;

/// A set of schemas keyed by name; the unnamed schema uses the empty name.
#[derive(Debug, Clone, Default)]
pub struct Model {
    schemata: Vec<(String, Schema)>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema under `name`, replacing an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        match self.schemata.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = schema,
            None => self.schemata.push((name, schema)),
        }
    }

    /// Schema by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemata
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    /// Schema by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemata
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    /// The unnamed schema.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.get("")
    }

    /// Removes a schema.
    pub fn remove(&mut self, name: &str) -> Option<Schema> {
        let index = self.schemata.iter().position(|(n, _)| n == name)?;
        Some(self.schemata.remove(index).1)
    }

    /// Schema names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemata.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, schema)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemata.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Mutable `(name, schema)` pairs in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Schema)> {
        self.schemata
            .iter_mut()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Number of schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemata.len()
    }

    /// Returns true when the model holds no schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemata.is_empty()
    }
}

impl FromIterator<(String, Schema)> for Model {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        let mut model = Self::new();
        for (name, schema) in iter {
            model.insert(name, schema);
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut model = Model::new();
        model.insert("", Schema::new("IDefault", "m"));
        model.insert("extra", Schema::new("IExtra", "m"));
        model.insert("", Schema::new("IReplaced", "m"));

        assert_eq!(model.len(), 2);
        assert_eq!(model.names().collect::<Vec<_>>(), vec!["", "extra"]);
        assert_eq!(model.schema().map(Schema::name), Some("IReplaced"));
    }

    #[test]
    fn test_remove() {
        let mut model: Model = [("a".to_string(), Schema::new("IA", "m"))]
            .into_iter()
            .collect();
        assert!(model.remove("a").is_some());
        assert!(model.remove("a").is_none());
        assert!(model.is_empty());
    }
}
