//! Loading models from strings and files.
//!
//! [`ModelLoader`] caches file models by canonical path and policy. The
//! cache is filled outside the lock: two threads loading the same file at
//! once both parse it and the last one to finish wins.

use crate::error::{LoadError, Result};
use ironmodel_core::{Model, Schema, Value};
use ironmodel_schema::{ModelContext, SerializeOptions, parser, serializer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tagged value holding the absolute path a schema was loaded from.
pub const FILENAME_KEY: &str = "ironmodel.filename";

type CacheKey = (PathBuf, String);

/// Loads, caches and writes models with one [`ModelContext`].
pub struct ModelLoader {
    context: ModelContext,
    options: SerializeOptions,
    cache: Mutex<HashMap<CacheKey, Arc<Model>>>,
}

impl ModelLoader {
    /// Creates a loader with pretty serialization.
    #[must_use]
    pub fn new(context: ModelContext) -> Self {
        Self {
            context,
            options: SerializeOptions::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the serialization options.
    #[must_use]
    pub fn with_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// The context used for parsing and writing.
    #[must_use]
    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    /// Parses a model document.
    ///
    /// # Arguments
    /// * `xml` - Document text
    /// * `policy` - Name of the schema policy to apply
    ///
    /// # Errors
    /// Returns `LoadError::Parse` if the document is invalid.
    pub fn load_string(&self, xml: &str, policy: &str) -> Result<Model> {
        Ok(parser::parse_model_with(xml, None, policy, &self.context)?)
    }

    /// Loads a model file, reusing the cached model unless `reload` is set.
    ///
    /// Every schema of the model records the absolute file path under
    /// [`FILENAME_KEY`].
    ///
    /// # Arguments
    /// * `path` - Model file
    /// * `policy` - Name of the schema policy to apply
    /// * `reload` - Parse the file even when it is cached
    ///
    /// # Errors
    /// Returns `LoadError::Io` if the file cannot be read and
    /// `LoadError::Parse` if it is invalid.
    pub fn load_file(&self, path: impl AsRef<Path>, policy: &str, reload: bool) -> Result<Arc<Model>> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key = (canonical, policy.to_string());

        if !reload {
            if let Some(model) = self.cache.lock().get(&key) {
                tracing::trace!(path = %key.0.display(), "model cache hit");
                return Ok(Arc::clone(model));
            }
        }

        let xml = std::fs::read_to_string(&key.0).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = key.0.display().to_string();
        let mut model = parser::parse_model_with(&xml, Some(&file_name), policy, &self.context)?;
        for (_, schema) in model.iter_mut() {
            schema.set_tagged_value(FILENAME_KEY, Value::text(file_name.as_str()));
        }
        tracing::debug!(path = %file_name, schemata = model.len(), "model file loaded");

        let model = Arc::new(model);
        self.cache.lock().insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Loads one schema of a model file.
    ///
    /// # Errors
    /// Returns `LoadError::SchemaNotFound` if the model has no schema named
    /// `schema_name`, otherwise see [`ModelLoader::load_file`].
    pub fn xml_schema(&self, path: impl AsRef<Path>, schema_name: &str, policy: &str) -> Result<Schema> {
        let path = path.as_ref();
        let model = self.load_file(path, policy, false)?;
        model
            .get(schema_name)
            .cloned()
            .ok_or_else(|| LoadError::SchemaNotFound {
                path: path.to_path_buf(),
                name: schema_name.to_string(),
            })
    }

    /// Writes a model.
    ///
    /// # Errors
    /// Returns `LoadError::Parse` if a field cannot be written.
    pub fn serialize_model(&self, model: &Model) -> Result<String> {
        Ok(serializer::serialize_model(model, &self.context, &self.options)?)
    }

    /// Writes a single schema under `name`.
    ///
    /// # Errors
    /// Returns `LoadError::Parse` if a field cannot be written.
    pub fn serialize_schema(&self, schema: &Schema, name: &str) -> Result<String> {
        Ok(serializer::serialize_schema(schema, name, &self.context, &self.options)?)
    }

    /// Number of cached models.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drops every cached model.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(ModelContext::default())
    }
}
