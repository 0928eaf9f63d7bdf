//! Schema registry mapping element names to definitions.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::types::ElementDefinition;
use crate::error::{Result, StreamError};

/// Immutable lookup of element definitions, loaded once.
///
/// Every registered name is also an acceptable root element. Lookups of
/// unknown names return `None`; callers treat that as "ignore".
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    elements: HashMap<String, ElementDefinition>,
}

impl SchemaRegistry {
    /// Create a registry from element definitions.
    #[must_use]
    pub fn new(elements: HashMap<String, ElementDefinition>) -> Self {
        Self { elements }
    }

    /// Register a definition (builder style, before the registry is shared).
    #[must_use]
    pub fn with_element(mut self, name: impl Into<String>, def: ElementDefinition) -> Self {
        self.elements.insert(name.into(), def);
        self
    }

    /// Parse a schema from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let elements: HashMap<String, ElementDefinition> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(elements))
    }

    /// Parse a schema from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let elements: HashMap<String, ElementDefinition> = serde_json::from_str(json)?;
        Ok(Self::new(elements))
    }

    /// Load a schema file, choosing the format from its extension.
    ///
    /// `.json` files are read as JSON, `.yaml`/`.yml` as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let registry = match extension.as_deref() {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            _ => {
                return Err(StreamError::SchemaLoad(format!(
                    "unsupported schema file extension: {}",
                    path.display()
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            elements = registry.len(),
            "Loaded schema"
        );
        Ok(registry)
    }

    /// Look up an element definition by name.
    pub fn element(&self, name: &str) -> Option<&ElementDefinition> {
        self.elements.get(name)
    }

    /// Look up a scalar property definition scoped to its owning element.
    pub fn property_definition(&self, element: &str, property: &str) -> Option<&ElementDefinition> {
        self.element(element)?.property(property)
    }

    /// Look up a structured child definition scoped to its owning element.
    ///
    /// This is the parent-side view: it carries the target property name
    /// and the array flag.
    pub fn child_definition(&self, element: &str, child: &str) -> Option<&ElementDefinition> {
        self.element(element)?.child(child)
    }

    /// Check whether a name is an acceptable root element.
    #[must_use]
    pub fn is_root(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Return set of all root element names.
    #[must_use]
    pub fn root_names(&self) -> HashSet<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Number of registered elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no elements are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    fn feed_schema() -> SchemaRegistry {
        SchemaRegistry::from_yaml_str(
            r#"
feed:
  type: object
  properties:
    title: {}
  children:
    entry:
      type: object
      array: true
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let registry = feed_schema();
        assert!(registry.element("feed").is_some());
        assert!(registry.element("entry").is_none());
        assert!(registry.is_root("feed"));
        assert!(!registry.is_root("entry"));
        assert_eq!(registry.root_names(), HashSet::from(["feed"]));
    }

    #[test]
    fn test_registry_scoped_lookups() {
        let registry = feed_schema();

        let title = registry.property_definition("feed", "title").unwrap();
        assert_eq!(title.value_type, ValueType::String);
        assert!(registry.property_definition("feed", "entry").is_none());
        assert!(registry.property_definition("missing", "title").is_none());

        let entry = registry.child_definition("feed", "entry").unwrap();
        assert!(entry.array);
        assert!(registry.child_definition("feed", "title").is_none());
    }

    #[test]
    fn test_registry_from_json() {
        let registry =
            SchemaRegistry::from_json_str(r#"{"id": {"from": "attributes", "attribute": "value", "type": "integer"}}"#)
                .unwrap();
        let id = registry.element("id").unwrap();
        assert_eq!(id.value_type, ValueType::Integer);
        assert_eq!(id.attribute.as_deref(), Some("value"));
    }

    #[test]
    fn test_registry_from_path_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        fs::write(&path, "").unwrap();

        let err = SchemaRegistry::from_path(&path).unwrap_err();
        assert!(matches!(err, StreamError::SchemaLoad(_)));
    }

    #[test]
    fn test_registry_from_path_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yml");
        fs::write(&path, "feed:\n  type: object\n").unwrap();

        let registry = SchemaRegistry::from_path(&path).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
