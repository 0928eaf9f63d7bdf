//! Declarative element definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declared type of a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Structured value built from attributes and children.
    Object,
    /// Base-10 integer.
    Integer,
    /// Floating point number.
    Number,
    /// Timestamp.
    Date,
    /// Trimmed raw text.
    #[default]
    String,
}

/// Where a scalar element takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// A single attribute named by `attribute`.
    Attributes,
    /// The element's text content.
    Text,
}

/// Definition of a declared attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Type the attribute value is coerced to.
    #[serde(rename = "type", default)]
    pub value_type: ValueType,

    /// Property name to store the attribute under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

/// Rule storing captured text as an extra property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextExtraction {
    /// Property the text is stored under.
    pub key: String,

    /// Type the text is coerced to.
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
}

/// Declarative description of how an element maps to a value.
///
/// The same shape describes registered elements, entries of `properties`
/// and entries of `children`. For the latter two, `rename_to` and `array`
/// describe how the value lands on the parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Declared value type.
    #[serde(rename = "type", default)]
    pub value_type: ValueType,

    /// Source of a scalar value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ValueSource>,

    /// Attribute holding the value when `from` is `attributes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Declared attributes, keyed by attribute name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, AttributeDefinition>,

    /// Scalar child elements, keyed by element name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, ElementDefinition>,

    /// Structured child elements, keyed by element name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub children: HashMap<String, ElementDefinition>,

    /// Element names that are alternative shapes of this value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,

    /// Element names collected into the ordered `children` list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_children: Vec<String>,

    /// Store captured text under an extra property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_text: Option<TextExtraction>,

    /// Use captured text when no other value was established.
    #[serde(default)]
    pub fallback_text: bool,

    /// Property name on the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,

    /// Accumulate repeated occurrences on the parent as a list.
    #[serde(default)]
    pub array: bool,
}

impl ElementDefinition {
    /// Create a definition of the given type.
    #[must_use]
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Self::default()
        }
    }

    /// Source the value from a single attribute.
    #[must_use]
    pub fn from_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.from = Some(ValueSource::Attributes);
        self.attribute = Some(attribute.into());
        self
    }

    /// Source the value from text.
    #[must_use]
    pub fn from_text(mut self) -> Self {
        self.from = Some(ValueSource::Text);
        self
    }

    /// Declare an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, def: AttributeDefinition) -> Self {
        self.attributes.insert(name.into(), def);
        self
    }

    /// Declare a scalar property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, def: ElementDefinition) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    /// Declare a structured child.
    #[must_use]
    pub fn with_child(mut self, name: impl Into<String>, def: ElementDefinition) -> Self {
        self.children.insert(name.into(), def);
        self
    }

    /// Set the alternative value elements.
    #[must_use]
    pub fn with_accept(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.accept = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the content-child elements.
    #[must_use]
    pub fn with_accepted_children(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.accepted_children = names.into_iter().map(Into::into).collect();
        self
    }

    /// Store captured text under `key`.
    #[must_use]
    pub fn with_extract_text(mut self, key: impl Into<String>, value_type: ValueType) -> Self {
        self.extract_text = Some(TextExtraction {
            key: key.into(),
            value_type,
        });
        self
    }

    /// Fall back to captured text.
    #[must_use]
    pub fn with_fallback_text(mut self) -> Self {
        self.fallback_text = true;
        self
    }

    /// Store under a different name on the parent.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }

    /// Accumulate on the parent as a list.
    #[must_use]
    pub fn as_array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Look up a declared scalar property.
    pub fn property(&self, name: &str) -> Option<&ElementDefinition> {
        self.properties.get(name)
    }

    /// Look up a declared structured child.
    pub fn child(&self, name: &str) -> Option<&ElementDefinition> {
        self.children.get(name)
    }

    /// Whether `name` is an alternative value element.
    pub fn accepts(&self, name: &str) -> bool {
        self.accept.iter().any(|n| n == name)
    }

    /// Whether `name` is a content-child element.
    pub fn accepts_content_child(&self, name: &str) -> bool {
        self.accepted_children.iter().any(|n| n == name)
    }

    /// Whether the value is built as an object.
    pub fn is_object(&self) -> bool {
        self.value_type == ValueType::Object
    }

    /// Whether a context for this definition needs the element's text.
    ///
    /// Scalar definitions without an explicit source read their text.
    pub fn captures_text(&self) -> bool {
        match self.from {
            Some(_) => true,
            None => !self.is_object() || self.fallback_text || self.extract_text.is_some(),
        }
    }

    /// Name the value is stored under on the parent.
    pub fn target_name<'a>(&'a self, element_name: &'a str) -> &'a str {
        self.rename_to.as_deref().unwrap_or(element_name)
    }
}

impl AttributeDefinition {
    /// Create an attribute definition of the given type.
    #[must_use]
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            rename_to: None,
        }
    }

    /// Store under a different property name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }
}
