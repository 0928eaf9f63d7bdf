//! Per-element build contexts.
//!
//! A [`Context`] accumulates the value of one open element from its
//! attributes, the values of closed child contexts and captured text.
//!
//! # Child classification
//!
//! An opening child element is classified against the context's definition
//! in a fixed order (first match wins):
//! 1. **Child** - declared in `children`
//! 2. **Content child** - listed in `acceptedChildren`
//! 3. **Alternative** - listed in `accept`
//! 4. **Property** - declared in `properties`
//!
//! Anything else is ignored. The classification is made once, when the
//! child opens, and travels with the child as its [`Attachment`].

use std::fmt;

use indexmap::IndexMap;

use crate::coerce::{coerce_str, coerce_value};
use crate::config::{CONTENT_CHILDREN_KEY, ELEMENT_TYPE_KEY, SCALAR_VALUE_KEY};
use crate::error::{Result, StreamError};
use crate::schema::{ElementDefinition, SchemaRegistry, ValueSource};
use crate::text::TextBuffer;
use crate::value::{Map, Value};

/// Attributes of an opening tag in document order, already entity-decoded.
pub type Attributes = IndexMap<String, String>;

/// Role of a child element relative to the open context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    /// Structured child declared in `children`.
    Child,
    /// Entry of the heterogeneous `children` list.
    ContentChild,
    /// Alternative shape replacing the whole value.
    Alternative,
    /// Scalar property declared in `properties`.
    Property,
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Child => "child",
            Self::ContentChild => "content child",
            Self::Alternative => "alternative value",
            Self::Property => "property",
        };
        f.write_str(name)
    }
}

/// Where the value of a context goes once it closes.
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'s> {
    /// Emitted as a result event.
    Root,
    /// Stored on the parent as described by the parent-side definition.
    Child { target: &'s ElementDefinition },
    /// Stored on the parent under a declared property.
    Property { target: &'s ElementDefinition },
    /// Replaces the parent's value.
    Alternative,
    /// Appended to the parent's content-children list.
    ContentChild,
}

/// A context that has been closed and whose value awaits delivery.
#[derive(Debug)]
pub struct ClosedContext<'s> {
    /// Local name of the element.
    pub element_name: String,
    /// Destination of the value.
    pub attachment: Attachment<'s>,
    /// Final value; `None` if nothing was established.
    pub value: Option<Value>,
}

/// In-progress accumulator for one open element.
#[derive(Debug)]
pub struct Context<'s> {
    element_name: String,
    definition: &'s ElementDefinition,
    value: Option<Value>,
    attachment: Attachment<'s>,
}

impl<'s> Context<'s> {
    /// Open a context for an element.
    ///
    /// Requests text capture when the definition reads text, then applies
    /// the opening tag's attributes.
    ///
    /// # Errors
    /// Returns `Configuration` if the element name is empty or no
    /// definition was resolved.
    pub fn new(
        element_name: &str,
        definition: Option<&'s ElementDefinition>,
        attachment: Attachment<'s>,
        attributes: &Attributes,
        text: &mut TextBuffer,
    ) -> Result<Self> {
        if element_name.is_empty() {
            return Err(StreamError::configuration(element_name, "empty element name"));
        }
        let definition = definition.ok_or_else(|| {
            StreamError::configuration(element_name, "no definition resolved for element")
        })?;

        let mut context = Self {
            element_name: element_name.to_string(),
            definition,
            value: definition.is_object().then(Value::object),
            attachment,
        };

        if definition.captures_text() {
            text.start();
        }
        context.apply_attributes(attributes);

        Ok(context)
    }

    /// Local name of the element.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Definition the context builds against.
    pub fn definition(&self) -> &'s ElementDefinition {
        self.definition
    }

    /// Value built so far.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    fn apply_attributes(&mut self, attributes: &Attributes) {
        let definition = self.definition;

        if definition.from == Some(ValueSource::Attributes) {
            if let Some(raw) = definition
                .attribute
                .as_deref()
                .and_then(|name| attributes.get(name))
            {
                self.value = Some(coerce_str(raw, definition.value_type));
            }
        }

        for (name, raw) in attributes {
            let Some(attribute) = definition.attributes.get(name) else {
                continue;
            };
            let key = attribute.rename_to.as_deref().unwrap_or(name);
            let value = coerce_str(raw, attribute.value_type);
            match object_of(&mut self.value) {
                Some(map) => {
                    map.insert(key.to_string(), value);
                }
                None => tracing::trace!(
                    element = %self.element_name,
                    attribute = %name,
                    "Attribute ignored on scalar value"
                ),
            }
        }
    }

    /// Classify a child element name.
    ///
    /// Returns `None` for elements with no role; those are ignored.
    pub fn identify(&self, name: &str) -> Option<ChildRole> {
        let definition = self.definition;
        if definition.child(name).is_some() {
            Some(ChildRole::Child)
        } else if definition.accepts_content_child(name) {
            Some(ChildRole::ContentChild)
        } else if definition.accepts(name) {
            Some(ChildRole::Alternative)
        } else if definition.property(name).is_some() {
            Some(ChildRole::Property)
        } else {
            None
        }
    }

    /// Open a child element inside this context.
    ///
    /// Returns the child's context, or `None` if the element has no role
    /// here. A recognised child always ends the current text capture.
    ///
    /// # Errors
    /// Returns `Configuration` if the child was classified but its
    /// definition cannot be found.
    pub fn open_child(
        &self,
        schema: &'s SchemaRegistry,
        name: &str,
        attributes: &Attributes,
        text: &mut TextBuffer,
    ) -> Result<Option<Context<'s>>> {
        let Some(role) = self.identify(name) else {
            return Ok(None);
        };

        text.stop();

        let parent: &'s ElementDefinition = self.definition;
        let (definition, attachment) = match role {
            ChildRole::Property => {
                let target = parent.property(name);
                (target, target.map(|target| Attachment::Property { target }))
            }
            ChildRole::Child => {
                let target = parent.child(name);
                (
                    schema.element(name).or(target),
                    target.map(|target| Attachment::Child { target }),
                )
            }
            ChildRole::Alternative => (schema.element(name), Some(Attachment::Alternative)),
            ChildRole::ContentChild => (schema.element(name), Some(Attachment::ContentChild)),
        };

        let attachment = attachment.ok_or_else(|| {
            StreamError::configuration(name, format!("{role} of <{}> has no target", self.element_name))
        })?;
        if definition.is_none() {
            return Err(StreamError::configuration(
                name,
                format!("{role} of <{}> has no definition in schema", self.element_name),
            ));
        }

        Context::new(name, definition, attachment, attributes, text).map(Some)
    }

    /// Close the context and compute its final value.
    ///
    /// Consuming the context guarantees its value is delivered once.
    pub fn close(mut self, text: &mut TextBuffer) -> ClosedContext<'s> {
        let definition = self.definition;

        if let Some(extraction) = definition.extract_text.as_ref().filter(|_| text.is_capturing()) {
            let raw = text.flush().unwrap_or_default();
            if !raw.is_empty() {
                let value = coerce_str(&raw, extraction.value_type);
                self.set_property(&extraction.key, value, false);
            }
        } else if self.value.is_none() && text.is_capturing() {
            self.value = text
                .flush()
                .filter(|raw| !raw.is_empty())
                .map(|raw| coerce_str(&raw, definition.value_type));
        }

        // Capture requested by this context ends with it.
        if definition.captures_text() {
            text.stop();
        }

        ClosedContext {
            element_name: self.element_name,
            attachment: self.attachment,
            value: self.value,
        }
    }

    /// Deliver the value of a closed child context.
    ///
    /// Empty values are dropped.
    pub fn attach(&mut self, child: ClosedContext<'s>) {
        let Some(value) = child.value.filter(|v| !v.is_empty()) else {
            tracing::trace!(
                element = %child.element_name,
                parent = %self.element_name,
                "Dropping empty value"
            );
            return;
        };

        match child.attachment {
            Attachment::Child { target } | Attachment::Property { target } => {
                let value = coerce_value(value, target.value_type);
                let key = target.target_name(&child.element_name);
                self.set_property(key, value, target.array);
            }
            Attachment::Alternative => {
                self.value = Some(coerce_value(value, self.definition.value_type));
            }
            Attachment::ContentChild => {
                let value = coerce_value(value, self.definition.value_type);
                self.push_content_child(&child.element_name, value);
            }
            Attachment::Root => {}
        }
    }

    fn set_property(&mut self, key: &str, value: Value, array: bool) {
        let Some(map) = object_of(&mut self.value) else {
            tracing::warn!(
                element = %self.element_name,
                property = %key,
                "Cannot store property on scalar value, dropping"
            );
            return;
        };

        if !array {
            map.insert(key.to_string(), value);
            return;
        }
        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                map.insert(key.to_string(), Value::Array(vec![value]));
            }
        }
    }

    fn push_content_child(&mut self, element_name: &str, value: Value) {
        let tagged = match value {
            Value::Object(mut map) => {
                map.insert(ELEMENT_TYPE_KEY.to_string(), Value::from(element_name));
                Value::Object(map)
            }
            scalar => [
                (ELEMENT_TYPE_KEY, Value::from(element_name)),
                (SCALAR_VALUE_KEY, scalar),
            ]
            .into_iter()
            .collect(),
        };
        self.set_property(CONTENT_CHILDREN_KEY, tagged, true);
    }
}

/// Object being built, created on first use.
///
/// Returns `None` if the value already collapsed to a scalar.
fn object_of(value: &mut Option<Value>) -> Option<&mut Map> {
    value.get_or_insert_with(Value::object).as_object_mut()
}
