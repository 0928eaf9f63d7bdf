//! Schema registry and element definitions.
//!
//! A schema maps root element names to [`ElementDefinition`]s. Definitions
//! nest through `properties` and `children`, and may also refer to other
//! registered elements by name (`accept`, `acceptedChildren`), which is how
//! recursive structures are expressed without recursive types.

mod core;
mod types;

pub use core::SchemaRegistry;
pub use types::{AttributeDefinition, ElementDefinition, TextExtraction, ValueSource, ValueType};
