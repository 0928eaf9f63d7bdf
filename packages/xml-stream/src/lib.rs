//! RegelRecht XML stream - Schema-driven streaming conversion of XML.
//!
//! This crate turns a stream of markup events into structured values,
//! guided by a declarative schema that says how elements map to object
//! properties, attributes, scalars and ordered heterogeneous collections.
//! Input is consumed chunk by chunk; memory stays bounded by one partially
//! built value and the active text buffer.
//!
//! # Example
//!
//! ```
//! use regelrecht_xml_stream::{parse_str, SchemaRegistry};
//!
//! let schema = SchemaRegistry::from_yaml_str(r#"
//! feed:
//!   type: object
//!   children:
//!     entry:
//!       type: object
//!       array: true
//!       properties:
//!         title: {type: string}
//! "#).unwrap();
//!
//! let xml = "<feed><entry><title>A</title></entry><entry><title>B</title></entry></feed>";
//! let results = parse_str(&schema, xml).unwrap();
//!
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].element_type, "feed");
//! let json = serde_json::to_string(&results[0].body).unwrap();
//! assert_eq!(json, r#"{"entry":[{"title":"A"},{"title":"B"}]}"#);
//! ```
//!
//! # Architecture
//!
//! - [`schema`]: Schema registry and element definitions
//! - [`context`]: Per-element build contexts and child classification
//! - [`engine`]: Context stack, nesting depth and result emission
//! - [`text`]: The single ambient text buffer
//! - [`coerce`]: Scalar coercion
//! - [`tokenizer`]: Push adapter over `quick-xml`
//! - [`parser`]: Chunked stream parser
//! - [`value`]: Output values
//! - [`config`]: Constants
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod coerce;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod parser;
pub mod schema;
pub mod text;
pub mod tokenizer;
pub mod value;

// Re-export commonly used items
pub use context::{Attachment, Attributes, ChildRole, Context};
pub use engine::{Engine, ResultEvent};
pub use error::{Result, StreamError};
pub use parser::{parse_reader, parse_str, StreamParser};
pub use schema::{ElementDefinition, SchemaRegistry, ValueType};
pub use tokenizer::{MarkupSink, MarkupTokenizer};
pub use value::Value;
