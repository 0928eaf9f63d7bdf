//! Configuration constants for the streaming transformer.

/// Separator between a namespace prefix and the local element name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Length of a timestamp like `2020-01-01T00:00:00` that carries no zone.
///
/// Values of exactly this length are interpreted as UTC.
pub const UNZONED_TIMESTAMP_LEN: usize = 19;

/// Default number of bytes read per chunk when parsing from a reader.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Property under which content-children are collected on their parent.
pub const CONTENT_CHILDREN_KEY: &str = "children";

/// Key recording the originating element name of a content-child.
pub const ELEMENT_TYPE_KEY: &str = "@elementType";

/// Key holding a scalar content-child value once wrapped into an object.
pub const SCALAR_VALUE_KEY: &str = "@value";

/// Strip a namespace prefix from a qualified element name.
///
/// # Examples
/// ```
/// use regelrecht_xml_stream::config::local_name;
///
/// assert_eq!(local_name("atom:entry"), "entry");
/// assert_eq!(local_name("entry"), "entry");
/// ```
pub fn local_name(qualified: &str) -> &str {
    match qualified.split_once(NAMESPACE_SEPARATOR) {
        Some((_, local)) => local,
        None => qualified,
    }
}
