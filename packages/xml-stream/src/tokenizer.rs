//! Push tokenizer adapter over `quick-xml`.
//!
//! Input arrives in arbitrary byte chunks. The tokenizer keeps everything
//! after the last complete piece of markup buffered, and hands only
//! complete markup to `quick-xml`. Text is therefore always delivered
//! whole, whatever the chunk boundaries were.

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::context::Attributes;
use crate::error::{Result, StreamError};

/// Receiver of tokenizer events.
pub trait MarkupSink {
    /// An element opened (empty elements produce an open and a close).
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<()>;

    /// An element closed.
    fn close_tag(&mut self, name: &str) -> Result<()>;

    /// Trimmed, non-empty text between tags, entities decoded.
    fn text(&mut self, text: &str) -> Result<()>;
}

/// Incremental tokenizer buffering incomplete markup between chunks.
#[derive(Debug, Default)]
pub struct MarkupTokenizer {
    pending: Vec<u8>,
    /// Scan position in `pending`, so each byte is examined once.
    boundary: Boundary,
    /// Text not yet delivered; a CDATA section may end a segment.
    text: String,
    /// Bytes already dispatched, for error positions.
    consumed: u64,
}

impl MarkupTokenizer {
    /// Create a new tokenizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered bytes not yet dispatched.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed a chunk and dispatch all markup it completes.
    ///
    /// # Errors
    /// Returns `Syntax` for malformed markup, or whatever the sink returns.
    pub fn feed(&mut self, chunk: &[u8], sink: &mut impl MarkupSink) -> Result<()> {
        self.pending.extend_from_slice(chunk);
        let complete = self.boundary.advance(&self.pending);
        if complete == 0 {
            return Ok(());
        }

        dispatch(&self.pending[..complete], self.consumed, &mut self.text, sink)?;
        self.pending.drain(..complete);
        self.boundary.discard(complete);
        self.consumed += complete as u64;
        Ok(())
    }

    /// Dispatch whatever is still buffered at end of input.
    ///
    /// # Errors
    /// Returns `Syntax` if the input ends inside markup.
    pub fn finish(&mut self, sink: &mut impl MarkupSink) -> Result<()> {
        let rest = std::mem::take(&mut self.pending);
        self.boundary = Boundary::default();
        dispatch(&rest, self.consumed, &mut self.text, sink)?;
        self.consumed += rest.len() as u64;
        flush_text(&mut self.text, sink)
    }
}

/// How the end of a markup construct is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkupKind {
    /// Comment, CDATA or processing instruction: a fixed terminator
    /// after an opener of `opener` bytes.
    Delimited {
        opener: usize,
        terminator: &'static [u8],
    },
    /// Tag or declaration: the first unquoted `>`. DOCTYPE declarations
    /// may contain a bracketed internal subset.
    Tag { brackets: bool },
}

impl MarkupKind {
    /// Classify the markup at the start of `m`, or `None` while the
    /// opening bytes are still ambiguous.
    fn classify(m: &[u8]) -> Option<Self> {
        const COMMENT: &[u8] = b"<!--";
        const CDATA: &[u8] = b"<![CDATA[";

        if m.starts_with(COMMENT) {
            return Some(Self::Delimited {
                opener: COMMENT.len(),
                terminator: b"-->",
            });
        }
        if m.starts_with(CDATA) {
            return Some(Self::Delimited {
                opener: CDATA.len(),
                terminator: b"]]>",
            });
        }
        if m.starts_with(b"<?") {
            return Some(Self::Delimited {
                opener: 2,
                terminator: b"?>",
            });
        }
        if m.starts_with(b"<!") {
            if COMMENT.starts_with(m) || CDATA.starts_with(m) {
                return None;
            }
            return Some(Self::Tag { brackets: true });
        }
        if m.len() < 2 {
            return None;
        }
        Some(Self::Tag { brackets: false })
    }
}

/// Markup whose end has not been seen yet.
#[derive(Debug, Clone, Copy)]
struct OpenMarkup {
    start: usize,
    kind: Option<MarkupKind>,
    quote: Option<u8>,
    depth: usize,
}

impl OpenMarkup {
    fn at(start: usize) -> Self {
        Self {
            start,
            kind: None,
            quote: None,
            depth: 0,
        }
    }

    /// Continue scanning `buf` from `*pos`; returns the end offset once
    /// the markup is complete.
    fn scan(&mut self, buf: &[u8], pos: &mut usize) -> Option<usize> {
        let kind = match self.kind {
            Some(kind) => kind,
            None => {
                let kind = MarkupKind::classify(&buf[self.start..])?;
                self.kind = Some(kind);
                kind
            }
        };

        match kind {
            MarkupKind::Delimited { opener, terminator } => {
                let body = self.start + opener;
                let from = body.max(pos.saturating_sub(terminator.len() - 1));
                match find(&buf[from..], terminator) {
                    Some(i) => Some(from + i + terminator.len()),
                    None => {
                        *pos = buf.len();
                        None
                    }
                }
            }
            MarkupKind::Tag { brackets } => {
                let from = (*pos).max(self.start + 1);
                for (i, &b) in buf.iter().enumerate().skip(from) {
                    match (self.quote, b) {
                        (Some(q), _) if b == q => self.quote = None,
                        (Some(_), _) => {}
                        (None, b'"' | b'\'') => self.quote = Some(b),
                        (None, b'[') if brackets => self.depth += 1,
                        (None, b']') if brackets => self.depth = self.depth.saturating_sub(1),
                        (None, b'>') if self.depth == 0 => return Some(i + 1),
                        _ => {}
                    }
                }
                *pos = buf.len();
                None
            }
        }
    }
}

/// Resumable search for the end of the last complete markup.
#[derive(Debug, Default)]
struct Boundary {
    /// Next byte to examine.
    pos: usize,
    open: Option<OpenMarkup>,
}

impl Boundary {
    /// Scan the bytes of `buf` not seen before and return the length of
    /// the longest prefix that ends after complete markup.
    fn advance(&mut self, buf: &[u8]) -> usize {
        let mut complete = 0;
        loop {
            let Some(mut markup) = self.open else {
                match buf[self.pos..].iter().position(|&b| b == b'<') {
                    Some(offset) => {
                        let start = self.pos + offset;
                        self.open = Some(OpenMarkup::at(start));
                        self.pos = start + 1;
                        continue;
                    }
                    None => {
                        self.pos = buf.len();
                        return complete;
                    }
                }
            };

            match markup.scan(buf, &mut self.pos) {
                Some(end) => {
                    self.open = None;
                    self.pos = end;
                    complete = end;
                }
                None => {
                    self.open = Some(markup);
                    return complete;
                }
            }
        }
    }

    /// Shift offsets after the first `n` bytes were removed.
    fn discard(&mut self, n: usize) {
        self.pos -= n;
        if let Some(markup) = &mut self.open {
            markup.start -= n;
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Run `quick-xml` over a segment and forward events to the sink.
///
/// Text is accumulated in `text` and delivered at the next tag.
fn dispatch(
    segment: &[u8],
    offset: u64,
    text: &mut String,
    sink: &mut impl MarkupSink,
) -> Result<()> {
    let mut reader = Reader::from_reader(segment);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let syntax = |reader: &Reader<&[u8]>, message: String| {
        StreamError::syntax(offset + reader.buffer_position(), message)
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax(&reader, e.to_string()))?;

        match event {
            Event::Text(e) => {
                let decoded = e.decode().map_err(|e| syntax(&reader, e.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => {
                let raw = e.decode().map_err(|e| syntax(&reader, e.to_string()))?;
                let resolved = resolve_entity(&raw)
                    .ok_or_else(|| syntax(&reader, format!("unknown entity &{raw};")))?;
                text.push_str(&resolved);
            }
            Event::CData(e) => {
                let decoded = std::str::from_utf8(e.as_ref())
                    .map_err(|e| syntax(&reader, e.to_string()))?;
                text.push_str(decoded);
            }
            Event::Start(e) => {
                flush_text(text, sink)?;
                let qname = e.name();
                let name = utf8(qname.as_ref()).map_err(|m| syntax(&reader, m))?;
                let attributes = collect_attributes(&e).map_err(|m| syntax(&reader, m))?;
                sink.open_tag(name, &attributes)?;
            }
            Event::End(e) => {
                flush_text(text, sink)?;
                let qname = e.name();
                let name = utf8(qname.as_ref()).map_err(|m| syntax(&reader, m))?;
                sink.close_tag(name)?;
            }
            Event::Eof => return Ok(()),
            Event::Empty(_)
            | Event::Decl(_)
            | Event::Comment(_)
            | Event::PI(_)
            | Event::DocType(_) => {
                flush_text(text, sink)?;
            }
        }
    }
}

fn flush_text(text: &mut String, sink: &mut impl MarkupSink) -> Result<()> {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        sink.text(trimmed)?;
    }
    text.clear();
    Ok(())
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| e.to_string())
}

fn collect_attributes(e: &BytesStart<'_>) -> std::result::Result<Attributes, String> {
    let mut attributes = Attributes::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let name = utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.insert(name, value.into_owned());
    }
    Ok(attributes)
}

/// Resolve a predefined or numeric character reference.
fn resolve_entity(raw: &str) -> Option<String> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Some(resolved.to_string());
    }

    let rest = raw.strip_prefix('#')?;
    let code = match rest.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => rest.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(String::from)
}
