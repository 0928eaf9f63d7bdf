//! Push-driven stream parser combining the tokenizer and the engine.
//!
//! Each chunk is fully processed before `write` returns: every result the
//! chunk completes is handed back, and only one partially built value plus
//! the tokenizer's incomplete tail stay in memory.

use std::io::{ErrorKind, Read};

use crate::engine::{Engine, ResultEvent};
use crate::error::{Result, StreamError};
use crate::schema::SchemaRegistry;
use crate::tokenizer::MarkupTokenizer;

/// Lifecycle of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    /// Ended normally or after an error; no further input is processed.
    Halted,
}

/// Streaming parser for one document stream.
#[derive(Debug)]
pub struct StreamParser<'s> {
    tokenizer: MarkupTokenizer,
    engine: Engine<'s>,
    state: StreamState,
}

impl<'s> StreamParser<'s> {
    /// Create a parser for the given schema.
    #[must_use]
    pub fn new(schema: &'s SchemaRegistry) -> Self {
        Self {
            tokenizer: MarkupTokenizer::new(),
            engine: Engine::new(schema),
            state: StreamState::Open,
        }
    }

    /// Feed a chunk of input.
    ///
    /// # Returns
    /// Results completed by this chunk, in document order.
    ///
    /// # Errors
    /// Any error halts the stream; later calls return `Halted`.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<Vec<ResultEvent>> {
        self.ensure_open()?;
        let outcome = self.tokenizer.feed(chunk.as_ref(), &mut self.engine);
        self.settle(outcome)
    }

    /// Signal end of input.
    ///
    /// # Errors
    /// Returns `Syntax` if input ends inside markup and `TruncatedDocument`
    /// if a root element is still open.
    pub fn end(&mut self) -> Result<Vec<ResultEvent>> {
        self.ensure_open()?;
        let outcome = self
            .tokenizer
            .finish(&mut self.engine)
            .and_then(|()| self.engine.finish());
        let results = self.settle(outcome)?;
        self.state = StreamState::Halted;
        Ok(results)
    }

    /// Whether the stream still accepts input.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == StreamState::Open
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            StreamState::Open => Ok(()),
            StreamState::Halted => Err(StreamError::Halted),
        }
    }

    fn settle(&mut self, outcome: Result<()>) -> Result<Vec<ResultEvent>> {
        match outcome {
            Ok(()) => Ok(self.engine.take_results()),
            Err(err) => {
                tracing::warn!(error = %err, "Stream halted");
                self.state = StreamState::Halted;
                Err(err)
            }
        }
    }
}

/// Parse a complete document held in memory.
///
/// # Examples
/// ```
/// use regelrecht_xml_stream::{parse_str, SchemaRegistry, Value};
///
/// let schema = SchemaRegistry::from_yaml_str(
///     "id: {from: attributes, attribute: value, type: integer}",
/// ).unwrap();
/// let results = parse_str(&schema, r#"<id value="42"/>"#).unwrap();
/// assert_eq!(results[0].body, Value::Int(42));
/// ```
pub fn parse_str(schema: &SchemaRegistry, xml: &str) -> Result<Vec<ResultEvent>> {
    let mut parser = StreamParser::new(schema);
    let mut results = parser.write(xml)?;
    results.extend(parser.end()?);
    Ok(results)
}

/// Parse from a reader in chunks of `chunk_size` bytes.
///
/// Each result is passed to `on_result` as soon as its root element
/// closes. Returns the number of results.
pub fn parse_reader<R: Read>(
    schema: &SchemaRegistry,
    mut reader: R,
    chunk_size: usize,
    mut on_result: impl FnMut(ResultEvent) -> Result<()>,
) -> Result<usize> {
    let mut parser = StreamParser::new(schema);
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut count = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for result in parser.write(&buf[..n])? {
            on_result(result)?;
            count += 1;
        }
    }

    for result in parser.end()? {
        on_result(result)?;
        count += 1;
    }
    Ok(count)
}
