//! Engine driving the context stack from markup events.
//!
//! The engine owns the absolute nesting depth. Every open tag is pushed on
//! the element stack, tracked or not; only recognised elements get a
//! [`Context`]. A context records the depth at which it closes (the depth
//! of its parent) and is closed by the close tag that returns the element
//! stack to that depth.

use serde::Serialize;

use crate::config::local_name;
use crate::context::{Attachment, Attributes, ClosedContext, Context};
use crate::error::{Result, StreamError};
use crate::schema::SchemaRegistry;
use crate::text::TextBuffer;
use crate::tokenizer::MarkupSink;
use crate::value::Value;

/// A completed root element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEvent {
    /// Local name of the root element.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Constructed value.
    pub body: Value,
}

/// An open context with the depth at which it closes.
#[derive(Debug)]
struct Frame<'s> {
    context: Context<'s>,
    close_depth: usize,
}

/// Streaming transformation engine for one parse.
#[derive(Debug)]
pub struct Engine<'s> {
    schema: &'s SchemaRegistry,
    element_stack: Vec<String>,
    contexts: Vec<Frame<'s>>,
    text: TextBuffer,
    results: Vec<ResultEvent>,
}

impl<'s> Engine<'s> {
    /// Create an engine for the given schema.
    #[must_use]
    pub fn new(schema: &'s SchemaRegistry) -> Self {
        Self {
            schema,
            element_stack: Vec::new(),
            contexts: Vec::new(),
            text: TextBuffer::default(),
            results: Vec::new(),
        }
    }

    /// Current nesting depth (open tags, tracked or not).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.element_stack.len()
    }

    /// Number of open contexts.
    #[must_use]
    pub fn open_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Handle an opening tag.
    ///
    /// # Errors
    /// Returns `Configuration` if a recognised element has no definition.
    pub fn on_open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        let name = local_name(name);
        self.element_stack.push(name.to_string());
        let close_depth = self.element_stack.len() - 1;

        let opened = match self.contexts.last() {
            Some(frame) => {
                frame
                    .context
                    .open_child(self.schema, name, attributes, &mut self.text)?
            }
            None if close_depth == 0 && self.schema.is_root(name) => Some(Context::new(
                name,
                self.schema.element(name),
                Attachment::Root,
                attributes,
                &mut self.text,
            )?),
            None => None,
        };

        match opened {
            Some(context) => {
                tracing::debug!(element = %name, depth = close_depth, "Opened context");
                self.contexts.push(Frame {
                    context,
                    close_depth,
                });
            }
            None => tracing::trace!(element = %name, depth = close_depth, "Ignoring element"),
        }
        Ok(())
    }

    /// Handle a closing tag.
    ///
    /// Closes at most one context: the one recorded to close at the depth
    /// the element stack returns to.
    pub fn on_close_tag(&mut self) {
        self.element_stack.pop();
        let depth = self.element_stack.len();

        let closes_here = self
            .contexts
            .last()
            .is_some_and(|frame| frame.close_depth == depth);
        if !closes_here {
            return;
        }
        if let Some(frame) = self.contexts.pop() {
            let closed = frame.context.close(&mut self.text);
            self.deliver(closed);
        }
    }

    /// Handle a text chunk.
    pub fn on_text(&mut self, text: &str) {
        self.text.push(text);
    }

    /// Check that no root element is left open at end of input.
    ///
    /// # Errors
    /// Returns `TruncatedDocument` if contexts are still open.
    pub fn finish(&self) -> Result<()> {
        match self.contexts.first() {
            Some(root) => Err(StreamError::TruncatedDocument {
                element: root.context.element_name().to_string(),
                open: self.contexts.len(),
            }),
            None => Ok(()),
        }
    }

    /// Take the results completed so far, in document order.
    pub fn take_results(&mut self) -> Vec<ResultEvent> {
        std::mem::take(&mut self.results)
    }

    fn deliver(&mut self, closed: ClosedContext<'s>) {
        tracing::debug!(element = %closed.element_name, "Closed context");

        if let Attachment::Root = closed.attachment {
            tracing::debug!(element = %closed.element_name, "Emitting result");
            self.results.push(ResultEvent {
                element_type: closed.element_name,
                body: closed.value.unwrap_or_default(),
            });
            return;
        }

        if let Some(parent) = self.contexts.last_mut() {
            parent.context.attach(closed);
        }
    }
}

impl MarkupSink for Engine<'_> {
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        self.on_open_tag(name, attributes)
    }

    fn close_tag(&mut self, _name: &str) -> Result<()> {
        self.on_close_tag();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.on_text(text);
        Ok(())
    }
}
