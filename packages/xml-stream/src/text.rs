//! The single ambient text buffer of a parse.

/// Text capture state, owned by the engine.
///
/// At most one buffer is active. Turning capture off always discards the
/// buffer, so text cannot leak into an unrelated sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextBuffer {
    /// Text is discarded.
    #[default]
    Idle,
    /// Text is accumulated.
    Capturing(String),
}

impl TextBuffer {
    /// Start capturing. Already capturing keeps the current buffer.
    pub fn start(&mut self) {
        if let Self::Idle = self {
            *self = Self::Capturing(String::new());
        }
    }

    /// Stop capturing and discard the buffer.
    pub fn stop(&mut self) {
        *self = Self::Idle;
    }

    /// Whether text is being captured.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing(_))
    }

    /// Append trimmed text if capturing.
    pub fn push(&mut self, text: &str) {
        if let Self::Capturing(buffer) = self {
            buffer.push_str(text.trim());
        }
    }

    /// Take the buffered text and stop capturing.
    ///
    /// Returns `None` when not capturing.
    pub fn flush(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Capturing(buffer) => Some(buffer),
            Self::Idle => None,
        }
    }
}
