//! Path-accumulating decoder state machine.

use crate::error::{DecodeError, DecodeResult};
use crate::path::{DecodedEvent, LogicalPath};

/// Number of outer stack levels stripped from every logical path.
///
/// The document root and its wrapper child never appear in a path.
pub const WRAPPER_DEPTH: usize = 2;

/// Wrapper tag whose whole subtree is bookkeeping and never emitted.
pub const CREATION_PROPERTIES: &str = "creationProperties";

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A pull-style notification from the document reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An element opened.
    Open(String),
    /// Character data inside the current element.
    Text(String),
    /// The current element closed.
    Close,
}

/// Emission state of the innermost open element.
#[derive(Debug)]
enum Frame {
    /// Not emitted yet; holds the text buffered so far.
    Pending(String),
    /// Already emitted (or nothing is open).
    Emitted,
}

/// Converts a token stream into [`DecodedEvent`]s.
///
/// Every element is emitted exactly once: when its first child opens
/// (flush on descent) or when it closes, whichever comes first. The
/// single-emission rule is carried by [`Frame`]: leaving `Pending` is the
/// only way an event is produced, and nothing returns a frame to `Pending`
/// except opening a new element.
///
/// # Example
///
/// ```
/// use admsync_decode::{PathDecoder, Token};
///
/// let mut decoder = PathDecoder::new();
/// let mut events = Vec::new();
/// for token in [
///     Token::Open("ematrix".into()),
///     Token::Open("attributeDef".into()),
///     Token::Open("name".into()),
///     Token::Text("Weight".into()),
///     Token::Close,
///     Token::Close,
///     Token::Close,
/// ] {
///     events.extend(decoder.feed(token).unwrap());
/// }
/// decoder.finish().unwrap();
///
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].path.to_string(), "/name");
/// assert_eq!(events[0].text.as_deref(), Some("Weight"));
/// ```
#[derive(Debug)]
pub struct PathDecoder {
    stack: Vec<String>,
    top: Frame,
    max_depth: usize,
}

impl PathDecoder {
    /// Creates a decoder with the default depth limit.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Creates a decoder that rejects documents deeper than `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            top: Frame::Emitted,
            max_depth,
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Consumes one token, returning the event it completes, if any.
    pub fn feed(&mut self, token: Token) -> DecodeResult<Option<DecodedEvent>> {
        match token {
            Token::Open(tag) => {
                if self.stack.len() >= self.max_depth {
                    return Err(DecodeError::TooDeep {
                        max_depth: self.max_depth,
                    });
                }
                let event = self.flush();
                self.stack.push(tag);
                self.top = Frame::Pending(String::new());
                Ok(event)
            }
            Token::Text(text) => {
                // Text after a nested child closed lands on an emitted frame.
                if let Frame::Pending(buffer) = &mut self.top {
                    buffer.push_str(&text);
                }
                Ok(None)
            }
            Token::Close => {
                if self.stack.is_empty() {
                    return Err(DecodeError::UnbalancedClose);
                }
                let event = self.flush();
                self.stack.pop();
                Ok(event)
            }
        }
    }

    /// Checks that every opened element was closed.
    pub fn finish(self) -> DecodeResult<()> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedEof {
                open: self.stack.len(),
            })
        }
    }

    fn flush(&mut self) -> Option<DecodedEvent> {
        match std::mem::replace(&mut self.top, Frame::Emitted) {
            Frame::Pending(text) => self.event_for_top(text),
            Frame::Emitted => None,
        }
    }

    fn event_for_top(&self, text: String) -> Option<DecodedEvent> {
        if self.stack.len() <= WRAPPER_DEPTH || self.stack[1] == CREATION_PROPERTIES {
            return None;
        }
        let path = LogicalPath::new(self.stack[WRAPPER_DEPTH..].iter().cloned());
        if text.trim().is_empty() {
            Some(DecodedEvent::structural(path))
        } else {
            Some(DecodedEvent::leaf(path, text))
        }
    }
}

impl Default for PathDecoder {
    fn default() -> Self {
        Self::new()
    }
}
