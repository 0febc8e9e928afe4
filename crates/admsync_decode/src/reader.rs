//! Token reader over export documents.

use crate::decoder::{PathDecoder, Token, DEFAULT_MAX_DEPTH};
use crate::entity::{DocType, EmptySubset, EntityTable, ExternalSubsetResolver};
use crate::error::{DecodeError, DecodeResult};
use crate::path::DecodedEvent;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

/// Configuration for reading export documents.
#[derive(Clone)]
pub struct DecodeConfig {
    /// Maximum element nesting depth.
    pub max_depth: usize,
    /// Substitutes declared external DTD subsets.
    pub resolver: Arc<dyn ExternalSubsetResolver>,
}

impl DecodeConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            resolver: Arc::new(EmptySubset),
        }
    }

    /// Sets the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the external subset resolver.
    pub fn with_resolver(mut self, resolver: impl ExternalSubsetResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeConfig")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Pulls [`Token`]s out of an XML export document.
///
/// Empty elements are expanded into an open/close pair, comments and
/// processing instructions are skipped, and CDATA sections are reported as
/// plain text.
pub struct ExportReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    entities: EntityTable,
    resolver: Arc<dyn ExternalSubsetResolver>,
    done: bool,
}

impl<R: BufRead> ExportReader<R> {
    /// Creates a reader with the default configuration.
    pub fn new(input: R) -> Self {
        Self::with_config(input, &DecodeConfig::default())
    }

    /// Creates a reader with the given configuration.
    pub fn with_config(input: R, config: &DecodeConfig) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            entities: EntityTable::new(),
            resolver: Arc::clone(&config.resolver),
            done: false,
        }
    }

    /// Returns the next token, or `None` at end of document.
    pub fn next_token(&mut self) -> DecodeResult<Option<Token>> {
        loop {
            if self.done {
                return Ok(None);
            }
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    self.done = true;
                    let position = self.reader.buffer_position().try_into().unwrap_or(u64::MAX);
                    return Err(DecodeError::malformed(position, err.to_string()));
                }
            };

            match event {
                Event::Start(start) => {
                    let qname = start.name();
                    let name = utf8(qname.as_ref())?;
                    return Ok(Some(Token::Open(name.to_string())));
                }
                Event::End(_) => return Ok(Some(Token::Close)),
                Event::Text(text) => {
                    let raw = utf8(&text)?;
                    return unescape(raw, &self.entities).map(|t| Some(Token::Text(t)));
                }
                Event::CData(data) => {
                    return Ok(Some(Token::Text(utf8(&data)?.to_string())));
                }
                Event::DocType(doctype) => {
                    let content = utf8(&doctype)?;
                    declare_doctype(&mut self.entities, self.resolver.as_ref(), content);
                }
                Event::Eof => {
                    self.done = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> DecodeResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

fn declare_doctype(
    entities: &mut EntityTable,
    resolver: &dyn ExternalSubsetResolver,
    content: &str,
) {
    let doctype = DocType::parse(content);
    // Internal declarations take precedence over the external subset.
    if let Some(subset) = &doctype.internal_subset {
        entities.declare_from(subset);
    }
    if let Some(system_id) = &doctype.system_id {
        let substitute = resolver.resolve(doctype.public_id.as_deref(), system_id);
        entities.declare_from(&substitute);
    }
}

fn unescape(raw: &str, entities: &EntityTable) -> DecodeResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut missing = None;
    let result = quick_xml::escape::unescape_with(raw, |name| {
        let found = entities.get(name);
        if found.is_none() {
            missing = Some(name.to_string());
        }
        found
    });
    match result {
        Ok(text) => Ok(text.into_owned()),
        Err(err) => Err(match missing {
            Some(name) => DecodeError::UnresolvedEntity { name },
            None => DecodeError::malformed(0, err.to_string()),
        }),
    }
}

/// Iterator of [`DecodedEvent`]s over an export document.
///
/// Stops after the first error.
pub struct EventStream<R> {
    reader: ExportReader<R>,
    decoder: Option<PathDecoder>,
}

impl<R: BufRead> EventStream<R> {
    /// Creates a stream over `input`.
    pub fn new(input: R, config: &DecodeConfig) -> Self {
        Self {
            reader: ExportReader::with_config(input, config),
            decoder: Some(PathDecoder::with_max_depth(config.max_depth)),
        }
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = DecodeResult<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder = self.decoder.as_mut()?;
        loop {
            let token = match self.reader.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => {
                    let decoder = self.decoder.take()?;
                    return decoder.finish().err().map(Err);
                }
                Err(err) => {
                    self.decoder = None;
                    return Some(Err(err));
                }
            };
            match decoder.feed(token) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(err) => {
                    self.decoder = None;
                    return Some(Err(err));
                }
            }
        }
    }
}
