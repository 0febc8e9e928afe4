//! Document type declarations and entity resolution.
//!
//! Export documents declare an external DTD. It is never fetched: the
//! declared subset is handed to an [`ExternalSubsetResolver`], whose default
//! implementation returns an empty substitute source. General entities
//! declared in the internal subset (or in a substitute source) are honored
//! when text is unescaped.

use std::collections::HashMap;

/// Supplies a substitute for an external DTD subset.
pub trait ExternalSubsetResolver: Send + Sync {
    /// Returns the substitute source for the declared subset.
    fn resolve(&self, public_id: Option<&str>, system_id: &str) -> String;
}

/// Resolver that substitutes every external subset with an empty source.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySubset;

impl ExternalSubsetResolver for EmptySubset {
    fn resolve(&self, public_id: Option<&str>, system_id: &str) -> String {
        tracing::trace!(?public_id, system_id, "skipping external DTD subset");
        String::new()
    }
}

/// Parsed `<!DOCTYPE ...>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocType {
    /// Declared root element name.
    pub root: String,
    /// Public identifier, if any.
    pub public_id: Option<String>,
    /// System identifier (the external subset location), if any.
    pub system_id: Option<String>,
    /// Text between `[` and `]`, if any.
    pub internal_subset: Option<String>,
}

impl DocType {
    /// Parses the content of a DOCTYPE declaration (the text after
    /// `<!DOCTYPE` and before the closing `>`).
    pub fn parse(content: &str) -> Self {
        let (head, internal_subset) = match (content.find('['), content.rfind(']')) {
            (Some(open), Some(close)) if open < close => {
                (&content[..open], Some(content[open + 1..close].to_string()))
            }
            _ => (content, None),
        };

        let mut scanner = Scanner::new(head);
        let root = scanner.word().unwrap_or_default().to_string();
        let (public_id, system_id) = match scanner.word() {
            Some("SYSTEM") => (None, scanner.quoted().map(str::to_string)),
            Some("PUBLIC") => {
                let public = scanner.quoted().map(str::to_string);
                (public, scanner.quoted().map(str::to_string))
            }
            _ => (None, None),
        };

        Self {
            root,
            public_id,
            system_id,
            internal_subset,
        }
    }
}

/// Named replacement text for `&name;` references.
#[derive(Debug, Clone)]
pub struct EntityTable {
    entries: HashMap<String, String>,
}

impl EntityTable {
    /// Creates a table holding the five predefined XML entities.
    pub fn new() -> Self {
        let entries = [
            ("lt", "<"),
            ("gt", ">"),
            ("amp", "&"),
            ("apos", "'"),
            ("quot", "\""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { entries }
    }

    /// Looks up the replacement text for an entity.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of known entities, predefined ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers the internal general entities declared in `source`.
    ///
    /// Parameter entities (`<!ENTITY % ...>`) and external entities
    /// (`SYSTEM`/`PUBLIC`) are skipped. The first declaration of a name wins,
    /// as in XML.
    pub fn declare_from(&mut self, source: &str) {
        let mut rest = source;
        while let Some(start) = rest.find("<!ENTITY") {
            let body = &rest[start + "<!ENTITY".len()..];
            let end = closing_bracket(body).unwrap_or(body.len());
            self.declare_one(&body[..end]);
            rest = &body[end..];
        }
    }

    fn declare_one(&mut self, declaration: &str) {
        let mut scanner = Scanner::new(declaration);
        let Some(name) = scanner.word() else {
            return;
        };
        if name == "%" {
            return;
        }
        let Some(value) = scanner.quoted() else {
            return;
        };
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the `>` that ends a declaration, skipping quoted literals.
fn closing_bracket(text: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Whitespace-separated word and quoted-literal scanner.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn word(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(|c: char| c == '"' || c == '\'') {
            return None;
        }
        let end = trimmed
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(trimmed.len());
        self.rest = &trimmed[end..];
        Some(&trimmed[..end])
    }

    fn quoted(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        let quote = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let body = &trimmed[1..];
        let end = body.find(quote)?;
        self.rest = &body[end + 1..];
        Some(&body[..end])
    }
}
