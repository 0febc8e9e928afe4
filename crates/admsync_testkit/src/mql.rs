//! A small interpreter for the statements sync scripts use.
//!
//! Supported outside script mode (statements end with `;`, an optional
//! leading `escape` is ignored):
//!
//! | Statement | Effect |
//! |-----------|--------|
//! | `add <address> <clauses>` | creates an object |
//! | `mod <address> <clauses>` | modifies an object |
//! | `delete <address>` | deletes an object |
//! | `verbose on` / `verbose off` | no-op |
//! | `tcl` | enters script mode until `exit` |
//!
//! Script mode is line oriented and understands `set`, `mql`, `puts` and
//! `error`, with `$NAME` substitution.

use crate::store::{ObjectKey, StoreState, StoredObject};
use admsync_engine::SessionError;
use admsync_model::{KindDescriptor, ObjectAddress, ObjectShape, Property};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

type RunResult<T> = Result<T, SessionError>;

fn syntax(message: impl std::fmt::Display) -> SessionError {
    SessionError::new(format!("Error: #1900068: {message}"))
}

/// One word of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Word {
    pub text: String,
    pub quoted: bool,
}

impl Word {
    fn keyword(&self) -> Option<&str> {
        (!self.quoted).then_some(self.text.as_str())
    }
}

/// Splits a statement into words, honoring single and double quotes.
pub(crate) fn split_words(statement: &str) -> RunResult<Vec<Word>> {
    let mut words = Vec::new();
    let mut chars = statement.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut text = String::new();
        if c == '"' || c == '\'' {
            chars.next();
            let mut closed = false;
            while let Some(next) = chars.next() {
                match next {
                    '\\' => text.extend(chars.next()),
                    q if q == c => {
                        closed = true;
                        break;
                    }
                    other => text.push(other),
                }
            }
            if !closed {
                return Err(syntax("unterminated quote"));
            }
            words.push(Word { text, quoted: true });
        } else {
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                text.push(next);
                chars.next();
            }
            words.push(Word {
                text,
                quoted: false,
            });
        }
    }
    Ok(words)
}

/// Splits off the next `;`-terminated statement.
fn next_statement(input: &str) -> Option<(&str, &str)> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', Some(_)) => escaped = true,
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (';', None) => return Some((input[..i].trim(), &input[i + 1..])),
            _ => {}
        }
    }
    let rest = input.trim();
    (!rest.is_empty()).then_some((rest, ""))
}

fn is_object_id(text: &str) -> bool {
    text.contains('.') && text.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Executes scripts against a store state.
pub(crate) struct Interpreter<'a> {
    state: &'a mut StoreState,
    kinds: &'a [KindDescriptor],
    ids: &'a AtomicU64,
    history: bool,
    touched: &'a mut BTreeSet<ObjectKey>,
    variables: BTreeMap<String, String>,
    output: String,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        state: &'a mut StoreState,
        kinds: &'a [KindDescriptor],
        ids: &'a AtomicU64,
        history: bool,
        touched: &'a mut BTreeSet<ObjectKey>,
    ) -> Self {
        Self {
            state,
            kinds,
            ids,
            history,
            touched,
            variables: BTreeMap::new(),
            output: String::new(),
        }
    }

    /// Runs a script and returns what it printed.
    pub(crate) fn run(mut self, script: &str) -> RunResult<String> {
        let mut rest = script;
        while let Some((statement, tail)) = next_statement(rest) {
            rest = tail;
            let words = split_words(statement)?;
            let words = match words.split_first() {
                Some((first, tail)) if first.keyword() == Some("escape") => tail,
                _ => &words[..],
            };
            match words {
                [] => {}
                [only] if only.keyword() == Some("tcl") => rest = self.run_script_mode(rest)?,
                _ => self.statement(words, statement)?,
            }
        }
        Ok(self.output)
    }

    fn run_script_mode<'s>(&mut self, input: &'s str) -> RunResult<&'s str> {
        let mut consumed = 0;
        for line in input.split_inclusive('\n') {
            consumed += line.len();
            let line = line.trim();
            match line {
                "" | "eval {" | "}" => {}
                "exit" | "exit;" => return Ok(&input[consumed..]),
                _ if line.starts_with('#') => {}
                _ => self.command(line)?,
            }
        }
        Ok("")
    }

    fn command(&mut self, line: &str) -> RunResult<()> {
        let (command, args) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let args = args.trim();
        match command {
            "set" => {
                let (name, value) = args.split_once(char::is_whitespace).ok_or_else(|| {
                    SessionError::new("wrong # args: should be \"set varName value\"")
                })?;
                let value = self.word(value.trim())?;
                self.variables.insert(name.to_string(), value);
            }
            "mql" => {
                let statements = self.substitute(args)?;
                let mut rest = statements.as_str();
                while let Some((statement, tail)) = next_statement(rest) {
                    rest = tail;
                    let words = split_words(statement)?;
                    if !words.is_empty() {
                        self.statement(&words, statement)?;
                    }
                }
            }
            "puts" => {
                let text = self.word(args)?;
                self.output.push_str(&text);
                self.output.push('\n');
            }
            "error" => return Err(SessionError::new(self.word(args)?)),
            other => {
                return Err(SessionError::new(format!(
                    "invalid command name \"{other}\""
                )))
            }
        }
        Ok(())
    }

    /// Evaluates one script-mode word: strips quotes, resolves escapes and
    /// substitutes variables.
    fn word(&self, raw: &str) -> RunResult<String> {
        let inner = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw);
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => value.extend(chars.next()),
                '$' => value.push_str(self.variable(&mut chars)?),
                other => value.push(other),
            }
        }
        Ok(value)
    }

    /// Substitutes variables in a statement, leaving its quoting intact.
    fn substitute(&self, raw: &str) -> RunResult<String> {
        let mut value = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'$') => value.extend(chars.next()),
                '$' => value.push_str(self.variable(&mut chars)?),
                other => value.push(other),
            }
        }
        Ok(value)
    }

    fn variable(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    ) -> RunResult<&str> {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Ok("$");
        }
        self.variables
            .get(&name)
            .map(String::as_str)
            .ok_or_else(|| SessionError::new(format!("can't read \"{name}\": no such variable")))
    }

    fn statement(&mut self, words: &[Word], text: &str) -> RunResult<()> {
        let Some((command, args)) = words.split_first() else {
            return Ok(());
        };
        match command.keyword() {
            Some("add") => self.add(args, text),
            Some("mod" | "modify") => self.modify(args, text),
            Some("delete") => self.delete(args),
            Some("verbose") => Ok(()),
            _ => Err(syntax(format!("unknown command '{}'", command.text))),
        }
    }

    fn parse_address<'w>(&self, words: &'w [Word]) -> RunResult<(ObjectAddress, &'w [Word])> {
        let Some((kind, rest)) = words.split_first() else {
            return Err(syntax("missing object type"));
        };
        if kind.keyword() == Some("bus") {
            return match rest {
                [id, tail @ ..] if !id.quoted && is_object_id(&id.text) => {
                    Ok((ObjectAddress::ObjectId(id.text.clone()), tail))
                }
                [business_type, name, revision, tail @ ..] => Ok((
                    ObjectAddress::Business {
                        business_type: business_type.text.clone(),
                        name: name.text.clone(),
                        revision: revision.text.clone(),
                    },
                    tail,
                )),
                _ => Err(syntax("business object requires type, name and revision")),
            };
        }

        let Some((name, mut rest)) = rest.split_first() else {
            return Err(syntax(format!("missing {} name", kind.text)));
        };
        let mut suffix = None;
        if let Some(expected) = self.admin_kind(&kind.text).and_then(|d| d.address_suffix.as_ref()) {
            if let Some((word, tail)) = rest.split_first() {
                if word.keyword() == Some(expected.as_str()) {
                    suffix = Some(expected.clone());
                    rest = tail;
                }
            }
        }
        Ok((
            ObjectAddress::Named {
                kind: kind.text.clone(),
                name: name.text.clone(),
                suffix,
            },
            rest,
        ))
    }

    fn admin_kind(&self, kind: &str) -> Option<&KindDescriptor> {
        self.kinds
            .iter()
            .find(|d| d.shape == ObjectShape::Admin && d.kind_name == kind)
    }

    fn descriptor_for(&self, key: &ObjectKey) -> Option<&KindDescriptor> {
        match key {
            ObjectKey::Admin { kind, .. } => self.admin_kind(kind),
            ObjectKey::Business { business_type, .. } => self.kinds.iter().find(|d| {
                matches!(&d.shape, ObjectShape::Business { business_type: t } if t == business_type)
            }),
        }
    }

    fn add(&mut self, args: &[Word], text: &str) -> RunResult<()> {
        let (address, clauses) = self.parse_address(args)?;
        let key = ObjectKey::from_address(&address)
            .ok_or_else(|| syntax(format!("cannot add {address}")))?;
        if self.state.objects.contains_key(&key) {
            return Err(syntax(format!("{address} already exists")));
        }
        let mut object = StoredObject::default();
        if key.is_business() {
            let id = self.ids.fetch_add(1, Ordering::SeqCst);
            object.object_id = Some(format!("{}.7.{id}.0", 20000 + id));
        }
        self.apply(&key, &mut object, clauses)?;
        self.record(&mut object, text);
        self.touched.insert(key.clone());
        self.state.objects.insert(key, object);
        Ok(())
    }

    fn modify(&mut self, args: &[Word], text: &str) -> RunResult<()> {
        let (address, clauses) = self.parse_address(args)?;
        let key = self.existing(&address)?;
        let mut object = self.state.objects.get(&key).cloned().unwrap_or_default();
        self.apply(&key, &mut object, clauses)?;
        self.record(&mut object, text);
        self.touched.insert(key.clone());
        self.state.objects.insert(key, object);
        Ok(())
    }

    fn delete(&mut self, args: &[Word]) -> RunResult<()> {
        let (address, rest) = self.parse_address(args)?;
        if !rest.is_empty() {
            return Err(syntax("unexpected words after address"));
        }
        let key = self.existing(&address)?;
        self.state.objects.remove(&key);
        self.touched.insert(key);
        Ok(())
    }

    fn existing(&self, address: &ObjectAddress) -> RunResult<ObjectKey> {
        self.state
            .resolve(address)
            .ok_or_else(|| syntax(format!("{address} does not exist")))
    }

    fn record(&self, object: &mut StoredObject, text: &str) {
        if self.history {
            object.history.push(text.to_string());
        }
    }

    fn apply(&self, key: &ObjectKey, object: &mut StoredObject, words: &[Word]) -> RunResult<()> {
        let descriptor = self.descriptor_for(key);
        let value = |i: usize| -> RunResult<String> {
            words
                .get(i)
                .map(|w| w.text.clone())
                .ok_or_else(|| syntax("missing value"))
        };
        let is = |i: usize, keyword: &str| words.get(i).and_then(Word::keyword) == Some(keyword);

        let mut i = 0;
        while i < words.len() {
            match words[i].keyword() {
                Some("description") => {
                    object.description = value(i + 1)?;
                    i += 2;
                }
                Some("hidden") => {
                    object.hidden = true;
                    i += 1;
                }
                Some("!hidden" | "nothidden") => {
                    object.hidden = false;
                    i += 1;
                }
                Some("vault") if key.is_business() => {
                    object.vault = Some(value(i + 1)?);
                    i += 2;
                }
                Some("property") => {
                    let mut property = Property {
                        name: value(i + 1)?,
                        ..Property::default()
                    };
                    i += 2;
                    if is(i, "to") {
                        property = property.with_reference(value(i + 1)?, value(i + 2)?);
                        i += 3;
                    }
                    if is(i, "value") {
                        property.value = Some(value(i + 1)?);
                        i += 2;
                    }
                    object.properties.insert(property);
                }
                Some("remove") if is(i + 1, "property") => {
                    let mut property = Property {
                        name: value(i + 2)?,
                        ..Property::default()
                    };
                    i += 3;
                    if is(i, "to") {
                        property = property.with_reference(value(i + 1)?, value(i + 2)?);
                        i += 3;
                    }
                    object.properties.remove(&property.key());
                }
                _ => {
                    let name = words[i].text.clone();
                    let text = value(i + 1)?;
                    i += 2;
                    let is_field = descriptor.is_some_and(|d| d.has_field(&name));
                    if is_field {
                        if text.is_empty() {
                            object.fields.remove(&name);
                        } else {
                            object.fields.insert(name, text);
                        }
                    } else if key.is_business() {
                        object.attributes.insert(name, text);
                    } else {
                        return Err(syntax(format!("invalid modifier '{name}'")));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<(String, bool)> {
        split_words(text)
            .unwrap()
            .into_iter()
            .map(|w| (w.text, w.quoted))
            .collect()
    }

    #[test]
    fn split_quoted_words() {
        assert_eq!(
            words(r#"mod attribute 'Net Weight' description "say \"hi\"""#),
            vec![
                ("mod".to_string(), false),
                ("attribute".to_string(), false),
                ("Net Weight".to_string(), true),
                ("description".to_string(), false),
                ("say \"hi\"".to_string(), true),
            ]
        );
        assert!(split_words("mod 'open").is_err());
    }

    #[test]
    fn statements_split_outside_quotes() {
        let (first, rest) = next_statement("mod a 'x;y' hidden; delete a 'x';").unwrap();
        assert_eq!(first, "mod a 'x;y' hidden");
        let (second, rest) = next_statement(rest).unwrap();
        assert_eq!(second, "delete a 'x'");
        assert!(next_statement(rest).is_none());
    }

    #[test]
    fn object_ids() {
        assert!(is_object_id("20001.7.1.0"));
        assert!(!is_object_id("Part"));
        assert!(!is_object_id("12"));
    }
}
