//! In-memory remote store.
//!
//! [`MemoryStore`] holds committed objects; [`MemorySession`] is one
//! connection to it with its own transaction and history flag, so several
//! sessions can work on different objects concurrently.

use crate::mql::Interpreter;
use admsync_engine::{RemoteSession, SessionError, SessionResult};
use admsync_model::{FieldTarget, KindDescriptor, ObjectAddress, ObjectShape, PropertyMap};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Identity of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKey {
    /// Admin object.
    Admin {
        /// Kind name.
        kind: String,
        /// Object name.
        name: String,
    },
    /// Business object.
    Business {
        /// Business type.
        business_type: String,
        /// Base name.
        name: String,
        /// Revision.
        revision: String,
    },
}

impl ObjectKey {
    /// Key of an admin object.
    pub fn admin(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Admin {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Key of the object `name` of a kind, as addressed by the synchronizer.
    pub fn for_name(descriptor: &KindDescriptor, name: &str) -> Self {
        match ObjectAddress::for_name(descriptor, name) {
            ObjectAddress::Business {
                business_type,
                name,
                revision,
            } => Self::Business {
                business_type,
                name,
                revision,
            },
            _ => Self::admin(&descriptor.kind_name, name),
        }
    }

    /// Key for a name-based address; `None` for object ids.
    pub fn from_address(address: &ObjectAddress) -> Option<Self> {
        match address {
            ObjectAddress::Named { kind, name, .. } => Some(Self::admin(kind, name)),
            ObjectAddress::Business {
                business_type,
                name,
                revision,
            } => Some(Self::Business {
                business_type: business_type.clone(),
                name: name.clone(),
                revision: revision.clone(),
            }),
            ObjectAddress::ObjectId(_) => None,
        }
    }

    /// Returns true for business objects.
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }
}

/// State of one stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    /// Description.
    pub description: String,
    /// Hidden flag.
    pub hidden: bool,
    /// Properties.
    pub properties: PropertyMap,
    /// Kind-specific fields.
    pub fields: BTreeMap<String, String>,
    /// Business attribute values.
    pub attributes: BTreeMap<String, String>,
    /// Business vault.
    pub vault: Option<String>,
    /// Business internal id.
    pub object_id: Option<String>,
    /// Statements recorded while history was enabled.
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    pub(crate) objects: BTreeMap<ObjectKey, StoredObject>,
}

impl StoreState {
    pub(crate) fn resolve(&self, address: &ObjectAddress) -> Option<ObjectKey> {
        match address {
            ObjectAddress::ObjectId(id) => self
                .objects
                .iter()
                .find(|(_, object)| object.object_id.as_deref() == Some(id.as_str()))
                .map(|(key, _)| key.clone()),
            _ => ObjectKey::from_address(address).filter(|key| self.objects.contains_key(key)),
        }
    }
}

/// A shared in-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
    kinds: Arc<RwLock<Vec<KindDescriptor>>>,
    ids: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind so its fields and address suffix are understood.
    pub fn with_kind(self, descriptor: KindDescriptor) -> Self {
        self.kinds.write().push(descriptor);
        self
    }

    /// Opens a new session.
    pub fn session(&self) -> MemorySession {
        MemorySession::new(self.clone())
    }

    /// Runs a script outside any transaction, with history enabled.
    pub fn run(&self, script: &str) -> SessionResult<String> {
        self.session().execute(script)
    }

    /// Returns a committed object.
    pub fn get(&self, key: &ObjectKey) -> Option<StoredObject> {
        self.state.read().objects.get(key).cloned()
    }

    /// Number of committed objects.
    pub fn len(&self) -> usize {
        self.state.read().objects.len()
    }

    /// Returns true if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.state.read().objects.is_empty()
    }

    /// Renders the committed export document of an object.
    pub fn export_document(&self, key: &ObjectKey) -> Option<String> {
        let state = self.state.read();
        let object = state.objects.get(key)?;
        Some(render(key, object, &self.kinds.read()))
    }

    fn execute_on(
        &self,
        state: &mut StoreState,
        touched: &mut BTreeSet<ObjectKey>,
        history: bool,
        script: &str,
    ) -> SessionResult<String> {
        let kinds = self.kinds.read();
        Interpreter::new(state, &kinds, &self.ids, history, touched).run(script)
    }

    fn merge(&self, staged: &StoreState, touched: &BTreeSet<ObjectKey>) {
        let mut state = self.state.write();
        for key in touched {
            match staged.objects.get(key) {
                Some(object) => {
                    state.objects.insert(key.clone(), object.clone());
                }
                None => {
                    state.objects.remove(key);
                }
            }
        }
    }
}

#[derive(Debug)]
struct Staged {
    state: StoreState,
    touched: BTreeSet<ObjectKey>,
}

#[derive(Debug)]
struct SessionState {
    staged: Option<Staged>,
    history: bool,
    script_failures: Vec<(String, String)>,
    call_failures: BTreeMap<&'static str, String>,
    executed: Vec<String>,
}

/// One connection to a [`MemoryStore`].
///
/// Statements run against a private copy while a transaction is open;
/// commit publishes the objects the transaction touched.
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
    inner: Mutex<SessionState>,
}

impl MemorySession {
    fn new(store: MemoryStore) -> Self {
        Self {
            store,
            inner: Mutex::new(SessionState {
                staged: None,
                history: true,
                script_failures: Vec::new(),
                call_failures: BTreeMap::new(),
                executed: Vec::new(),
            }),
        }
    }

    /// Fails any script containing `pattern` before it runs.
    pub fn fail_on_script(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.inner
            .lock()
            .script_failures
            .push((pattern.into(), message.into()));
    }

    /// Makes a session call (`"export"`, `"begin"`, `"commit"`,
    /// `"enable_history"`, ...) fail.
    pub fn fail_call(&self, call: &'static str, message: impl Into<String>) {
        self.inner.lock().call_failures.insert(call, message.into());
    }

    /// Returns true if modifications are recorded in history.
    pub fn history_enabled(&self) -> bool {
        self.inner.lock().history
    }

    /// Returns true while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.inner.lock().staged.is_some()
    }

    /// Scripts passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.lock().executed.clone()
    }

    /// The store this session is connected to.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn check(&self, call: &'static str) -> SessionResult<()> {
        match self.inner.lock().call_failures.get(call) {
            Some(message) => Err(SessionError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl RemoteSession for MemorySession {
    fn export(&self, address: &ObjectAddress) -> SessionResult<Option<String>> {
        self.check("export")?;
        let inner = self.inner.lock();
        let kinds = self.store.kinds.read();
        let render_from = |state: &StoreState| {
            let key = state.resolve(address)?;
            state.objects.get(&key).map(|o| render(&key, o, &kinds))
        };
        Ok(match &inner.staged {
            Some(staged) => render_from(&staged.state),
            None => {
                let state = self.store.state.read();
                render_from(&*state)
            }
        })
    }

    fn version_marker(&self, address: &ObjectAddress, property: &str) -> SessionResult<String> {
        self.check("version_marker")?;
        let state = self.store.state.read();
        Ok(state
            .resolve(address)
            .and_then(|key| state.objects.get(&key))
            .and_then(|object| object.properties.value_of(property))
            .unwrap_or_default()
            .to_string())
    }

    fn begin(&self) -> SessionResult<()> {
        self.check("begin")?;
        let mut inner = self.inner.lock();
        if inner.staged.is_some() {
            return Err(SessionError::new("Error: #1500046: transaction already active"));
        }
        inner.staged = Some(Staged {
            state: self.store.state.read().clone(),
            touched: BTreeSet::new(),
        });
        Ok(())
    }

    fn execute(&self, script: &str) -> SessionResult<String> {
        self.check("execute")?;
        let mut inner = self.inner.lock();
        inner.executed.push(script.to_string());
        if let Some((_, message)) = inner
            .script_failures
            .iter()
            .find(|(pattern, _)| script.contains(pattern.as_str()))
        {
            return Err(SessionError::new(message.clone()));
        }

        let history = inner.history;
        match &mut inner.staged {
            Some(staged) => {
                self.store
                    .execute_on(&mut staged.state, &mut staged.touched, history, script)
            }
            None => {
                let mut state = self.store.state.read().clone();
                let mut touched = BTreeSet::new();
                let output = self.store.execute_on(&mut state, &mut touched, history, script)?;
                self.store.merge(&state, &touched);
                Ok(output)
            }
        }
    }

    fn commit(&self) -> SessionResult<()> {
        self.check("commit")?;
        let staged = self
            .inner
            .lock()
            .staged
            .take()
            .ok_or_else(|| SessionError::new("Error: #1500047: no transaction active"))?;
        self.store.merge(&staged.state, &staged.touched);
        Ok(())
    }

    fn abort(&self) -> SessionResult<()> {
        self.check("abort")?;
        self.inner
            .lock()
            .staged
            .take()
            .map(|_| ())
            .ok_or_else(|| SessionError::new("Error: #1500047: no transaction active"))
    }

    fn disable_history(&self) -> SessionResult<()> {
        self.check("disable_history")?;
        self.inner.lock().history = false;
        Ok(())
    }

    fn enable_history(&self) -> SessionResult<()> {
        self.check("enable_history")?;
        self.inner.lock().history = true;
        Ok(())
    }
}

/// Indented XML writer for export documents.
struct ExportWriter {
    out: String,
    depth: usize,
}

impl ExportWriter {
    fn new() -> Self {
        Self {
            out: String::from(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE ematrix SYSTEM \"ematrix.dtd\">\n",
            ),
            depth: 0,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn open(&mut self, tag: &str) {
        self.indent();
        self.out.push_str(&format!("<{tag}>\n"));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str(&format!("</{tag}>\n"));
    }

    fn empty(&mut self, tag: &str) {
        self.indent();
        self.out.push_str(&format!("<{tag}/>\n"));
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.indent();
        self.out
            .push_str(&format!("<{tag}>{}</{tag}>\n", escape_text(text)));
    }

    /// Writes `text` at a nested path, opening each container.
    fn nested(&mut self, segments: &[String], text: &str) {
        let Some((last, containers)) = segments.split_last() else {
            return;
        };
        for segment in containers {
            self.open(segment);
        }
        self.leaf(last, text);
        for segment in containers.iter().rev() {
            self.close(segment);
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render(key: &ObjectKey, object: &StoredObject, kinds: &[KindDescriptor]) -> String {
    let mut w = ExportWriter::new();
    w.open("ematrix");
    w.open("creationProperties");
    w.leaf("release", "memory");
    w.close("creationProperties");

    let descriptor = match key {
        ObjectKey::Admin { kind, .. } => kinds
            .iter()
            .find(|d| d.shape == ObjectShape::Admin && &d.kind_name == kind),
        ObjectKey::Business { business_type, .. } => kinds.iter().find(|d| {
            matches!(&d.shape, ObjectShape::Business { business_type: t } if t == business_type)
        }),
    };

    let wrapper = match key {
        ObjectKey::Admin { kind, name } => {
            let wrapper = format!("{}Def", kind.replace(' ', ""));
            w.open(&wrapper);
            w.open("adminProperties");
            w.leaf("name", name);
            if !object.description.is_empty() {
                w.leaf("description", &object.description);
            }
            if object.hidden {
                w.empty("hidden");
            }
            render_properties(&mut w, &object.properties);
            w.close("adminProperties");
            wrapper
        }
        ObjectKey::Business {
            business_type,
            name,
            revision,
        } => {
            w.open("businessObject");
            w.open("businessObjectRef");
            w.leaf("objectType", business_type);
            w.leaf("objectName", name);
            w.leaf("objectRevision", revision);
            w.close("businessObjectRef");
            if let Some(id) = &object.object_id {
                w.leaf("objectId", id);
            }
            if let Some(vault) = &object.vault {
                w.leaf("vaultRef", vault);
            }
            w.leaf("description", &object.description);
            if !object.attributes.is_empty() {
                w.open("attributeList");
                for (name, value) in &object.attributes {
                    w.open("attribute");
                    w.leaf("name", name);
                    w.leaf("string", value);
                    w.close("attribute");
                }
                w.close("attributeList");
            }
            "businessObject".to_string()
        }
    };

    if let Some(descriptor) = descriptor {
        for binding in &descriptor.fields {
            if let FieldTarget::Field(field) = &binding.target {
                if let Some(value) = object.fields.get(field) {
                    w.nested(binding.path.segments(), value);
                }
            }
        }
    }

    w.close(&wrapper);
    w.close("ematrix");
    w.finish()
}

fn render_properties(w: &mut ExportWriter, properties: &PropertyMap) {
    if properties.is_empty() {
        return;
    }
    w.open("propertyList");
    for (_, property) in properties.iter() {
        w.open("property");
        w.leaf("name", &property.name);
        if let Some(flags) = &property.flags {
            w.leaf("flags", flags);
        }
        if property.is_reference() {
            w.open("adminRef");
            w.leaf("adminType", property.referenced_kind.as_deref().unwrap_or(""));
            w.leaf("adminName", property.referenced_name.as_deref().unwrap_or(""));
            w.close("adminRef");
        }
        if let Some(value) = &property.value {
            w.leaf("value", value);
        }
        w.close("property");
    }
    w.close("propertyList");
}

#[cfg(test)]
mod tests {
    use super::*;
    use admsync_model::{decode_object_str, FileNaming};

    fn attribute() -> KindDescriptor {
        KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
            .with_field("/primitiveType", "type")
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_kind(attribute())
    }

    #[test]
    fn add_and_export() {
        let store = store();
        store
            .run(r#"add attribute 'Weight' type real description "a < b" property "X" value "1";"#)
            .unwrap();

        let key = ObjectKey::admin("attribute", "Weight");
        let document = store.export_document(&key).unwrap();
        let object = decode_object_str(&attribute(), &document).unwrap();
        assert_eq!(object.name(), "Weight");
        assert_eq!(object.admin().description, "a < b");
        assert_eq!(object.admin().fields.get("type").map(String::as_str), Some("real"));
        assert_eq!(object.admin().properties.value_of("X"), Some("1"));
        assert_eq!(store.get(&key).unwrap().history.len(), 1);
    }

    #[test]
    fn abort_discards_changes() {
        let store = store();
        let session = store.session();
        session.begin().unwrap();
        session.execute("add attribute 'Temp';").unwrap();
        assert!(session.in_transaction());
        assert!(store.is_empty());

        session.abort().unwrap();
        assert!(!session.in_transaction());
        assert!(store.is_empty());
    }

    #[test]
    fn commit_publishes_touched_objects() {
        let store = store();
        let session = store.session();
        session.begin().unwrap();
        session.execute("add attribute 'A'; add attribute 'B';").unwrap();
        session.commit().unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn script_mode_substitutes_variables() {
        let store = store();
        let output = store
            .run(
                "tcl;\neval {\nset NAME \"Weight\"\nmql add attribute $NAME description \"x\";\nputs \"done $NAME\"\n}\nexit;\n",
            )
            .unwrap();
        assert_eq!(output, "done Weight\n");
        assert!(store.get(&ObjectKey::admin("attribute", "Weight")).is_some());
    }

    #[test]
    fn script_errors_carry_message() {
        let store = store();
        let err = store.run("tcl;\nerror \"custom failure\"\nexit;\n").unwrap_err();
        assert_eq!(err.message, "custom failure");

        let err = store.run("mod attribute 'Nope' hidden;").unwrap_err();
        assert!(err.message.contains("does not exist"));

        store.run("add attribute 'W';").unwrap();
        let err = store.run("mod attribute 'W' bogus 1;").unwrap_err();
        assert!(err.message.contains("invalid modifier 'bogus'"));
    }

    #[test]
    fn business_objects_by_id() {
        let trigger = KindDescriptor::business("Trigger", FileNaming::default());
        let store = MemoryStore::new().with_kind(trigger.clone());
        store
            .run("add bus 'Trigger' 'Check' '1' vault 'Admin' 'Line 1' 'a';")
            .unwrap();

        let key = ObjectKey::for_name(&trigger, "Check________1");
        let id = store.get(&key).unwrap().object_id.unwrap();
        store.run(&format!("mod bus {id} 'Line 2' 'b';")).unwrap();

        let object = decode_object_str(&trigger, &store.export_document(&key).unwrap()).unwrap();
        let business = object.business().unwrap();
        assert_eq!(business.object_id.as_deref(), Some(id.as_str()));
        assert_eq!(business.vault.as_deref(), Some("Admin"));
        assert_eq!(business.attributes.len(), 2);
    }

    #[test]
    fn history_flag_controls_recording() {
        let store = store();
        let session = store.session();
        session.disable_history().unwrap();
        session.execute("add attribute 'Quiet';").unwrap();
        session.enable_history().unwrap();
        assert!(store
            .get(&ObjectKey::admin("attribute", "Quiet"))
            .unwrap()
            .history
            .is_empty());
    }
}
