//! Loaded schema documents and their shared-definitions container.

use std::cell::RefCell;
use std::rc::Rc;

use jsonptr::Pointer;
use jsonptr::resolve::Resolve;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::ResolveError;
use crate::reference::{REF_KEY, Reference, ReferenceKind};

/// A document shared between the store, the walker and the caller.
pub type DocumentRef = Rc<RefCell<Document>>;

/// The convention used by a document to hold its named, reusable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Shared types live under `/definitions`.
    JsonSchema,
    /// Shared types live under `/components/schemas`.
    OpenApi,
    /// No shared-definitions container was found.
    Unknown,
}

impl Dialect {
    /// Detects the dialect of a tree.
    ///
    /// `definitions` is checked first, then `components.schemas`. The checked
    /// node must be a mapping to match.
    pub fn detect(tree: &Value) -> Self {
        [Self::JsonSchema, Self::OpenApi]
            .into_iter()
            .find(|dialect| {
                dialect
                    .container_pointer()
                    .and_then(|pointer| tree.pointer(pointer))
                    .is_some_and(Value::is_object)
            })
            .unwrap_or(Self::Unknown)
    }

    /// The JSON pointer of the shared-definitions container.
    pub fn container_pointer(self) -> Option<&'static str> {
        match self {
            Self::JsonSchema => Some("/definitions"),
            Self::OpenApi => Some("/components/schemas"),
            Self::Unknown => None,
        }
    }
}

/// Progress of the walker over a document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkState {
    /// The tree has not been walked yet.
    #[default]
    Unvisited,
    /// The tree is being walked, somewhere up the call stack.
    Visiting,
    /// Every reference of the tree has been processed.
    Visited,
}

/// One schema document: its canonical locator, its tree and its dialect.
///
/// # Example
///
/// ```rust
/// use api1st_core::{Dialect, Document};
/// use serde_json::json;
/// use url::Url;
///
/// let locator = Url::parse("file:///schemas/root.yaml")?;
/// let document = Document::new(locator, json!({
///     "definitions": { "Widget": { "type": "string" } }
/// }));
///
/// assert_eq!(document.dialect(), Dialect::JsonSchema);
/// assert_eq!(document.local_pointer_for("Widget"), "/definitions/Widget");
/// assert!(document.find("/definitions/Widget").is_some());
/// # Ok::<(), url::ParseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    locator: Url,
    tree: Value,
    dialect: Dialect,
    state: WalkState,
}

impl Document {
    /// Wraps a tree, detecting its dialect once.
    pub fn new(locator: Url, tree: Value) -> Self {
        let dialect = Dialect::detect(&tree);
        debug!(%locator, ?dialect, "document created");
        Self {
            locator,
            tree,
            dialect,
            state: WalkState::Unvisited,
        }
    }

    /// Wraps the document into a shareable handle.
    pub fn into_shared(self) -> DocumentRef {
        Rc::new(RefCell::new(self))
    }

    /// The canonical locator.
    pub fn locator(&self) -> &Url {
        &self.locator
    }

    /// The detected dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The walk progress.
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Returns `true` once every reference of the tree has been processed.
    pub fn is_visited(&self) -> bool {
        self.state == WalkState::Visited
    }

    pub(crate) fn set_state(&mut self, state: WalkState) {
        self.state = state;
    }

    /// The document tree.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Value {
        &mut self.tree
    }

    /// Consumes the document, returning its tree.
    pub fn into_tree(self) -> Value {
        self.tree
    }

    /// The absolute pointer of a shared type in this document.
    ///
    /// The name is returned unchanged for [`Dialect::Unknown`].
    pub fn local_pointer_for(&self, type_name: &str) -> String {
        match self.dialect.container_pointer() {
            Some(container) => format!("{container}/{}", escape_token(type_name)),
            None => type_name.to_string(),
        }
    }

    /// The `$ref` value pointing at a shared type in this document.
    pub fn local_reference_for(&self, type_name: &str) -> String {
        format!("#{}", self.local_pointer_for(type_name))
    }

    /// Resolves a JSON pointer against the tree.
    ///
    /// Malformed pointers and missing nodes both yield `None`.
    pub fn find(&self, pointer: &str) -> Option<&Value> {
        let pointer = Pointer::parse(pointer).ok()?;
        self.tree.resolve(pointer).ok()
    }

    /// The shared-definitions container, if the dialect has one.
    pub fn shared_definitions(&self) -> Option<&Map<String, Value>> {
        self.dialect
            .container_pointer()
            .and_then(|pointer| self.tree.pointer(pointer))
            .and_then(Value::as_object)
    }

    /// Returns `true` if the pointer addresses an entry of the
    /// shared-definitions container.
    pub fn is_shared_pointer(&self, pointer: &str) -> bool {
        self.dialect
            .container_pointer()
            .and_then(|container| pointer.strip_prefix(container))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|name| !name.is_empty())
    }

    /// Creates the shared-definitions container of `dialect` in a document
    /// that has none, and switches the document to that dialect.
    ///
    /// Documents with a detected dialect are left untouched, as are trees
    /// where the container cannot be created (non-mapping root, or a
    /// non-mapping node on the container path).
    pub fn adopt_dialect(&mut self, dialect: Dialect) {
        if self.dialect != Dialect::Unknown {
            return;
        }
        let path: &[&str] = match dialect {
            Dialect::JsonSchema => &["definitions"],
            Dialect::OpenApi => &["components", "schemas"],
            Dialect::Unknown => return,
        };

        let mut node = &mut self.tree;
        for segment in path {
            let Some(map) = node.as_object_mut() else {
                return;
            };
            node = map
                .entry(*segment)
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if node.is_object() {
            self.dialect = dialect;
            info!(locator = %self.locator, ?dialect, "created shared definitions container");
        }
    }

    /// Inserts a node into the shared-definitions container.
    ///
    /// The name is the trailing segment of `pointer_or_name`. The returned
    /// string is the local `$ref` value for the inserted definition.
    ///
    /// An existing entry made of a single `$ref` to the same definition of
    /// `dependency` is replaced by `node`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NoSharedDefinitions`] if the dialect is
    ///   [`Dialect::Unknown`]
    /// - [`ResolveError::PromotionConflict`] if a different definition already
    ///   exists under the same name; `dependency` names its origin
    pub fn add_shared_definition(
        &mut self,
        node: Value,
        pointer_or_name: &str,
        dependency: &Url,
    ) -> Result<String, ResolveError> {
        let name = trailing_name(pointer_or_name);
        let reference = self.local_reference_for(&name);
        let locator = self.locator.clone();

        let container = self
            .dialect
            .container_pointer()
            .and_then(|pointer| self.tree.pointer_mut(pointer))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ResolveError::NoSharedDefinitions {
                locator: locator.clone(),
            })?;

        match container.get(&name) {
            Some(existing) if *existing == node => {
                debug!(%locator, %name, "shared definition already present");
            }
            Some(existing) if is_reexport(existing, &locator, pointer_or_name, dependency) => {
                container.insert(name, node);
                info!(%locator, %reference, "replaced re-exported shared definition");
            }
            Some(_) => {
                return Err(ResolveError::PromotionConflict {
                    name,
                    document: locator,
                    dependency: dependency.clone(),
                });
            }
            None => {
                container.insert(name, node);
                info!(%locator, %reference, "added shared definition");
            }
        }

        Ok(reference)
    }
}

// `{"$ref": "<dependency>#<pointer>"}` as seen from `locator`
fn is_reexport(existing: &Value, locator: &Url, pointer: &str, dependency: &Url) -> bool {
    let Some(map) = existing.as_object().filter(|map| map.len() == 1) else {
        return false;
    };
    let Some(raw) = map.get(REF_KEY).and_then(Value::as_str) else {
        return false;
    };
    let reference = Reference::parse(raw);
    if matches!(
        reference.kind(),
        ReferenceKind::Internal | ReferenceKind::Unsupported
    ) || reference.fragment() != pointer
    {
        return false;
    }
    locator.join(reference.target()).is_ok_and(|mut target| {
        target.set_fragment(None);
        target == *dependency
    })
}

fn escape_token(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

pub(crate) fn trailing_name(pointer_or_name: &str) -> String {
    match pointer_or_name.rsplit_once('/') {
        Some((_, name)) => name.replace("~1", "/").replace("~0", "~"),
        None => pointer_or_name.to_string(),
    }
}
