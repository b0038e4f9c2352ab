//! Depth-first traversal that finds and resolves `$ref`s.

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{DocumentRef, WalkState};
use crate::error::ResolveError;
use crate::promoter::Promoter;
use crate::reference::{REF_KEY, Reference, ReferenceKind};
use crate::store::DocumentStore;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

enum Step {
    Reference(String),
    Descend(Vec<Segment>),
    Leaf,
}

fn node_at<'v>(root: &'v Value, path: &[Segment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.get(key.as_str()),
        Segment::Index(index) => node.get(*index),
    })
}

fn node_at_mut<'v>(root: &'v mut Value, path: &[Segment]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.get_mut(key.as_str()),
        Segment::Index(index) => node.get_mut(*index),
    })
}

/// Walks document trees, inlining external references.
///
/// Nodes are addressed by path from the document root and every borrow of a
/// document is released before recursing, so a dependency can be walked and
/// the dependent mutated in the same pass.
pub(crate) struct ReferenceWalker<'a, S> {
    store: &'a mut DocumentStore,
    sink: &'a mut S,
    in_progress: Vec<Url>,
}

impl<'a, S> ReferenceWalker<'a, S>
where
    S: DiagnosticSink,
{
    pub(crate) fn new(store: &'a mut DocumentStore, sink: &'a mut S) -> Self {
        Self {
            store,
            sink,
            in_progress: Vec::new(),
        }
    }

    /// Makes a root document known to the store, so that references back to
    /// it reach this very instance.
    ///
    /// Returns the instance held by the store, which is the one already
    /// stored if the locator was known.
    pub(crate) fn register(&mut self, document: DocumentRef) -> DocumentRef {
        self.store.register(document)
    }

    /// Walks the whole tree of `document` unless it was already walked.
    pub(crate) fn walk_document(&mut self, document: &DocumentRef) -> Result<(), ResolveError> {
        let locator = {
            let mut current = document.borrow_mut();
            match current.state() {
                WalkState::Visited => {
                    debug!(locator = %current.locator(), "document already processed");
                    return Ok(());
                }
                WalkState::Visiting => {
                    let locator = current.locator();
                    let start = self
                        .in_progress
                        .iter()
                        .position(|visiting| visiting == locator)
                        .unwrap_or_default();
                    let chain = self.in_progress.get(start..).unwrap_or_default();
                    return Err(ResolveError::cyclic(chain, locator));
                }
                WalkState::Unvisited => current.set_state(WalkState::Visiting),
            }
            current.locator().clone()
        };

        info!(%locator, "processing document");
        self.in_progress.push(locator.clone());
        let result = self.visit(document, &mut Vec::new());
        self.in_progress.pop();

        let state = if result.is_ok() {
            info!(%locator, "processed document");
            WalkState::Visited
        } else {
            WalkState::Unvisited
        };
        document.borrow_mut().set_state(state);
        result
    }

    fn visit(&mut self, document: &DocumentRef, path: &mut Vec<Segment>) -> Result<(), ResolveError> {
        let step = {
            let document = document.borrow();
            match node_at(document.tree(), path) {
                Some(Value::Object(map)) => match map.get(REF_KEY) {
                    Some(Value::String(reference)) => Step::Reference(reference.clone()),
                    _ => Step::Descend(map.keys().cloned().map(Segment::Key).collect()),
                },
                Some(Value::Array(items)) => {
                    Step::Descend((0..items.len()).map(Segment::Index).collect())
                }
                _ => Step::Leaf,
            }
        };

        match step {
            Step::Reference(reference) => self.resolve_reference(document, path, &reference),
            Step::Descend(children) => {
                for child in children {
                    path.push(child);
                    self.visit(document, path)?;
                    path.pop();
                }
                Ok(())
            }
            Step::Leaf => Ok(()),
        }
    }

    fn resolve_reference(
        &mut self,
        document: &DocumentRef,
        path: &[Segment],
        raw: &str,
    ) -> Result<(), ResolveError> {
        let reference = Reference::parse(raw);
        let locator = document.borrow().locator().clone();

        match reference.kind() {
            ReferenceKind::Internal => {
                debug!(%locator, %raw, "internal reference");
                self.check_internal(document, &reference);
                return Ok(());
            }
            ReferenceKind::Network => debug!(%locator, %raw, "external reference"),
            ReferenceKind::File => debug!(%locator, %raw, "local reference"),
            ReferenceKind::Relative => debug!(%locator, %raw, "relative reference"),
            ReferenceKind::Unsupported => {
                return Err(ResolveError::UnsupportedReferenceScheme {
                    scheme: reference.scheme().to_string(),
                    reference: raw.to_string(),
                    locator,
                });
            }
        }

        let target = DocumentStore::canonicalize(&locator, reference.target())?;
        if target == locator {
            self.check_internal(document, &reference);
            return Ok(());
        }

        let dependency = self.store.get_or_load(target)?;
        self.walk_document(&dependency)?;

        let found = dependency.borrow().find(reference.fragment()).cloned();
        let Some(mut inlined) = found else {
            self.sink
                .report(Diagnostic::missing_reference(&locator, raw));
            return Ok(());
        };

        Promoter::new(&mut *self.sink).check_for_shared(document, &dependency, &mut inlined)?;
        self.inline(document, path, raw, inlined);
        debug!(%locator, %raw, "resolved reference");
        Ok(())
    }

    fn check_internal(&mut self, document: &DocumentRef, reference: &Reference<'_>) {
        let document = document.borrow();
        if document.find(reference.fragment()).is_some() {
            debug!(locator = %document.locator(), reference = reference.raw(), "resolved reference");
        } else {
            self.sink
                .report(Diagnostic::missing_reference(document.locator(), reference.raw()));
        }
    }

    fn inline(&mut self, document: &DocumentRef, path: &[Segment], raw: &str, inlined: Value) {
        let mut document = document.borrow_mut();
        let locator = document.locator().clone();
        let Some(container) = node_at_mut(document.tree_mut(), path) else {
            return;
        };

        match inlined {
            Value::Object(entries) => {
                if let Some(map) = container.as_object_mut() {
                    map.shift_remove(REF_KEY);
                    map.extend(entries);
                }
            }
            other if container.as_object().is_some_and(|map| map.len() == 1) => {
                *container = other;
            }
            _ => {
                self.sink.report(Diagnostic::warning(
                    &locator,
                    raw,
                    "cannot merge a non-mapping target into a mapping with other keys",
                ));
            }
        }
    }
}
