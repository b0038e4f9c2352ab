//! Cache of loaded documents, one instance per canonical locator.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info};
use url::Url;

use crate::document::{Document, DocumentRef};
use crate::error::ResolveError;
use crate::loader::DocumentLoader;

/// Loads documents on demand and keeps them for the whole run.
///
/// Two lookups that canonicalize to the same locator return the same
/// [`DocumentRef`], so a document reached through several references is only
/// loaded and walked once. Failed loads are not cached.
pub struct DocumentStore {
    loader: Box<dyn DocumentLoader>,
    documents: IndexMap<Url, DocumentRef>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Creates an empty store backed by `loader`.
    pub fn new(loader: impl DocumentLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            documents: IndexMap::new(),
        }
    }

    /// Computes the canonical locator of `relative` as seen from `from`.
    ///
    /// The fragment, if any, is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidLocator`] if the join fails.
    pub fn canonicalize(from: &Url, relative: &str) -> Result<Url, ResolveError> {
        let mut locator = from
            .join(relative)
            .map_err(|error| ResolveError::InvalidLocator {
                locator: relative.to_string(),
                reason: error.to_string(),
            })?;
        locator.set_fragment(None);
        Ok(locator)
    }

    /// Returns the document for `relative`, joined onto `from`, loading it
    /// on first use.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidLocator`] if the locator cannot be computed
    /// - [`ResolveError::Load`] if the loader fails
    pub fn resolve_locator(
        &mut self,
        from: &Url,
        relative: &str,
    ) -> Result<DocumentRef, ResolveError> {
        let locator = Self::canonicalize(from, relative)?;
        self.get_or_load(locator)
    }

    /// Returns the document for an already canonical locator, loading it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Load`] if the loader fails.
    pub fn get_or_load(&mut self, mut locator: Url) -> Result<DocumentRef, ResolveError> {
        locator.set_fragment(None);
        if let Some(document) = self.documents.get(&locator) {
            debug!(%locator, "document already loaded");
            return Ok(Rc::clone(document));
        }

        info!(%locator, "loading document");
        let tree = self.loader.load(&locator)?;
        let document = Document::new(locator.clone(), tree).into_shared();
        self.documents.insert(locator, Rc::clone(&document));
        Ok(document)
    }

    /// Registers a document built by the caller.
    ///
    /// If a document with the same locator is already known, that instance is
    /// kept and returned.
    pub fn register(&mut self, document: DocumentRef) -> DocumentRef {
        let locator = document.borrow().locator().clone();
        Rc::clone(self.documents.entry(locator).or_insert(document))
    }

    /// The document already stored under `locator`.
    pub fn get(&self, locator: &Url) -> Option<&DocumentRef> {
        self.documents.get(locator)
    }

    /// All stored documents, in load order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.documents.values()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document was loaded or registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
