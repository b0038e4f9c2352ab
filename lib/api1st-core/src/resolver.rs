//! The resolution entry point and its builder.

use std::path::Path;

use tracing::info;
use url::Url;

use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::document::DocumentRef;
use crate::error::ResolveError;
use crate::loader::{DefaultLoader, DocumentLoader};
use crate::store::DocumentStore;
use crate::walker::ReferenceWalker;

/// Resolves the `$ref`s of root documents, inlining external content.
///
/// The resolver owns the [`DocumentStore`], so every document is loaded and
/// walked at most once for the lifetime of the resolver, whatever the number
/// of roots or reference sites pointing at it.
///
/// # Example
///
/// ```rust
/// use api1st_core::{Document, MemoryLoader, Resolver};
/// use serde_json::json;
/// use url::Url;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let loader = MemoryLoader::new().with_document(
///     Url::parse("file:///schemas/other.yaml")?,
///     json!({"definitions": {"Point": {"x": "number", "y": "number"}}}),
/// );
/// let mut resolver = Resolver::builder().with_loader(loader).build();
///
/// let root = Document::new(
///     Url::parse("file:///schemas/root.yaml")?,
///     json!({"$ref": "./other.yaml#/definitions/Point"}),
/// );
/// let resolved = resolver.resolve([root.into_shared()])?;
///
/// assert_eq!(resolved[0].borrow().tree(), &json!({"x": "number", "y": "number"}));
/// assert!(resolver.sink().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Resolver<S = Diagnostics> {
    store: DocumentStore,
    sink: S,
}

impl Resolver {
    /// Creates a resolver reading files and HTTP documents, collecting
    /// diagnostics.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder to configure the loader and the diagnostics sink.
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Resolver<S>
where
    S: DiagnosticSink,
{
    /// Resolves every root document, in order.
    ///
    /// Each root is walked at most once: resolving an already resolved root
    /// again is a no-op. The documents are returned in the same order; a root
    /// whose locator is already in the store is replaced by the stored
    /// instance.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] aborts the run; missing reference targets are
    /// reported to the sink instead.
    pub fn resolve(
        &mut self,
        roots: impl IntoIterator<Item = DocumentRef>,
    ) -> Result<Vec<DocumentRef>, ResolveError> {
        let mut walker = ReferenceWalker::new(&mut self.store, &mut self.sink);
        let mut results = Vec::new();
        for root in roots {
            let locator = root.borrow().locator().clone();
            info!(%locator, "***** processing resource *****");
            let root = walker.register(root);
            walker.walk_document(&root)?;
            info!(%locator, "***** processed resource *****");
            results.push(root);
        }
        Ok(results)
    }

    /// Loads a root document from a filesystem path or an absolute URL.
    ///
    /// The returned document is shared with the store: later references to
    /// the same locator reuse it.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidLocator`] if `location` is neither a URL nor a
    ///   usable path
    /// - [`ResolveError::Load`] if the document cannot be loaded
    pub fn load(&mut self, location: &str) -> Result<DocumentRef, ResolveError> {
        let locator = locator_for(location)?;
        self.store.get_or_load(locator)
    }

    /// The diagnostics sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The document store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Consumes the resolver, returning the diagnostics sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Builds the canonical locator of a root location.
///
/// Absolute URLs are kept as-is (without fragment). Anything else is taken as
/// a filesystem path, made absolute against the current directory.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidLocator`] if the path cannot be made
/// absolute or turned into a `file` URL.
pub fn locator_for(location: &str) -> Result<Url, ResolveError> {
    // single letter schemes are Windows drive letters
    if let Ok(mut locator) = Url::parse(location)
        && locator.scheme().len() > 1
    {
        locator.set_fragment(None);
        return Ok(locator);
    }

    let invalid = |reason: String| ResolveError::InvalidLocator {
        locator: location.to_string(),
        reason,
    };
    let path = std::path::absolute(Path::new(location)).map_err(|err| invalid(err.to_string()))?;
    Url::from_file_path(&path).map_err(|()| invalid("not an absolute path".to_string()))
}

/// Builder for [`Resolver`].
///
/// # Default Configuration
///
/// - **Loader**: [`DefaultLoader`] (files and HTTP)
/// - **Sink**: [`Diagnostics`], logging and collecting every diagnostic
///
/// # Example
///
/// ```rust
/// use api1st_core::{Diagnostic, FileLoader, Resolver};
///
/// let resolver = Resolver::builder()
///     .with_loader(FileLoader::new())
///     .with_sink(Vec::<Diagnostic>::new())
///     .build();
/// # drop(resolver);
/// ```
pub struct ResolverBuilder<S = Diagnostics> {
    loader: Option<Box<dyn DocumentLoader>>,
    sink: S,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self {
            loader: None,
            sink: Diagnostics::new(),
        }
    }
}

impl<S> std::fmt::Debug for ResolverBuilder<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverBuilder")
            .field("custom_loader", &self.loader.is_some())
            .field("sink", &self.sink)
            .finish()
    }
}

impl<S> ResolverBuilder<S>
where
    S: DiagnosticSink,
{
    /// Sets the loader used for every external document.
    #[must_use]
    pub fn with_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Sets the diagnostics sink.
    pub fn with_sink<T>(self, sink: T) -> ResolverBuilder<T>
    where
        T: DiagnosticSink,
    {
        ResolverBuilder {
            loader: self.loader,
            sink,
        }
    }

    /// Builds the resolver.
    pub fn build(self) -> Resolver<S> {
        let Self { loader, sink } = self;
        let store = match loader {
            Some(loader) => DocumentStore::new(loader),
            None => DocumentStore::new(DefaultLoader::new()),
        };
        Resolver { store, sink }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::document::Document;
    use crate::loader::MemoryLoader;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    #[test]
    fn should_keep_absolute_url_locator() {
        let locator = locator_for("https://example.com/api/root.yaml#/paths").expect("valid");

        insta::assert_snapshot!(locator, @"https://example.com/api/root.yaml");
    }

    #[test]
    fn should_make_path_locator_absolute() {
        let locator = locator_for("schemas/root.yaml").expect("valid");

        assert_eq!(locator.scheme(), "file");
        assert!(locator.path().ends_with("/schemas/root.yaml"));
    }

    #[test]
    fn should_return_roots_in_order() -> anyhow::Result<()> {
        let mut resolver = Resolver::builder()
            .with_loader(MemoryLoader::new())
            .build();
        let first = Document::new(url("file:///schemas/first.yaml"), json!({})).into_shared();
        let second = Document::new(url("file:///schemas/second.yaml"), json!({})).into_shared();

        let results = resolver.resolve([Rc::clone(&first), Rc::clone(&second)])?;

        assert_eq!(results.len(), 2);
        assert!(Rc::ptr_eq(&results[0], &first));
        assert!(Rc::ptr_eq(&results[1], &second));
        assert!(first.borrow().is_visited());
        assert!(second.borrow().is_visited());
        Ok(())
    }

    #[test]
    fn should_return_stored_instance_for_known_locator() -> anyhow::Result<()> {
        let loader = MemoryLoader::new().with_document(
            url("file:///schemas/root.yaml"),
            json!({"$ref": "#/definitions/Missing", "definitions": {}}),
        );
        let mut resolver = Resolver::builder().with_loader(loader).build();
        let loaded = resolver.load("file:///schemas/root.yaml")?;
        let duplicate =
            Document::new(url("file:///schemas/root.yaml"), json!({"type": "object"})).into_shared();

        let results = resolver.resolve([Rc::clone(&duplicate)])?;

        assert!(Rc::ptr_eq(&results[0], &loaded));
        assert!(loaded.borrow().is_visited());
        assert!(!duplicate.borrow().is_visited());
        assert_eq!(resolver.store().len(), 1);
        assert_eq!(resolver.sink().len(), 1);
        Ok(())
    }

    #[test]
    fn should_load_root_through_store() -> anyhow::Result<()> {
        let loader = MemoryLoader::new()
            .with_document(url("file:///schemas/root.yaml"), json!({"type": "object"}));
        let mut resolver = Resolver::builder().with_loader(loader).build();

        let root = resolver.load("file:///schemas/root.yaml")?;
        let again = resolver.load("file:///schemas/root.yaml#/type")?;

        assert!(Rc::ptr_eq(&root, &again));
        assert_eq!(resolver.store().len(), 1);
        Ok(())
    }
}
