//! # api1st Core
//!
//! Flatten JSON Schema and OpenAPI documents by resolving their `$ref`s.
//!
//! A schema spread over several files (or URLs) is turned into self-contained
//! documents: external references are inlined, and the named types they
//! depend on are copied into the referencing document's own
//! shared-definitions section, so that code generators and validators never
//! have to follow a reference across documents.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use api1st_core::{Resolver, ToYaml};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut resolver = Resolver::new();
//!
//! let root = resolver.load("schemas/api.yaml")?;
//! let resolved = resolver.resolve([root])?;
//!
//! for diagnostic in resolver.sink().entries() {
//!     eprintln!("{diagnostic}");
//! }
//! for document in resolved {
//!     println!("{}", document.borrow().tree().to_yaml()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Dialects
//!
//! The shared-definitions container of a document depends on its [`Dialect`]:
//!
//! | Dialect | Container | Local reference |
//! |---------|-----------|-----------------|
//! | [`Dialect::JsonSchema`] | `definitions` | `#/definitions/Name` |
//! | [`Dialect::OpenApi`] | `components.schemas` | `#/components/schemas/Name` |
//! | [`Dialect::Unknown`] | none | takes the dependency's dialect on first promotion |
//!
//! `definitions` is checked first, the detection happens once when the
//! [`Document`] is created.
//!
//! ## Reference Kinds
//!
//! | `$ref` | Handling |
//! |--------|----------|
//! | `#/definitions/Widget` | internal, checked but kept |
//! | `./other.yaml#/definitions/Point` | relative to the referencing document, inlined |
//! | `file:///schemas/other.yaml#/...` | filesystem, inlined |
//! | `https://example.com/other.yaml#/...` | network, inlined |
//! | `ftp://...`, `urn:...` | [`ResolveError::UnsupportedReferenceScheme`] |
//!
//! Before anything is copied out of a dependency, the dependency is itself
//! fully resolved. Each document is loaded once and walked once per
//! [`Resolver`].
//!
//! ## Promotion
//!
//! Inlined content may still point at named types of the dependency:
//!
//! ```rust
//! use api1st_core::{Document, MemoryLoader, Resolver};
//! use serde_json::json;
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = MemoryLoader::new().with_document(
//!     Url::parse("file:///schemas/shapes.yaml")?,
//!     json!({"definitions": {
//!         "Shape": {"corner": {"$ref": "#/definitions/Point"}},
//!         "Point": {"x": "number", "y": "number"}
//!     }}),
//! );
//! let mut resolver = Resolver::builder().with_loader(loader).build();
//!
//! let root = Document::new(
//!     Url::parse("file:///schemas/root.yaml")?,
//!     json!({
//!         "shape": {"$ref": "shapes.yaml#/definitions/Shape"},
//!         "definitions": {}
//!     }),
//! );
//! let resolved = resolver.resolve([root.into_shared()])?;
//!
//! assert_eq!(resolved[0].borrow().tree(), &json!({
//!     "shape": {"corner": {"$ref": "#/definitions/Point"}},
//!     "definitions": {"Point": {"x": "number", "y": "number"}}
//! }));
//! # Ok(())
//! # }
//! ```
//!
//! Two different definitions promoted under the same name are rejected with
//! [`ResolveError::PromotionConflict`]. An entry that only re-exports the
//! promoted definition (a lone `$ref` to it) is replaced.
//!
//! ## Errors and Diagnostics
//!
//! Missing targets are reported to the [`DiagnosticSink`] and the walk goes
//! on, leaving the `$ref` in place. Load failures, unsupported schemes,
//! cycles between documents and promotion conflicts abort the run with a
//! [`ResolveError`].
//!
//! ## Loading
//!
//! [`DocumentLoader`] is the only retrieval seam. [`DefaultLoader`] reads
//! `file` locators with [`FileLoader`] and `http`/`https` locators with
//! [`HttpLoader`]. JSON is used for
//! `.json` documents, YAML otherwise. [`MemoryLoader`] serves in-memory trees.

mod diagnostics;
mod document;
mod error;
mod format;
mod loader;
mod promoter;
mod reference;
mod resolver;
mod store;
mod walker;
mod yaml;

pub use self::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, Severity};
pub use self::document::{Dialect, Document, DocumentRef, WalkState};
pub use self::error::{LoadError, ResolveError};
pub use self::format::{Format, UnknownFormat};
pub use self::loader::{DefaultLoader, DocumentLoader, FileLoader, HttpLoader, MemoryLoader};
pub use self::reference::{REF_KEY, Reference, ReferenceKind};
pub use self::resolver::{Resolver, ResolverBuilder, locator_for};
pub use self::store::DocumentStore;
pub use self::yaml::{ToYaml, YamlError};
