//! Retrieval of documents by canonical locator.
//!
//! The engine only depends on the [`DocumentLoader`] trait. The provided
//! implementations cover the filesystem ([`FileLoader`]), HTTP
//! ([`HttpLoader`]) and in-memory trees ([`MemoryLoader`]).
//! [`DefaultLoader`] dispatches on the locator scheme.

use serde_json::Value;
use url::Url;

use crate::error::LoadError;

mod file;
mod http;
mod memory;

pub use self::file::FileLoader;
pub use self::http::HttpLoader;
pub use self::memory::MemoryLoader;

/// Turns a canonical locator into a parsed tree.
///
/// Implementations do not cache: the [`DocumentStore`](crate::DocumentStore)
/// guarantees a single load per locator.
pub trait DocumentLoader {
    /// Retrieves and parses the document at `locator`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the document cannot be retrieved or parsed.
    fn load(&self, locator: &Url) -> Result<Value, LoadError>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for Box<L> {
    fn load(&self, locator: &Url) -> Result<Value, LoadError> {
        (**self).load(locator)
    }
}

/// Loads `file` locators from disk and `http`/`https` locators over the network.
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader {
    file: FileLoader,
    http: HttpLoader,
}

impl DefaultLoader {
    /// Creates a loader with default filesystem and HTTP settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the HTTP loader, e.g. to configure timeouts.
    #[must_use]
    pub fn with_http(mut self, http: HttpLoader) -> Self {
        self.http = http;
        self
    }
}

impl DocumentLoader for DefaultLoader {
    fn load(&self, locator: &Url) -> Result<Value, LoadError> {
        match locator.scheme() {
            "file" => self.file.load(locator),
            "http" | "https" => self.http.load(locator),
            _ => Err(LoadError::UnsupportedLocator {
                locator: locator.clone(),
            }),
        }
    }
}
