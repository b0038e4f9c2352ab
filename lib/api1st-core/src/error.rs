//! Errors of document loading and reference resolution.

use url::Url;

/// Errors raised while retrieving or parsing a document.
///
/// A loader failure aborts the whole resolution run: there is no partial
/// result once a dependency cannot be loaded at all.
#[derive(Debug, derive_more::Error, derive_more::Display)]
pub enum LoadError {
    /// The document could not be read from the filesystem.
    #[display("Failed to read '{locator}': {source}")]
    Io {
        /// The locator of the document.
        locator: Url,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The HTTP request failed before a response was received.
    #[display("Failed to fetch '{locator}': {source}")]
    Http {
        /// The locator of the document.
        locator: Url,
        /// The underlying HTTP client error.
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[display("Unexpected status code {status} when fetching '{locator}'")]
    Status {
        /// The locator of the document.
        locator: Url,
        /// The HTTP status code.
        status: u16,
    },

    /// The document content is neither valid JSON nor valid YAML.
    #[display("Failed to parse '{locator}': {message}")]
    Parse {
        /// The locator of the document.
        locator: Url,
        /// The parser error message.
        message: String,
    },

    /// The loader has no way to retrieve this kind of locator.
    #[display("Unsupported locator '{locator}'")]
    UnsupportedLocator {
        /// The rejected locator.
        locator: Url,
    },

    /// No document is registered under this locator.
    #[display("No document found at '{locator}'")]
    NotFound {
        /// The unknown locator.
        locator: Url,
    },
}

impl LoadError {
    /// The locator of the document that failed to load.
    pub fn locator(&self) -> &Url {
        match self {
            Self::Io { locator, .. }
            | Self::Http { locator, .. }
            | Self::Status { locator, .. }
            | Self::Parse { locator, .. }
            | Self::UnsupportedLocator { locator }
            | Self::NotFound { locator } => locator,
        }
    }
}

/// Errors that abort a resolution run.
///
/// Missing reference targets are not errors: they are reported through the
/// [`DiagnosticSink`](crate::DiagnosticSink) and the walk continues.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ResolveError {
    /// An external document could not be retrieved or parsed.
    Load(LoadError),

    /// A reference uses a scheme other than `http`, `https`, `file` or none.
    #[display("Unsupported scheme '{scheme}' in reference '{reference}' from '{locator}'")]
    #[from(skip)]
    UnsupportedReferenceScheme {
        /// The offending scheme.
        scheme: String,
        /// The raw reference.
        reference: String,
        /// The document containing the reference.
        locator: Url,
    },

    /// A reference or root location cannot be turned into a canonical locator.
    #[display("Invalid locator '{locator}': {reason}")]
    #[from(skip)]
    InvalidLocator {
        /// The location that failed to parse or join.
        locator: String,
        /// Why no canonical locator could be computed.
        reason: String,
    },

    /// A document depends on itself through a chain of external references.
    #[display("Cyclic reference: {chain}")]
    #[from(skip)]
    CyclicReference {
        /// The documents involved, in walk order, ending with the repeated one.
        chain: String,
    },

    /// Two distinct shared definitions would be promoted under the same name.
    #[display(
        "Conflicting shared definition '{name}' in '{document}' while promoting from '{dependency}'"
    )]
    #[from(skip)]
    PromotionConflict {
        /// The shared definition name.
        name: String,
        /// The document receiving the definition.
        document: Url,
        /// The document the definition comes from.
        dependency: Url,
    },

    /// The document has no shared-definitions container to promote into.
    #[display("Document '{locator}' has no shared definitions container")]
    #[from(skip)]
    NoSharedDefinitions {
        /// The document without a known dialect.
        locator: Url,
    },
}

impl ResolveError {
    pub(crate) fn cyclic(chain: &[Url], repeated: &Url) -> Self {
        let chain = chain
            .iter()
            .chain(std::iter::once(repeated))
            .map(Url::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CyclicReference { chain }
    }
}
