//! Parsing and classification of `$ref` values.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// The key holding a reference in a mapping.
pub const REF_KEY: &str = "$ref";

/// How a reference must be resolved, derived from its scheme and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// No scheme and no path: a pointer into the same document.
    Internal,
    /// An `http` or `https` URL.
    Network,
    /// A `file` URL.
    File,
    /// No scheme but a path, relative to the referencing document.
    Relative,
    /// Any other scheme.
    Unsupported,
}

/// A parsed `$ref` value.
///
/// The raw string is split into `scheme`, `path` and `fragment`. The
/// fragment is percent-decoded and holds a JSON pointer (possibly empty).
///
/// ```rust
/// use api1st_core::{Reference, ReferenceKind};
///
/// let reference = Reference::parse("./common.yaml#/definitions/Point");
/// assert_eq!(reference.kind(), ReferenceKind::Relative);
/// assert_eq!(reference.target(), "./common.yaml");
/// assert_eq!(reference.fragment(), "/definitions/Point");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    raw: &'a str,
    scheme: &'a str,
    path: &'a str,
    fragment: Cow<'a, str>,
}

impl<'a> Reference<'a> {
    /// Splits a raw reference into its parts. Parsing never fails.
    pub fn parse(raw: &'a str) -> Self {
        let (target, fragment) = match raw.split_once('#') {
            Some((target, fragment)) => (target, fragment),
            None => (raw, ""),
        };
        let (scheme, path) = match split_scheme(target) {
            Some((scheme, rest)) => (scheme, rest),
            None => ("", target),
        };
        let fragment = percent_decode_str(fragment).decode_utf8_lossy();

        Self {
            raw,
            scheme,
            path,
            fragment,
        }
    }

    /// The reference as written.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The URI scheme, empty for relative and internal references.
    pub fn scheme(&self) -> &'a str {
        self.scheme
    }

    /// The part between the scheme and the fragment.
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// The decoded JSON pointer.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The locator part of the reference, without the fragment.
    pub fn target(&self) -> &'a str {
        self.raw
            .split_once('#')
            .map_or(self.raw, |(target, _)| target)
    }

    /// Classifies the reference.
    pub fn kind(&self) -> ReferenceKind {
        if self.scheme.is_empty() {
            if self.path.is_empty() {
                ReferenceKind::Internal
            } else {
                ReferenceKind::Relative
            }
        } else if self.scheme.eq_ignore_ascii_case("http")
            || self.scheme.eq_ignore_ascii_case("https")
        {
            ReferenceKind::Network
        } else if self.scheme.eq_ignore_ascii_case("file") {
            ReferenceKind::File
        } else {
            ReferenceKind::Unsupported
        }
    }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn split_scheme(target: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = target.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}
