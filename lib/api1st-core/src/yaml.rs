//! YAML serialization of resolved documents using serde-saphyr.
//!
//! # Example
//!
//! ```rust
//! use api1st_core::{Document, ToYaml};
//! use serde_json::json;
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::new(
//!     Url::parse("file:///schemas/point.yaml")?,
//!     json!({"type": "object"}),
//! );
//! let yaml = document.tree().to_yaml()?;
//!
//! assert_eq!(yaml.trim(), "type: object");
//! # Ok(())
//! # }
//! ```

use serde::Serialize;

/// Error type for YAML serialization operations.
pub type YamlError = serde_saphyr::ser_error::Error;

/// Extension trait for serializing trees to YAML.
///
/// Implemented for every [`Serialize`] type, in particular for
/// [`serde_json::Value`] trees returned by [`Document::tree`](crate::Document::tree).
pub trait ToYaml: Serialize + Sized {
    /// Serializes this value to a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a [`YamlError`] if serialization fails.
    fn to_yaml(&self) -> Result<String, YamlError> {
        serde_saphyr::to_string(self)
    }
}

impl<T: Serialize + Sized> ToYaml for T {}
