//! Serialized document formats.

use std::str::FromStr;

use derive_more::{Display, Error};
use serde_json::Value;
use url::Url;

use crate::error::LoadError;

/// The serialized form of a document.
///
/// YAML is a superset of JSON, so it is the fallback whenever the locator
/// gives no hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Parsed with `serde_json`.
    Json,
    /// Parsed with `serde-saphyr`.
    #[default]
    Yaml,
}

impl Format {
    /// Guesses the format from the locator's file extension.
    pub fn from_locator(locator: &Url) -> Self {
        let extension = locator
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension);

        match extension {
            Some(extension) if extension.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Guesses the format from an HTTP `Content-Type`, falling back to the
    /// locator.
    pub fn from_content_type(content_type: Option<&str>, locator: &Url) -> Self {
        match content_type {
            Some(content_type) if content_type.contains("json") => Self::Json,
            _ => Self::from_locator(locator),
        }
    }

    /// Parses text into the generic tree.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] when the text is not valid for the format.
    pub fn parse(self, locator: &Url, text: &str) -> Result<Value, LoadError> {
        let result = match self {
            Self::Json => serde_json::from_str(text).map_err(|err| err.to_string()),
            Self::Yaml => serde_saphyr::from_str(text).map_err(|err| err.to_string()),
        };
        result.map_err(|message| LoadError::Parse {
            locator: locator.clone(),
            message,
        })
    }
}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(UnknownFormat {
                name: name.to_string(),
            }),
        }
    }
}

/// A format name that is neither `json` nor `yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unknown format '{name}', expected 'json' or 'yaml'")]
pub struct UnknownFormat {
    name: String,
}
