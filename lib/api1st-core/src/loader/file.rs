use serde_json::Value;
use tracing::debug;
use url::Url;

use super::DocumentLoader;
use crate::error::LoadError;
use crate::format::Format;

/// Reads `file://` locators from the local filesystem.
///
/// `.json` files are parsed as JSON, anything else as YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    /// Creates a filesystem loader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, locator: &Url) -> Result<Value, LoadError> {
        let path = locator
            .to_file_path()
            .map_err(|()| LoadError::UnsupportedLocator {
                locator: locator.clone(),
            })?;

        debug!(path = %path.display(), "reading document");
        let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            locator: locator.clone(),
            source,
        })?;

        Format::from_locator(locator).parse(locator, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_load_yaml_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("point.yaml");
        std::fs::write(&path, "type: object\nrequired: [x, y]\n")?;
        let locator = Url::from_file_path(&path).expect("absolute path");

        let tree = FileLoader::new().load(&locator)?;

        assert_eq!(tree, json!({"type": "object", "required": ["x", "y"]}));
        Ok(())
    }

    #[test]
    fn should_load_json_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("point.json");
        std::fs::write(&path, r#"{"type": "object"}"#)?;
        let locator = Url::from_file_path(&path).expect("absolute path");

        let tree = FileLoader::new().load(&locator)?;

        assert_eq!(tree, json!({"type": "object"}));
        Ok(())
    }

    #[test]
    fn should_fail_on_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let locator = Url::from_file_path(dir.path().join("missing.yaml")).expect("absolute path");

        let error = FileLoader::new()
            .load(&locator)
            .expect_err("should fail");

        assert!(matches!(error, LoadError::Io { .. }));
        Ok(())
    }

    #[test]
    fn should_reject_non_file_locator() {
        let locator = Url::parse("https://example.com/point.yaml").expect("valid url");

        let error = FileLoader::new()
            .load(&locator)
            .expect_err("should fail");

        assert!(matches!(error, LoadError::UnsupportedLocator { .. }));
    }
}
