use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FolioError;

/// Editor configuration.
///
/// Stored as KDL, e.g.
///
/// ```kdl
/// history-depth 100
/// input-rule-lookbehind 500
/// typing-throttle-ms 500
/// download {
///     default-name "image"
///     fallback-extension "bin"
///     timeout-secs 30
///     user-agent "folio/0.1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of undoable transactions kept in history.
    pub history_depth: usize,
    /// How many chars before the caret the input rules look at.
    pub input_rule_lookbehind: usize,
    /// Minimum interval between two typing signals for one thread.
    pub typing_throttle: Duration,
    /// Media download settings.
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// File stem used when a media node has no alt text.
    pub default_name: String,
    /// Extension used when the fetched content has no recognisable MIME type.
    pub fallback_extension: String,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_depth: 100,
            input_rule_lookbehind: 500,
            typing_throttle: Duration::from_millis(500),
            download: DownloadConfig::default(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_name: "image".to_owned(),
            fallback_extension: "bin".to_owned(),
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

impl Config {
    /// Parse a KDL document. Keys that are absent keep their default value.
    pub fn from_kdl(source: &str) -> Result<Self, FolioError> {
        let doc: KdlDocument = source.parse()?;
        let mut config = Config::default();

        if let Some(depth) = int_value(&doc, "history-depth")? {
            config.history_depth = depth;
        }
        if let Some(lookbehind) = int_value(&doc, "input-rule-lookbehind")? {
            config.input_rule_lookbehind = lookbehind;
        }
        if let Some(ms) = int_value(&doc, "typing-throttle-ms")? {
            config.typing_throttle = Duration::from_millis(ms as u64);
        }

        if let Some(download) = doc.get("download").and_then(KdlNode::children) {
            if let Some(name) = string_value(download, "default-name")? {
                config.download.default_name = name;
            }
            if let Some(ext) = string_value(download, "fallback-extension")? {
                config.download.fallback_extension = ext;
            }
            if let Some(secs) = int_value(download, "timeout-secs")? {
                config.download.timeout = Duration::from_secs(secs as u64);
            }
            config.download.user_agent = string_value(download, "user-agent")?;
        }

        tracing::debug!(?config, "loaded config");
        Ok(config)
    }

    /// Render the configuration back to KDL.
    pub fn to_kdl(&self) -> String {
        let mut out = format!(
            "history-depth {}\ninput-rule-lookbehind {}\ntyping-throttle-ms {}\ndownload {{\n",
            self.history_depth,
            self.input_rule_lookbehind,
            self.typing_throttle.as_millis()
        );
        out.push_str(&format!(
            "    default-name {:?}\n    fallback-extension {:?}\n    timeout-secs {}\n",
            self.download.default_name,
            self.download.fallback_extension,
            self.download.timeout.as_secs()
        ));
        if let Some(agent) = &self.download.user_agent {
            out.push_str(&format!("    user-agent {:?}\n", agent));
        }
        out.push_str("}\n");
        out
    }

    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, FolioError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), FolioError> {
        saver.save(self).await
    }
}

fn int_value(doc: &KdlDocument, key: &str) -> Result<Option<usize>, FolioError> {
    let Some(node) = doc.get(key) else {
        return Ok(None);
    };
    let value = node
        .entries()
        .first()
        .and_then(|entry| entry.value().as_i64())
        .ok_or_else(|| FolioError::InvalidConfig {
            key: key.to_owned(),
            reason: "expected an integer".to_owned(),
        })?;
    usize::try_from(value)
        .map(Some)
        .map_err(|_| FolioError::InvalidConfig {
            key: key.to_owned(),
            reason: format!("{value} is negative"),
        })
}

fn string_value(doc: &KdlDocument, key: &str) -> Result<Option<String>, FolioError> {
    let Some(node) = doc.get(key) else {
        return Ok(None);
    };
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
        .map(|s| Some(s.to_owned()))
        .ok_or_else(|| FolioError::InvalidConfig {
            key: key.to_owned(),
            reason: "expected a string".to_owned(),
        })
}

/// Default location of the config file, `<config dir>/folio/config.kdl`.
pub fn default_config_path() -> Result<PathBuf, FolioError> {
    dirs::config_dir()
        .map(|dir| dir.join("folio").join("config.kdl"))
        .ok_or(FolioError::NoConfigDir)
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<Config, FolioError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), FolioError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a KDL file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// A missing file loads as [`Config::default`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, FolioError> {
        match std::fs::read_to_string(&self.path) {
            Ok(source) => Config::from_kdl(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), FolioError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, config.to_kdl())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_kdl("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_document() {
        let config = Config::from_kdl(
            "history-depth 20\ndownload {\n    default-name \"picture\"\n}\n",
        )
        .unwrap();
        assert_eq!(config.history_depth, 20);
        assert_eq!(config.input_rule_lookbehind, 500);
        assert_eq!(config.download.default_name, "picture");
        assert_eq!(config.download.fallback_extension, "bin");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = Config::from_kdl("history-depth \"lots\"\n").unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig { ref key, .. } if key == "history-depth"));
    }

    #[test]
    fn test_negative_is_rejected() {
        assert!(Config::from_kdl("typing-throttle-ms -5\n").is_err());
    }

    #[test]
    fn test_kdl_roundtrip() {
        let mut config = Config::default();
        config.history_depth = 7;
        config.typing_throttle = Duration::from_millis(250);
        config.download.user_agent = Some("folio-test".to_owned());
        let reparsed = Config::from_kdl(&config.to_kdl()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let store = FileStore::new("/nonexistent/folio/config.kdl");
        let config = Config::load(&store).await.unwrap();
        assert_eq!(config, Config::default());
    }
}
