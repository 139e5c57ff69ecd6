//! Loading state machine definitions from configuration sources.
//!
//! A configuration is turned into an ordered list of [`StateDefinition`]s,
//! each mapping message ids to an encoded `"actionName:nextStateId"` spec.
//! The machine splits those specs once, when its registry is built.
//!
//! # Sources
//!
//! - [`ConfigSource::File`]: an external document on disk
//! - [`ConfigSource::Embedded`]: a document compiled into the binary with `include_str!`
//! - [`ConfigSource::Bytes`]: raw bytes already in memory
//!
//! Any other origin can feed the machine by implementing [`StateLoader`].
//!
//! # Formats
//!
//! JSON, YAML and TOML documents share one shape (see [`FsmDocument`]). XML
//! documents use the `<STATE>`/`<MESSAGE>` layout of [`XmlDocument`]. The
//! format comes from the source name's extension, or is sniffed from the
//! content when the name has none. Any other extension is rejected.

pub mod document;
pub mod error;
pub mod validate;

pub use document::{FsmDocument, MessageEntry, StateEntry, XmlDocument, XmlMessage, XmlState};
pub use error::{ConfigError, ConfigViolation};
pub use validate::validate_definitions;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loader output for one state: its id and `message -> "action:nextState"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    pub id: String,
    pub messages: BTreeMap<String, String>,
}

impl StateDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: BTreeMap::new(),
        }
    }

    /// Declare a message, encoding it as `"action:next_state"`.
    pub fn with_message(
        mut self,
        message: impl Into<String>,
        action: &str,
        next_state: &str,
    ) -> Self {
        self.messages
            .insert(message.into(), format!("{}:{}", action, next_state));
        self
    }
}

/// Anything that can produce state definitions in declaration order.
pub trait StateLoader {
    fn load_states(&self) -> Result<Vec<StateDefinition>, ConfigError>;
}

impl StateLoader for [StateDefinition] {
    fn load_states(&self) -> Result<Vec<StateDefinition>, ConfigError> {
        Ok(self.to_vec())
    }
}

impl StateLoader for Vec<StateDefinition> {
    fn load_states(&self) -> Result<Vec<StateDefinition>, ConfigError> {
        Ok(self.clone())
    }
}

/// Supported document formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
    Xml,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Xml => "XML",
        };
        f.write_str(name)
    }
}

impl ConfigFormat {
    /// Format implied by a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Best guess from the document text.
    ///
    /// `{` first means JSON and `<` first means XML. A TOML table header on
    /// an unindented line means TOML. Anything else is read as YAML.
    pub fn detect(contents: &str) -> Self {
        let trimmed = contents.trim_start();
        if trimmed.starts_with('{') {
            Self::Json
        } else if trimmed.starts_with('<') {
            Self::Xml
        } else if contents.lines().any(is_toml_table_header) {
            Self::Toml
        } else {
            Self::Yaml
        }
    }

    /// Parse a document in this format.
    pub fn parse(self, source_name: &str, contents: &str) -> Result<FsmDocument, ConfigError> {
        let parsed = match self {
            Self::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            Self::Xml => quick_xml::de::from_str::<XmlDocument>(contents)
                .map(FsmDocument::from)
                .map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            source_name: source_name.to_string(),
            format: self,
            message,
        })
    }
}

/// Where a configuration document comes from.
#[derive(Clone, Debug)]
pub enum ConfigSource {
    /// External document on disk.
    File(PathBuf),

    /// Document compiled into the binary.
    Embedded {
        name: &'static str,
        contents: &'static str,
    },

    /// Raw document bytes. `format: None` sniffs the content.
    Bytes {
        name: String,
        bytes: Vec<u8>,
        format: Option<ConfigFormat>,
    },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn embedded(name: &'static str, contents: &'static str) -> Self {
        Self::Embedded { name, contents }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>, format: Option<ConfigFormat>) -> Self {
        Self::Bytes {
            name: "<bytes>".to_string(),
            bytes: bytes.into(),
            format,
        }
    }

    /// Drain a reader into a [`ConfigSource::Bytes`].
    pub fn from_reader<R: Read>(
        mut reader: R,
        format: Option<ConfigFormat>,
    ) -> Result<Self, ConfigError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| ConfigError::Io {
                source_name: "<reader>".to_string(),
                source,
            })?;
        Ok(Self::Bytes {
            name: "<reader>".to_string(),
            bytes,
            format,
        })
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { name, .. } => name.to_string(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    fn read(&self) -> Result<(String, ConfigFormat), ConfigError> {
        let name = self.name();
        match self {
            Self::File(path) => {
                let declared = declared_format(path, &name)?;
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                        source_name: name,
                        source,
                    })?;
                let format = declared.unwrap_or_else(|| ConfigFormat::detect(&contents));
                Ok((contents, format))
            }
            Self::Embedded { name, contents } => {
                let format = declared_format(Path::new(name), name)?
                    .unwrap_or_else(|| ConfigFormat::detect(contents));
                Ok((contents.to_string(), format))
            }
            Self::Bytes { bytes, format, .. } => {
                let contents =
                    String::from_utf8(bytes.clone()).map_err(|e| ConfigError::Encoding {
                        source_name: name,
                        message: e.to_string(),
                    })?;
                let format = format.unwrap_or_else(|| ConfigFormat::detect(&contents));
                Ok((contents, format))
            }
        }
    }
}

/// `[table]` or `[[array.of.tables]]` starting at column zero.
fn is_toml_table_header(line: &str) -> bool {
    if line.starts_with(char::is_whitespace) {
        return false;
    }
    let line = line.trim_end();
    let inner = line
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
        .or_else(|| line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')));
    match inner {
        Some(key) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        None => false,
    }
}

/// Format named by the extension, `None` when there is no extension.
fn declared_format(path: &Path, name: &str) -> Result<Option<ConfigFormat>, ConfigError> {
    if path.extension().is_none() {
        return Ok(None);
    }
    ConfigFormat::from_path(path)
        .map(Some)
        .ok_or_else(|| ConfigError::UnsupportedFormat(name.to_string()))
}

impl StateLoader for ConfigSource {
    fn load_states(&self) -> Result<Vec<StateDefinition>, ConfigError> {
        let (contents, format) = self.read()?;
        let name = self.name();
        let definitions = format.parse(&name, &contents)?.into_definitions()?;
        debug!(
            source = %name,
            format = %format,
            states = definitions.len(),
            "Loaded state machine configuration"
        );
        Ok(definitions)
    }
}
