//! Loads the expected OAuth client ID (`google.client-id`) from a configuration file.
//!
//! Two layouts are understood:
//! - a Java-style properties file with the flat key `google.client-id=<value>`,
//! - a YAML file with the nested path `google: { client-id: <value> }`.
//!
//! Files are looked up relative to the resource directory given to `ConfigReader`.
//! Which layout to read is chosen explicitly with `ConfigSource`.
//!
//! # Example
//! ```rust,no_run
//! use tiny_google_signin::config_reader::{ConfigReader, ConfigSource};
//!
//! let reader = ConfigReader::new("resources");
//! let client_id = reader.read_client_id(&ConfigSource::from_config_type("yaml"))?;
//! # Ok::<(), tiny_google_signin::config_reader::ConfigError>(())
//! ```
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::ClientID;

const PROPERTIES_KEY: &str = "google.client-id";
const YAML_SECTION: &str = "google";
const YAML_KEY: &str = "client-id";

const DEFAULT_PROPERTIES_FILE: &str = "application.properties";
const DEFAULT_YAML_FILE: &str = "application.yml";

const WHITESPACE: [char; 3] = [' ', '\t', '\u{c}'];

/// Reasons the client ID could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unable to find resource {0}")]
    ResourceNotFound(String),
    #[error("Failed to read {0}")]
    Read(String),
    #[error("Malformed configuration file {0}")]
    Malformed(String),
    #[error("'google' section not found in {0}")]
    MissingSection(String),
    #[error("'google' section is not a map in {0}")]
    NotAMapping(String),
    #[error("google.client-id not found in {0}")]
    MissingKey(String),
    #[error("google.client-id in {0} is not a scalar value")]
    InvalidValue(String),
    #[error("google.client-id is empty")]
    EmptyValue,
}

/// Selects the file the client ID is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Properties(String),
    Yaml(String),
}

impl ConfigSource {
    /// Maps a `config.type` setting to a source.
    /// Exactly `"yaml"` selects `application.yml`, anything else `application.properties`.
    pub fn from_config_type(config_type: &str) -> Self {
        if config_type == "yaml" {
            Self::Yaml(DEFAULT_YAML_FILE.to_string())
        } else {
            Self::Properties(DEFAULT_PROPERTIES_FILE.to_string())
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Properties(v) => v,
            Self::Yaml(v) => v,
        }
    }
}

/// Reads configuration resources from a single directory.
#[derive(Debug, Clone)]
pub struct ConfigReader {
    resource_dir: PathBuf,
}

impl ConfigReader {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
        }
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Reads the client ID from whichever file `source` names.
    pub fn read_client_id(&self, source: &ConfigSource) -> Result<ClientID, ConfigError> {
        match source {
            ConfigSource::Properties(filename) => self.client_id_from_properties(filename),
            ConfigSource::Yaml(filename) => self.client_id_from_yaml(filename),
        }
    }

    /// Reads `google.client-id` from a properties file.
    pub fn client_id_from_properties(&self, filename: &str) -> Result<ClientID, ConfigError> {
        let content = self.load(filename)?;
        let properties = parse_properties(&content).ok_or_else(|| {
            error!("Malformed \\uxxxx escape in {}", filename);
            ConfigError::Malformed(filename.to_string())
        })?;
        let value = properties.get(PROPERTIES_KEY).ok_or_else(|| {
            error!("{} not found in {}", PROPERTIES_KEY, filename);
            ConfigError::MissingKey(filename.to_string())
        })?;
        non_empty(value)
    }

    /// Reads `google.client-id` from a YAML file.
    /// Numeric and boolean values are rendered as strings. A bare integer too
    /// large for 64 bits does not parse; quote such ids.
    pub fn client_id_from_yaml(&self, filename: &str) -> Result<ClientID, ConfigError> {
        let content = self.load(filename)?;
        let document = serde_yaml::from_str::<Value>(&content).map_err(|e| {
            error!("Failed to parse {}: {}", filename, e);
            ConfigError::Malformed(filename.to_string())
        })?;

        let google = match document.get(YAML_SECTION) {
            None | Some(Value::Null) => {
                error!("'google' section not found in {}", filename);
                return Err(ConfigError::MissingSection(filename.to_string()));
            }
            Some(Value::Mapping(v)) => v,
            Some(_) => {
                error!("'google' section is not a map in {}", filename);
                return Err(ConfigError::NotAMapping(filename.to_string()));
            }
        };

        let value = match google.get(YAML_KEY) {
            None | Some(Value::Null) => {
                error!("{} not found in {}", PROPERTIES_KEY, filename);
                return Err(ConfigError::MissingKey(filename.to_string()));
            }
            Some(Value::String(v)) => v.to_owned(),
            Some(Value::Number(v)) => v.to_string(),
            Some(Value::Bool(v)) => v.to_string(),
            Some(_) => {
                error!("{} in {} is not a scalar", PROPERTIES_KEY, filename);
                return Err(ConfigError::InvalidValue(filename.to_string()));
            }
        };
        non_empty(&value)
    }

    fn load(&self, filename: &str) -> Result<String, ConfigError> {
        let path = self.resource_dir.join(filename);
        debug!("Reading client ID from {}", path.display());
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                error!("Unable to find {}", path.display());
                ConfigError::ResourceNotFound(filename.to_string())
            }
            _ => {
                error!("Failed to read {}: {:?}", path.display(), e);
                ConfigError::Read(filename.to_string())
            }
        })
    }
}

impl Default for ConfigReader {
    fn default() -> Self {
        Self::new(".")
    }
}

fn non_empty(value: &str) -> Result<ClientID, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        error!("{} is empty", PROPERTIES_KEY);
        return Err(ConfigError::EmptyValue);
    }
    Ok(ClientID::new(value))
}

// ==========properties format==========

/// Parses the Java properties format.
/// Returns `None` on a malformed `\u` escape or an unpaired surrogate.
fn parse_properties(input: &str) -> Option<HashMap<String, String>> {
    let mut properties = HashMap::new();
    for line in logical_lines(input) {
        let (key, value) = split_entry(&line);
        properties.insert(unescape(key)?, unescape(value)?);
    }
    Some(properties)
}

/// Joins continuation lines and drops blanks and comments.
/// `\n`, `\r` and `\r\n` all terminate a line.
fn logical_lines(input: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;
    let input = input.replace("\r\n", "\n");
    for raw in input.split(['\n', '\r']) {
        let trimmed = raw.trim_start_matches(WHITESPACE);
        let mut line = match pending.take() {
            Some(mut head) => {
                head.push_str(trimmed);
                head
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
                    continue;
                }
                trimmed.to_string()
            }
        };
        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            line.pop();
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }
    if let Some(line) = pending {
        lines.push(line);
    }
    lines
}

/// Splits at the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut value_start = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            ' ' | '\t' | '\u{c}' => {
                key_end = i;
                let rest = line[i..].trim_start_matches(WHITESPACE);
                value_start = line.len() - rest.len();
                if rest.starts_with(['=', ':']) {
                    value_start += 1;
                }
                break;
            }
            _ => {}
        }
    }
    (
        &line[..key_end],
        line[value_start..].trim_start_matches(WHITESPACE),
    )
}

fn unescape(raw: &str) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut buf = [0u16; 2];
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                        return None;
                    }
                    units.push(u16::from_str_radix(&hex, 16).ok()?);
                    continue;
                }
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('f') => '\u{c}',
                Some(other) => other,
                None => break,
            }
        } else {
            c
        };
        units.extend_from_slice(c.encode_utf16(&mut buf));
    }
    String::from_utf16(&units).ok()
}
