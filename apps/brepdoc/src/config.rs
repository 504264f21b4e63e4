//! # Configuration
//!
//! Optional TOML configuration of the brepdoc binary.
//!
//! ```toml
//! first_index = 1
//!
//! [options]
//! "mesh.max_disjoint_shells" = 2
//! "edge.small_length" = 0.01
//!
//! [enabled]
//! EdgeHasKinks = true
//! VertexIsUnused = false
//! ```
//!
//! The file is taken from `--config`, then from `BREPDOC_CONFIG`. Without
//! either, every default applies.

use brepdoc_core::{BrepdocError, DefectKind, IndexBase, IssueSession, OptionStore, OptionValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "BREPDOC_CONFIG";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number shown for the first component: 0 or 1.
    pub first_index: u8,
    /// Option name → value; applied over the registered defaults.
    pub options: BTreeMap<String, toml::Value>,
    /// Defect kind identifier → enabled.
    pub enabled: BTreeMap<String, bool>,
}

impl Config {
    /// Load from `path`, else from `BREPDOC_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, BrepdocError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Read and parse one configuration file.
    pub fn from_file(path: &Path) -> Result<Self, BrepdocError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            BrepdocError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(BrepdocError::InvalidInput(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            BrepdocError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, BrepdocError> {
        toml::from_str(text).map_err(|e| BrepdocError::Serialization(e.to_string()))
    }

    /// The display index base named by `first_index`.
    pub fn index_base(&self) -> Result<IndexBase, BrepdocError> {
        IndexBase::from_first_number(self.first_index).ok_or_else(|| {
            BrepdocError::InvalidInput(format!(
                "first_index must be 0 or 1, got {}",
                self.first_index
            ))
        })
    }

    /// Apply option values and enablement overrides to a store whose
    /// options are already registered.
    pub fn apply(&self, store: &mut OptionStore) -> Result<(), BrepdocError> {
        for (name, value) in &self.options {
            store.set(name, option_value(name, value)?)?;
        }
        for (name, enabled) in &self.enabled {
            let kind = DefectKind::from_name(name).ok_or_else(|| {
                BrepdocError::InvalidInput(format!("Unknown defect kind: {}", name))
            })?;
            store.set_enabled(kind, *enabled);
        }
        Ok(())
    }

    /// A standard session with this configuration applied.
    pub fn session(&self) -> Result<IssueSession, BrepdocError> {
        let index_base = self.index_base()?;
        let session = IssueSession::standard()?;
        {
            let mut store = session
                .options()
                .write()
                .map_err(|_| BrepdocError::InvalidInput("option store lock poisoned".into()))?;
            self.apply(&mut store)?;
        }
        Ok(session.with_index_base(index_base))
    }
}

/// Convert a TOML scalar into an option value.
fn option_value(name: &str, value: &toml::Value) -> Result<OptionValue, BrepdocError> {
    match value {
        toml::Value::Boolean(b) => Ok(OptionValue::Bool(*b)),
        toml::Value::Integer(i) => Ok(OptionValue::Int(*i)),
        toml::Value::Float(f) => Ok(OptionValue::Float(*f)),
        other => Err(BrepdocError::OptionTypeMismatch {
            name: name.to_string(),
            expected: match other {
                toml::Value::String(_) => "bool, integer or float (not a string)",
                _ => "bool, integer or float",
            },
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
