//! # Options Module
//!
//! The configuration surface of the defect engine.
//!
//! Defect kinds with tunable thresholds register named, typed options with
//! defaults through an [`OptionRegistrar`]. Detectors read the *current*
//! value through an [`OptionAccessor`] at detection time. Persistence is the
//! caller's business; [`OptionStore`] is the in-memory store used by the app.

use crate::{BrepdocError, DefectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

// =============================================================================
// OPTION VALUE
// =============================================================================

/// A typed option value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl OptionValue {
    /// Name of the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "float",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view. Integers widen to floats.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            OptionValue::Bool(_) => None,
        }
    }

    /// Coerce `self` into the type of `template`, if compatible.
    fn coerce_like(self, template: OptionValue) -> Option<OptionValue> {
        match template {
            OptionValue::Bool(_) => self.as_bool().map(OptionValue::Bool),
            OptionValue::Int(_) => self.as_int().map(OptionValue::Int),
            OptionValue::Float(_) => self.as_float().map(OptionValue::Float),
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Sink for the options a defect kind's settings initializer declares.
pub trait OptionRegistrar {
    /// Declare option `name`, owned by `owner`, with its default value.
    ///
    /// Declaring an existing name again keeps the current value.
    fn register_option(&mut self, owner: DefectKind, name: &'static str, default: OptionValue);
}

/// Read access to the current option values.
pub trait OptionAccessor {
    /// Current value of `name`, or `None` if nobody declared it.
    fn option(&self, name: &str) -> Option<OptionValue>;

    fn bool_or(&self, name: &str, default: bool) -> bool {
        self.option(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    fn int_or(&self, name: &str, default: i64) -> i64 {
        self.option(name).and_then(|v| v.as_int()).unwrap_or(default)
    }

    fn float_or(&self, name: &str, default: f64) -> f64 {
        self.option(name)
            .and_then(|v| v.as_float())
            .unwrap_or(default)
    }
}

/// Live enabled/disabled overrides for defect kinds.
///
/// Consulted by `DefectRegistry::is_enabled`; `None` means "use the
/// registry's default".
pub trait EnablementSource: Send + Sync {
    fn enabled_override(&self, kind: DefectKind) -> Option<bool>;
}

impl<T: EnablementSource> EnablementSource for RwLock<T> {
    fn enabled_override(&self, kind: DefectKind) -> Option<bool> {
        self.read().ok()?.enabled_override(kind)
    }
}

// =============================================================================
// OPTION STORE
// =============================================================================

/// One declared option.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredOption {
    /// The defect kind whose settings initializer declared it.
    pub owner: DefectKind,
    pub default: OptionValue,
    pub value: OptionValue,
}

/// In-memory option and enablement store.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    options: BTreeMap<String, DeclaredOption>,
    enabled: BTreeMap<DefectKind, bool>,
}

impl OptionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current value of a declared option.
    ///
    /// Integers are accepted for float options. Any other type change is an
    /// `OptionTypeMismatch`.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), BrepdocError> {
        let declared = self
            .options
            .get_mut(name)
            .ok_or_else(|| BrepdocError::UnknownOption(name.to_string()))?;

        declared.value =
            value
                .coerce_like(declared.default)
                .ok_or_else(|| BrepdocError::OptionTypeMismatch {
                    name: name.to_string(),
                    expected: declared.default.type_name(),
                })?;
        Ok(())
    }

    /// Restore the default of a declared option.
    pub fn reset(&mut self, name: &str) -> Result<(), BrepdocError> {
        let declared = self
            .options
            .get_mut(name)
            .ok_or_else(|| BrepdocError::UnknownOption(name.to_string()))?;
        declared.value = declared.default;
        Ok(())
    }

    /// Force a kind on or off, overriding the registry default.
    pub fn set_enabled(&mut self, kind: DefectKind, enabled: bool) {
        self.enabled.insert(kind, enabled);
    }

    /// Drop the override for a kind.
    pub fn clear_enabled(&mut self, kind: DefectKind) {
        self.enabled.remove(&kind);
    }

    /// Look up a declared option.
    #[must_use]
    pub fn declared(&self, name: &str) -> Option<&DeclaredOption> {
        self.options.get(name)
    }

    /// Iterate declared options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeclaredOption)> {
        self.options.iter().map(|(name, opt)| (name.as_str(), opt))
    }

    /// Number of declared options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl OptionRegistrar for OptionStore {
    fn register_option(&mut self, owner: DefectKind, name: &'static str, default: OptionValue) {
        self.options
            .entry(name.to_string())
            .or_insert(DeclaredOption {
                owner,
                default,
                value: default,
            });
    }
}

impl OptionAccessor for OptionStore {
    fn option(&self, name: &str) -> Option<OptionValue> {
        self.options.get(name).map(|opt| opt.value)
    }
}

impl EnablementSource for OptionStore {
    fn enabled_override(&self, kind: DefectKind) -> Option<bool> {
        self.enabled.get(&kind).copied()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_threshold() -> OptionStore {
        let mut store = OptionStore::new();
        store.register_option(DefectKind::EdgeIsTooShort, "edge.len", OptionValue::Float(0.5));
        store.register_option(DefectKind::MeshHasDisjoints, "mesh.max", OptionValue::Int(0));
        store
    }

    #[test]
    fn declared_default_is_current_value() {
        let store = store_with_threshold();
        assert_eq!(store.option("edge.len"), Some(OptionValue::Float(0.5)));
        assert_eq!(store.int_or("mesh.max", 7), 0);
        assert_eq!(store.int_or("missing", 7), 7);
    }

    #[test]
    fn set_accepts_int_for_float() {
        let mut store = store_with_threshold();
        store.set("edge.len", OptionValue::Int(2)).expect("set");
        assert_eq!(store.option("edge.len"), Some(OptionValue::Float(2.0)));
    }

    #[test]
    fn set_rejects_wrong_type() {
        let mut store = store_with_threshold();
        let result = store.set("mesh.max", OptionValue::Bool(true));
        assert!(matches!(
            result,
            Err(BrepdocError::OptionTypeMismatch {
                expected: "integer",
                ..
            })
        ));
    }

    #[test]
    fn set_rejects_unknown_name() {
        let mut store = store_with_threshold();
        let result = store.set("nope", OptionValue::Int(1));
        assert!(matches!(result, Err(BrepdocError::UnknownOption(_))));
    }

    #[test]
    fn redeclaring_keeps_current_value() {
        let mut store = store_with_threshold();
        store.set("mesh.max", OptionValue::Int(3)).expect("set");
        store.register_option(DefectKind::MeshHasDisjoints, "mesh.max", OptionValue::Int(0));
        assert_eq!(store.int_or("mesh.max", 0), 3);

        store.reset("mesh.max").expect("reset");
        assert_eq!(store.int_or("mesh.max", 9), 0);
    }

    #[test]
    fn enablement_overrides() {
        let mut store = OptionStore::new();
        assert_eq!(store.enabled_override(DefectKind::EdgeIsNaked), None);

        store.set_enabled(DefectKind::EdgeIsNaked, false);
        assert_eq!(store.enabled_override(DefectKind::EdgeIsNaked), Some(false));

        let shared = RwLock::new(store);
        assert_eq!(shared.enabled_override(DefectKind::EdgeIsNaked), Some(false));
    }
}
