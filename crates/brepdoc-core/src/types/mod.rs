//! # Core Type Definitions
//!
//! This module contains the small value types shared by every part of the
//! defect engine:
//! - Component identifiers (`ComponentKind`, `ComponentIdentity`, `IndexBase`)
//! - Classification values (`Severity`, `Weight`)
//! - Per-record fixability override (`Fixability`)
//! - Opaque detector payloads (`Payload`)
//! - Error types (`BrepdocError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier and classification types implement `Ord` so they can key
//! `BTreeMap`/`BTreeSet` collections with a stable iteration order.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::primitives::MAX_COMPLEXITY;

// =============================================================================
// COMPONENT IDENTITY
// =============================================================================

/// The kind of topological element a problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Face,
    Edge,
    Loop,
    Trim,
    Vertex,
    MeshFace,
    /// No specific component.
    Unset,
}

impl ComponentKind {
    /// Short human noun used as the prefix of a formatted problem.
    ///
    /// Returns `None` for `Unset`, which is rendered without a prefix.
    #[must_use]
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ComponentKind::Face => Some("Face"),
            ComponentKind::Edge => Some("Edge"),
            ComponentKind::Loop => Some("Loop"),
            ComponentKind::Trim => Some("Trim"),
            ComponentKind::Vertex => Some("Vertex"),
            ComponentKind::MeshFace => Some("Mesh face"),
            ComponentKind::Unset => None,
        }
    }
}

/// Identifies which topological element a problem refers to.
///
/// Two identities are equal iff kind and index match. `Unset` is the
/// sentinel for "no specific component"; it always carries index `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentIdentity {
    pub kind: ComponentKind,
    pub index: i32,
}

impl ComponentIdentity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(kind: ComponentKind, index: i32) -> Self {
        Self { kind, index }
    }

    /// The "no specific component" sentinel.
    #[must_use]
    pub const fn unset() -> Self {
        Self {
            kind: ComponentKind::Unset,
            index: -1,
        }
    }

    #[must_use]
    pub const fn face(index: i32) -> Self {
        Self::new(ComponentKind::Face, index)
    }

    #[must_use]
    pub const fn edge(index: i32) -> Self {
        Self::new(ComponentKind::Edge, index)
    }

    #[must_use]
    pub const fn loop_(index: i32) -> Self {
        Self::new(ComponentKind::Loop, index)
    }

    #[must_use]
    pub const fn trim(index: i32) -> Self {
        Self::new(ComponentKind::Trim, index)
    }

    #[must_use]
    pub const fn vertex(index: i32) -> Self {
        Self::new(ComponentKind::Vertex, index)
    }

    #[must_use]
    pub const fn mesh_face(index: i32) -> Self {
        Self::new(ComponentKind::MeshFace, index)
    }

    /// Check if this is the `Unset` sentinel.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self.kind, ComponentKind::Unset)
    }
}

impl Default for ComponentIdentity {
    fn default() -> Self {
        Self::unset()
    }
}

/// Whether component numbers are shown to the user starting at 0 or at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// Shift a raw component index into the displayed number.
    #[must_use]
    pub fn display(&self, index: i32) -> i64 {
        match self {
            IndexBase::Zero => i64::from(index),
            IndexBase::One => i64::from(index).saturating_add(1),
        }
    }

    /// Build from the numeric setting used in configuration files (0 or 1).
    #[must_use]
    pub fn from_first_number(first: u8) -> Option<Self> {
        match first {
            0 => Some(IndexBase::Zero),
            1 => Some(IndexBase::One),
            _ => None,
        }
    }
}

// =============================================================================
// SEVERITY & WEIGHT
// =============================================================================

/// Severity tier of a defect kind, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    #[default]
    Hint,
    Suggestion,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hint => "hint",
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Severity, repair complexity and automation flag of one defect kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weight {
    pub severity: Severity,
    /// Repair complexity in `0..=MAX_COMPLEXITY`.
    pub complexity: u8,
    /// Whether a repair may run without asking the user.
    pub automation_allowed: bool,
}

impl Weight {
    /// Create a weight. Complexity is clamped to `MAX_COMPLEXITY`.
    #[must_use]
    pub fn new(severity: Severity, complexity: u8, automation_allowed: bool) -> Self {
        Self {
            severity,
            complexity: complexity.min(MAX_COMPLEXITY),
            automation_allowed,
        }
    }

    /// Conservative weight used when a kind was registered without one.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            severity: Severity::Hint,
            complexity: 1,
            automation_allowed: false,
        }
    }
}

// =============================================================================
// FIXABILITY
// =============================================================================

/// Per-record override of whether a problem can be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fixability {
    /// Not decided by the detector; the kind's fix mapping decides.
    #[default]
    Unknown,
    /// The detector confirmed the problem can be repaired.
    ///
    /// Informational only: the resolver treats it like `Unknown`, so a kind
    /// without a mapped directive is still reported as unfixable.
    Fixable,
    /// The detector knows this occurrence cannot be repaired.
    NotFixable { reason: String },
}

impl Fixability {
    /// Shorthand for `NotFixable`.
    #[must_use]
    pub fn not_fixable(reason: impl Into<String>) -> Self {
        Self::NotFixable {
            reason: reason.into(),
        }
    }

    /// Check if this is an explicit "not fixable" override.
    #[must_use]
    pub fn is_not_fixable(&self) -> bool {
        matches!(self, Fixability::NotFixable { .. })
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// Opaque detector data attached to a problem.
///
/// Shared, never owned: dropping a record only drops its handle, so the
/// payload stays alive for anyone else holding it.
pub type Payload = Arc<dyn Any + Send + Sync>;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in brepdoc.
///
/// "Not found" situations are never errors: they are `Option`, `bool` or an
/// empty string. These variants cover misuse and bad external input.
#[derive(Debug, Error)]
pub enum BrepdocError {
    /// A collection was created over a registry that was never validated.
    #[error("Defect registry used before validate()")]
    RegistryNotValidated,

    /// A configuration option was given a value of the wrong type.
    #[error("Option '{name}' expects a {expected} value")]
    OptionTypeMismatch { name: String, expected: &'static str },

    /// A configuration option name that no defect kind registered.
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// External input (mesh, topology, configuration) is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality_needs_kind_and_index() {
        assert_eq!(ComponentIdentity::edge(3), ComponentIdentity::edge(3));
        assert_ne!(ComponentIdentity::edge(3), ComponentIdentity::trim(3));
        assert_ne!(ComponentIdentity::edge(3), ComponentIdentity::edge(4));
    }

    #[test]
    fn unset_sentinel() {
        let unset = ComponentIdentity::default();
        assert!(unset.is_unset());
        assert_eq!(unset.kind.label(), None);
        assert!(!ComponentIdentity::face(0).is_unset());
    }

    #[test]
    fn index_base_shifts_display_number() {
        assert_eq!(IndexBase::Zero.display(4), 4);
        assert_eq!(IndexBase::One.display(4), 5);
        assert_eq!(IndexBase::One.display(i32::MAX), i64::from(i32::MAX) + 1);
        assert_eq!(IndexBase::from_first_number(1), Some(IndexBase::One));
        assert_eq!(IndexBase::from_first_number(2), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Hint < Severity::Suggestion);
        assert!(Severity::Suggestion < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn weight_complexity_is_clamped() {
        let weight = Weight::new(Severity::Error, 200, true);
        assert_eq!(weight.complexity, MAX_COMPLEXITY);
    }

    #[test]
    fn fixability_default_is_unknown() {
        assert_eq!(Fixability::default(), Fixability::Unknown);
        assert!(Fixability::not_fixable("x").is_not_fixable());
        assert!(!Fixability::Fixable.is_not_fixable());
    }
}
