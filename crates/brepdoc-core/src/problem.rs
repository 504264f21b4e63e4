//! # Problem Record
//!
//! One detected defect: its kind, the component it belongs to, the
//! component shown to the user, a human-readable text, an optional payload
//! and an optional fixability override.
//!
//! Records are immutable once built. Collections share them through `Arc`,
//! so a duplicated collection sees the same records as its source.

use crate::{ComponentIdentity, DefectKind, Fixability, IndexBase, Payload};
use std::any::Any;
use std::fmt;

/// A single detected defect.
#[derive(Clone)]
pub struct ProblemRecord {
    real: ComponentIdentity,
    display: ComponentIdentity,
    kind: DefectKind,
    text: String,
    payload: Option<Payload>,
    fixability: Fixability,
}

impl fmt::Debug for ProblemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemRecord")
            .field("real", &self.real)
            .field("display", &self.display)
            .field("kind", &self.kind)
            .field("text", &self.text)
            .field("has_payload", &self.payload.is_some())
            .field("fixability", &self.fixability)
            .finish()
    }
}

impl ProblemRecord {
    /// Create a record whose real and display components coincide.
    #[must_use]
    pub fn new(component: ComponentIdentity, text: impl Into<String>, kind: DefectKind) -> Self {
        Self::aliased(component, component, text, kind)
    }

    /// Create a record shown under a different component than it belongs to.
    ///
    /// Used for edge defects, which are displayed with their owning trim.
    #[must_use]
    pub fn aliased(
        real: ComponentIdentity,
        display: ComponentIdentity,
        text: impl Into<String>,
        kind: DefectKind,
    ) -> Self {
        Self {
            real,
            display,
            kind,
            text: text.into(),
            payload: None,
            fixability: Fixability::Unknown,
        }
    }

    /// Attach a payload. The record shares it and never disposes it.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_fixability(mut self, fixability: Fixability) -> Self {
        self.fixability = fixability;
        self
    }

    /// Mark this occurrence as not fixable.
    #[must_use]
    pub fn not_fixable(self, reason: impl Into<String>) -> Self {
        self.with_fixability(Fixability::not_fixable(reason))
    }

    /// The element the defect belongs to.
    #[must_use]
    pub fn real(&self) -> ComponentIdentity {
        self.real
    }

    /// The element shown to the user.
    #[must_use]
    pub fn display(&self) -> ComponentIdentity {
        self.display
    }

    #[must_use]
    pub fn kind(&self) -> DefectKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Downcast the payload to a concrete type.
    #[must_use]
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    #[must_use]
    pub fn fixability(&self) -> &Fixability {
        &self.fixability
    }

    /// Render as `"<Label> <number>: <text>"`, or just `<text>` when the
    /// display component is unset.
    #[must_use]
    pub fn format(&self, base: IndexBase) -> String {
        match self.display.kind.label() {
            Some(label) => format!(
                "{} {}: {}",
                label,
                base.display(self.display.index),
                self.text
            ),
            None => self.text.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
