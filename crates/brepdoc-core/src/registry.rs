//! # Defect Registry
//!
//! Attaches metadata (caption, default enablement, priority, weight, settings
//! initializer) to every [`DefectKind`].
//!
//! ## Lifecycle
//!
//! 1. Construct (`DefectRegistry::new` or `DefectRegistry::standard`)
//! 2. Register metadata
//! 3. `validate()` once: every kind missing metadata or weight gets a
//!    conservative default and an [`IntegrityWarning`]
//! 4. Share read-only behind an `Arc`
//!
//! ## Priorities
//!
//! Explicit priorities are non-negative. Kinds registered without one get a
//! synthetic priority counting down from `FIRST_SYNTHETIC_PRIORITY`, which
//! keeps a total, registration-ordered ranking among them, below every
//! explicit priority.

use crate::options::{EnablementSource, OptionRegistrar, OptionValue};
use crate::primitives::{
    FIRST_SYNTHETIC_PRIORITY, MAX_COMPLEXITY, OPT_EDGE_SIMPLIFY_LEVEL, OPT_FACE_SIMPLIFY_LEVEL,
    OPT_MAX_TRIM_EDGE_DISTANCE, OPT_MESH_MAX_DISJOINT_SHELLS, OPT_MESH_SPLIT_VALIDITY_KIND,
    OPT_SMALL_EDGE_LENGTH, OPT_TRIM_SIMPLIFY_LEVEL,
};
use crate::{DefectKind, Severity, Weight};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

/// Hook that declares a kind's tunable options in an external store.
pub type SettingsInitializer = fn(&mut dyn OptionRegistrar);

// =============================================================================
// METADATA
// =============================================================================

/// Metadata of one defect kind.
#[derive(Debug, Clone)]
pub struct DefectMetadata {
    pub kind: DefectKind,
    pub caption: String,
    pub enabled_by_default: bool,
    /// Sort key of priority-ordered reads; higher first.
    pub priority: i32,
    /// True when `priority` was handed out by the registry.
    pub priority_is_synthetic: bool,
    /// `None` only before `validate()`.
    pub weight: Option<Weight>,
    pub settings: Option<SettingsInitializer>,
    /// Records of this kind never reach the fix-plan resolver.
    pub excluded_from_fix_plan: bool,
}

impl DefectMetadata {
    /// The weight, or the conservative fallback if none was registered.
    #[must_use]
    pub fn weight(&self) -> Weight {
        self.weight.unwrap_or(Weight::fallback())
    }
}

/// Builder for one `DefectRegistry::register` call.
#[derive(Debug, Clone)]
pub struct Registration {
    kind: DefectKind,
    caption: String,
    enabled_by_default: bool,
    priority: Option<i32>,
    weight: Option<Weight>,
    settings: Option<SettingsInitializer>,
    excluded_from_fix_plan: bool,
}

impl Registration {
    /// Start a registration. Kinds are enabled by default.
    #[must_use]
    pub fn new(kind: DefectKind, caption: impl Into<String>) -> Self {
        Self {
            kind,
            caption: caption.into(),
            enabled_by_default: true,
            priority: None,
            weight: None,
            settings: None,
            excluded_from_fix_plan: false,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled_by_default: bool) -> Self {
        self.enabled_by_default = enabled_by_default;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn weight(mut self, severity: Severity, complexity: u8, automation_allowed: bool) -> Self {
        // Struct literal so register() can see and report an out-of-range value.
        self.weight = Some(Weight {
            severity,
            complexity,
            automation_allowed,
        });
        self
    }

    #[must_use]
    pub fn settings(mut self, initializer: SettingsInitializer) -> Self {
        self.settings = Some(initializer);
        self
    }

    #[must_use]
    pub fn excluded_from_fix_plan(mut self, excluded: bool) -> Self {
        self.excluded_from_fix_plan = excluded;
        self
    }
}

// =============================================================================
// INTEGRITY WARNINGS
// =============================================================================

/// A developer-facing registration problem. Always auto-healed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// The kind was never registered; a default was synthesized.
    MissingMetadata(DefectKind),
    /// The kind was registered without a weight; the fallback was used.
    MissingWeight(DefectKind),
    /// The kind was registered twice; the later registration won.
    DuplicateRegistration(DefectKind),
    /// An explicit priority was negative and was clamped to 0.
    NegativePriority { kind: DefectKind, priority: i32 },
    /// A weight's complexity exceeded the maximum and was clamped.
    ComplexityClamped { kind: DefectKind, complexity: u8 },
    /// Batch registration arrays had different lengths.
    BatchLengthMismatch {
        kinds: usize,
        captions: usize,
        priorities: usize,
    },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata(kind) => write!(f, "{kind} has no metadata, using defaults"),
            Self::MissingWeight(kind) => write!(f, "{kind} has no weight, using fallback"),
            Self::DuplicateRegistration(kind) => write!(f, "{kind} registered twice"),
            Self::NegativePriority { kind, priority } => {
                write!(f, "{kind} has negative priority {priority}, clamped to 0")
            }
            Self::ComplexityClamped { kind, complexity } => write!(
                f,
                "{kind} complexity {complexity} exceeds {MAX_COMPLEXITY}, clamped"
            ),
            Self::BatchLengthMismatch {
                kinds,
                captions,
                priorities,
            } => write!(
                f,
                "batch registration has {kinds} kinds, {captions} captions, {priorities} priorities"
            ),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Registry of defect-kind metadata.
///
/// Built once per process or session and shared read-only after
/// [`validate`](Self::validate).
pub struct DefectRegistry {
    entries: BTreeMap<DefectKind, DefectMetadata>,
    next_synthetic: i32,
    validated: bool,
    warnings: Vec<IntegrityWarning>,
    enablement: Option<Arc<dyn EnablementSource>>,
}

impl fmt::Debug for DefectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefectRegistry")
            .field("entries", &self.entries.len())
            .field("validated", &self.validated)
            .field("warnings", &self.warnings)
            .field("has_enablement_source", &self.enablement.is_some())
            .finish()
    }
}

impl Default for DefectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DefectRegistry {
    /// Create an empty, unvalidated registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_synthetic: FIRST_SYNTHETIC_PRIORITY,
            validated: false,
            warnings: Vec::new(),
            enablement: None,
        }
    }

    /// The built-in metadata for every kind, already validated.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for registration in standard_registrations() {
            registry.register(registration);
        }
        registry.validate();
        registry
    }

    /// Install metadata for one kind.
    ///
    /// Registering after `validate()` marks the registry unvalidated again.
    pub fn register(&mut self, registration: Registration) -> &DefectMetadata {
        let Registration {
            kind,
            caption,
            enabled_by_default,
            priority,
            weight,
            settings,
            excluded_from_fix_plan,
        } = registration;

        let (priority, priority_is_synthetic) = match priority {
            Some(p) if p < 0 => {
                self.warn(IntegrityWarning::NegativePriority { kind, priority: p });
                (0, false)
            }
            Some(p) => (p, false),
            None => (self.take_synthetic_priority(), true),
        };

        let weight = weight.map(|w| {
            if w.complexity > MAX_COMPLEXITY {
                self.warn(IntegrityWarning::ComplexityClamped {
                    kind,
                    complexity: w.complexity,
                });
            }
            Weight::new(w.severity, w.complexity, w.automation_allowed)
        });

        if self.entries.contains_key(&kind) {
            self.warn(IntegrityWarning::DuplicateRegistration(kind));
        }

        self.validated = false;
        let metadata = DefectMetadata {
            kind,
            caption,
            enabled_by_default,
            priority,
            priority_is_synthetic,
            weight,
            settings,
            excluded_from_fix_plan,
        };
        match self.entries.entry(kind) {
            Entry::Occupied(mut slot) => {
                slot.insert(metadata);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(metadata),
        }
    }

    /// Register kinds from parallel caption and priority arrays.
    ///
    /// Every kind is registered even if the arrays disagree in length: a
    /// missing caption falls back to the kind's name and a missing priority
    /// to a synthetic one. A length mismatch is recorded as a warning.
    /// Returns the number of kinds registered.
    pub fn register_batch(
        &mut self,
        kinds: &[DefectKind],
        captions: &[&str],
        priorities: &[i32],
    ) -> usize {
        if captions.len() != kinds.len() || priorities.len() != kinds.len() {
            self.warn(IntegrityWarning::BatchLengthMismatch {
                kinds: kinds.len(),
                captions: captions.len(),
                priorities: priorities.len(),
            });
        }

        for (i, kind) in kinds.iter().enumerate() {
            let caption = captions
                .get(i)
                .map_or_else(|| kind.name(), |c| (*c).to_string());
            let mut registration = Registration::new(*kind, caption);
            if let Some(priority) = priorities.get(i) {
                registration = registration.priority(*priority);
            }
            self.register(registration);
        }

        kinds.len()
    }

    /// Check that every kind has metadata and a weight.
    ///
    /// Missing pieces are filled with conservative defaults (lowest severity,
    /// complexity 1, no automation). Returns the warnings raised by this
    /// call; a second call on a complete registry returns none.
    pub fn validate(&mut self) -> Vec<IntegrityWarning> {
        let before = self.warnings.len();

        for kind in DefectKind::ALL {
            if !self.entries.contains_key(&kind) {
                self.warn(IntegrityWarning::MissingMetadata(kind));
                let priority = self.take_synthetic_priority();
                self.entries.insert(
                    kind,
                    DefectMetadata {
                        kind,
                        caption: kind.name(),
                        enabled_by_default: true,
                        priority,
                        priority_is_synthetic: true,
                        weight: Some(Weight::fallback()),
                        settings: None,
                        excluded_from_fix_plan: false,
                    },
                );
                continue;
            }

            let missing_weight = self
                .entries
                .get(&kind)
                .is_some_and(|meta| meta.weight.is_none());
            if missing_weight {
                self.warn(IntegrityWarning::MissingWeight(kind));
                if let Some(meta) = self.entries.get_mut(&kind) {
                    meta.weight = Some(Weight::fallback());
                }
            }
        }

        self.validated = true;
        self.warnings[before..].to_vec()
    }

    /// Whether `validate()` ran since the last registration.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// All integrity warnings raised so far.
    #[must_use]
    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// Install a live enablement source consulted by `is_enabled`.
    #[must_use]
    pub fn with_enablement(mut self, source: Arc<dyn EnablementSource>) -> Self {
        self.enablement = Some(source);
        self
    }

    #[must_use]
    pub fn metadata(&self, kind: DefectKind) -> Option<&DefectMetadata> {
        self.entries.get(&kind)
    }

    /// Priority of a kind. Unregistered kinds rank last.
    #[must_use]
    pub fn priority(&self, kind: DefectKind) -> i32 {
        self.entries.get(&kind).map_or(i32::MIN, |meta| meta.priority)
    }

    #[must_use]
    pub fn weight(&self, kind: DefectKind) -> Weight {
        self.entries
            .get(&kind)
            .map_or(Weight::fallback(), DefectMetadata::weight)
    }

    /// Caption of a kind, or its identifier if unregistered.
    #[must_use]
    pub fn caption(&self, kind: DefectKind) -> String {
        self.entries
            .get(&kind)
            .map_or_else(|| kind.name(), |meta| meta.caption.clone())
    }

    /// Live enabled state: the enablement source wins over the default.
    #[must_use]
    pub fn is_enabled(&self, kind: DefectKind) -> bool {
        if let Some(enabled) = self
            .enablement
            .as_ref()
            .and_then(|source| source.enabled_override(kind))
        {
            return enabled;
        }
        self.entries
            .get(&kind)
            .is_some_and(|meta| meta.enabled_by_default)
    }

    #[must_use]
    pub fn is_excluded_from_fix_plan(&self, kind: DefectKind) -> bool {
        self.entries
            .get(&kind)
            .is_some_and(|meta| meta.excluded_from_fix_plan)
    }

    /// Run every settings initializer against `registrar`.
    ///
    /// Returns the number of initializers run.
    pub fn initialize_settings(&self, registrar: &mut dyn OptionRegistrar) -> usize {
        let mut count = 0;
        for meta in self.entries.values() {
            if let Some(init) = meta.settings {
                init(registrar);
                count += 1;
            }
        }
        count
    }

    /// Iterate metadata in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &DefectMetadata> {
        self.entries.values()
    }

    /// Metadata sorted by descending priority.
    #[must_use]
    pub fn by_priority(&self) -> Vec<&DefectMetadata> {
        let mut sorted: Vec<_> = self.entries.values().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        sorted
    }

    fn take_synthetic_priority(&mut self) -> i32 {
        let priority = self.next_synthetic;
        self.next_synthetic = self.next_synthetic.saturating_sub(1);
        priority
    }

    fn warn(&mut self, warning: IntegrityWarning) {
        tracing::warn!(target: "brepdoc_core::registry", "{}", warning);
        self.warnings.push(warning);
    }
}

// =============================================================================
// STANDARD METADATA
// =============================================================================

fn small_edge_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::EdgeIsTooShort,
        OPT_SMALL_EDGE_LENGTH,
        OptionValue::Float(0.001),
    );
}

fn trim_edge_distance_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::TrimFarFromEdge,
        OPT_MAX_TRIM_EDGE_DISTANCE,
        OptionValue::Float(0.01),
    );
}

fn trim_simplify_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::TrimHasTooManyControlPoints,
        OPT_TRIM_SIMPLIFY_LEVEL,
        OptionValue::Int(1),
    );
}

fn edge_simplify_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::EdgeHasTooManyControlPoints,
        OPT_EDGE_SIMPLIFY_LEVEL,
        OptionValue::Int(1),
    );
}

fn face_simplify_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::FaceHasTooManyControlPoints,
        OPT_FACE_SIMPLIFY_LEVEL,
        OptionValue::Int(1),
    );
}

fn mesh_disjoint_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::MeshHasDisjoints,
        OPT_MESH_MAX_DISJOINT_SHELLS,
        OptionValue::Int(0),
    );
}

fn mesh_validity_settings(registrar: &mut dyn OptionRegistrar) {
    registrar.register_option(
        DefectKind::MeshFailedValidation,
        OPT_MESH_SPLIT_VALIDITY_KIND,
        OptionValue::Bool(false),
    );
}

/// Built-in registrations, one per kind.
///
/// Blocking defects get explicit priorities; advisory ones rank among
/// themselves by the order listed here.
fn standard_registrations() -> Vec<Registration> {
    use DefectKind::*;
    use Severity::{Error, Hint, Suggestion, Warning};

    vec![
        // Blocking
        Registration::new(BrepIsEmpty, "Brep is empty")
            .priority(100)
            .weight(Error, 60, false),
        Registration::new(MeshIsEmpty, "Mesh is empty")
            .priority(99)
            .weight(Error, 30, true),
        Registration::new(MeshFailedValidation, "Mesh failed validation")
            .priority(98)
            .weight(Error, 30, true)
            .settings(mesh_validity_settings),
        Registration::new(BrepIsInvalid, "Brep is invalid")
            .priority(95)
            .weight(Error, 50, false),
        Registration::new(MeshHasInvalidFaces, "Mesh has invalid faces")
            .priority(92)
            .weight(Error, 10, true),
        Registration::new(FaceIsInvalid, "Face is invalid")
            .priority(90)
            .weight(Error, 50, false),
        Registration::new(FaceHasNoLoops, "Face has no loops")
            .priority(88)
            .weight(Error, 40, false),
        Registration::new(FaceSurfaceIsInvalid, "Surface is invalid")
            .priority(86)
            .weight(Error, 50, false),
        Registration::new(EdgeIsInvalid, "Edge is invalid")
            .priority(85)
            .weight(Error, 40, false),
        Registration::new(LoopIsEmpty, "Loop has no trims")
            .priority(84)
            .weight(Error, 10, true),
        Registration::new(EdgeHasNoTrims, "Edge has no trims")
            .priority(83)
            .weight(Error, 20, false),
        Registration::new(TrimIsInvalid, "Trim is invalid")
            .priority(82)
            .weight(Error, 40, false),
        Registration::new(TrimHasNoEdge, "Trim has no edge")
            .priority(81)
            .weight(Error, 40, false),
        Registration::new(LoopIsNotClosed, "Loop is not closed")
            .priority(80)
            .weight(Error, 20, true),
        Registration::new(LoopHasWrongDirection, "Loop has wrong direction")
            .priority(78)
            .weight(Error, 5, true),
        Registration::new(VertexIsInvalid, "Vertex is invalid")
            .priority(76)
            .weight(Error, 20, false),
        Registration::new(TrimHasGap, "Trim has a gap to the next trim")
            .priority(75)
            .weight(Error, 10, true),
        // Geometric inconsistencies
        Registration::new(FaceSurfaceIsDegenerate, "Surface is degenerate")
            .priority(70)
            .weight(Warning, 30, false),
        Registration::new(EdgeFarFromTrim, "Edge is far from its trims")
            .priority(66)
            .weight(Warning, 20, true),
        Registration::new(TrimFarFromEdge, "Trim is far from its edge")
            .priority(65)
            .weight(Warning, 20, true)
            .settings(trim_edge_distance_settings),
        Registration::new(TrimInvalidDomainLength, "Trim domain length is invalid")
            .priority(64)
            .weight(Warning, 10, true),
        Registration::new(EdgeInvalidDomainLength, "Edge domain length is invalid")
            .priority(63)
            .weight(Warning, 10, true),
        Registration::new(TrimIsOutsideSurfaceDomain, "Trim is outside the surface domain")
            .priority(62)
            .weight(Warning, 30, true),
        Registration::new(BrepHasDisjoints, "Brep has disjoint pieces")
            .priority(60)
            .weight(Warning, 40, false),
        Registration::new(VertexFarFromEdges, "Vertex is far from its edges")
            .priority(58)
            .weight(Warning, 10, true),
        Registration::new(MeshHasDisjoints, "Mesh has disjoint pieces")
            .priority(57)
            .weight(Warning, 30, false)
            .settings(mesh_disjoint_settings),
        Registration::new(EdgeIsNonManifold, "Edge is non-manifold")
            .priority(55)
            .weight(Warning, 50, false),
        Registration::new(EdgeIsNaked, "Edge is naked")
            .priority(50)
            .weight(Warning, 20, true),
        // Advisory, ranked by listing order
        Registration::new(EdgeIsTooShort, "Edge is too short")
            .weight(Warning, 10, true)
            .settings(small_edge_settings),
        Registration::new(TrimIsTooShort, "Trim is too short").weight(Warning, 10, true),
        Registration::new(FaceHasBadUvDomain, "Surface UV domain is badly proportioned")
            .weight(Suggestion, 10, true),
        Registration::new(
            FaceHasTooManyControlPoints,
            "Surface has too many control points",
        )
        .weight(Suggestion, 20, true)
        .settings(face_simplify_settings),
        Registration::new(TrimHasTooManyControlPoints, "Trim has too many control points")
            .weight(Suggestion, 10, true)
            .settings(trim_simplify_settings),
        Registration::new(EdgeHasTooManyControlPoints, "Edge has too many control points")
            .weight(Suggestion, 10, true)
            .settings(edge_simplify_settings),
        Registration::new(VertexIsDuplicated, "Vertex is duplicated").weight(Suggestion, 5, true),
        Registration::new(VertexIsUnused, "Vertex is not used by any edge")
            .weight(Suggestion, 1, true),
        Registration::new(MeshHasUnattachedVertices, "Mesh has unattached vertices")
            .weight(Suggestion, 1, true),
        Registration::new(BrepIsNotClosed, "Brep is not closed")
            .enabled(false)
            .weight(Suggestion, 30, false),
        Registration::new(FaceIsTooSmall, "Face is too small")
            .enabled(false)
            .weight(Hint, 20, false),
        Registration::new(EdgeHasKinks, "Edge has kinks")
            .enabled(false)
            .weight(Hint, 20, true),
        // Detected upstream but never repaired from this layer.
        Registration::new(VertexFarFromTrims, "Vertex is far from its trims")
            .enabled(false)
            .weight(Hint, 10, false)
            .excluded_from_fix_plan(true),
    ]
}

// =============================================================================
// TESTS
// =============================================================================
