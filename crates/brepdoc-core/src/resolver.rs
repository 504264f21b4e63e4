//! # Fix-Plan Resolver
//!
//! Turns a snapshot of problem records into a [`FixPlan`]: the set of repair
//! directives a repair executor should run, plus whether any problem was
//! fixable and why others were not.
//!
//! ## Algorithm
//!
//! Single pass over the records, in collection order:
//! - kinds the registry excludes from fix planning are skipped
//! - an explicit `NotFixable` override records its reason and contributes
//!   no directive
//! - otherwise the kind's [`FixAction`] sets a directive, or records the
//!   generic "not implemented" reason
//!
//! Then one precedence rule: when both `RecreateEdgeFromTrim` and
//! `RecreateTrimFromEdge` are set, trims are trusted over edges and
//! `RecreateEdgeFromTrim` is cleared. `has_fixable_problem` is not revisited.

use crate::primitives::REASON_SEPARATOR;
use crate::{DefectKind, DefectRegistry, Fixability, ProblemRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DIRECTIVES
// =============================================================================

/// A named repair strategy. The repair itself is performed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Directive {
    RebuildUv,
    RebuildSurface,
    SimplifySurfaceControlPoints,
    SimplifyTrimControlPoints,
    SimplifyEdgeControlPoints,
    RecreateTrimFromEdge,
    RecreateEdgeFromTrim,
    CloseTrimGaps,
    ReverseLoop,
    RemoveEmptyLoops,
    RemoveShortTrims,
    RemoveShortEdges,
    JoinNakedEdges,
    MoveVertexToEdges,
    MergeDuplicateVertices,
    RemoveUnusedVertices,
    RebuildMesh,
    CullInvalidMeshFaces,
    CullUnattachedMeshVertices,
}

impl Directive {
    /// Every directive, in declaration order.
    pub const ALL: [Directive; 19] = [
        Directive::RebuildUv,
        Directive::RebuildSurface,
        Directive::SimplifySurfaceControlPoints,
        Directive::SimplifyTrimControlPoints,
        Directive::SimplifyEdgeControlPoints,
        Directive::RecreateTrimFromEdge,
        Directive::RecreateEdgeFromTrim,
        Directive::CloseTrimGaps,
        Directive::ReverseLoop,
        Directive::RemoveEmptyLoops,
        Directive::RemoveShortTrims,
        Directive::RemoveShortEdges,
        Directive::JoinNakedEdges,
        Directive::MoveVertexToEdges,
        Directive::MergeDuplicateVertices,
        Directive::RemoveUnusedVertices,
        Directive::RebuildMesh,
        Directive::CullInvalidMeshFaces,
        Directive::CullUnattachedMeshVertices,
    ];

    /// Stable snake_case name of the directive.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Directive::RebuildUv => "rebuild_uv",
            Directive::RebuildSurface => "rebuild_surface",
            Directive::SimplifySurfaceControlPoints => "simplify_surface_control_points",
            Directive::SimplifyTrimControlPoints => "simplify_trim_control_points",
            Directive::SimplifyEdgeControlPoints => "simplify_edge_control_points",
            Directive::RecreateTrimFromEdge => "recreate_trim_from_edge",
            Directive::RecreateEdgeFromTrim => "recreate_edge_from_trim",
            Directive::CloseTrimGaps => "close_trim_gaps",
            Directive::ReverseLoop => "reverse_loop",
            Directive::RemoveEmptyLoops => "remove_empty_loops",
            Directive::RemoveShortTrims => "remove_short_trims",
            Directive::RemoveShortEdges => "remove_short_edges",
            Directive::JoinNakedEdges => "join_naked_edges",
            Directive::MoveVertexToEdges => "move_vertex_to_edges",
            Directive::MergeDuplicateVertices => "merge_duplicate_vertices",
            Directive::RemoveUnusedVertices => "remove_unused_vertices",
            Directive::RebuildMesh => "rebuild_mesh",
            Directive::CullInvalidMeshFaces => "cull_invalid_mesh_faces",
            Directive::CullUnattachedMeshVertices => "cull_unattached_mesh_vertices",
        }
    }
}

/// What the resolver does with a record of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixAction {
    Apply(Directive),
    /// Not fixable from this layer: needs context the detector does not have.
    NotImplemented,
}

/// The fixed kind -> repair mapping.
#[must_use]
pub const fn fix_action(kind: DefectKind) -> FixAction {
    use DefectKind::*;
    use FixAction::{Apply, NotImplemented};

    match kind {
        BrepIsEmpty | BrepIsInvalid | BrepHasDisjoints => NotImplemented,
        BrepIsNotClosed => Apply(Directive::JoinNakedEdges),

        FaceIsInvalid | FaceHasNoLoops | FaceSurfaceIsInvalid | FaceIsTooSmall => NotImplemented,
        FaceSurfaceIsDegenerate => Apply(Directive::RebuildSurface),
        FaceHasBadUvDomain => Apply(Directive::RebuildUv),
        FaceHasTooManyControlPoints => Apply(Directive::SimplifySurfaceControlPoints),

        LoopIsEmpty => Apply(Directive::RemoveEmptyLoops),
        LoopIsNotClosed => Apply(Directive::CloseTrimGaps),
        LoopHasWrongDirection => Apply(Directive::ReverseLoop),

        TrimIsInvalid | TrimHasNoEdge => NotImplemented,
        TrimIsTooShort => Apply(Directive::RemoveShortTrims),
        TrimHasTooManyControlPoints => Apply(Directive::SimplifyTrimControlPoints),
        TrimFarFromEdge | TrimInvalidDomainLength => Apply(Directive::RecreateTrimFromEdge),
        TrimHasGap => Apply(Directive::CloseTrimGaps),
        TrimIsOutsideSurfaceDomain => Apply(Directive::RebuildUv),

        EdgeIsInvalid | EdgeHasNoTrims | EdgeIsNonManifold => NotImplemented,
        EdgeIsNaked => Apply(Directive::JoinNakedEdges),
        EdgeIsTooShort => Apply(Directive::RemoveShortEdges),
        EdgeInvalidDomainLength | EdgeFarFromTrim | EdgeHasKinks => {
            Apply(Directive::RecreateEdgeFromTrim)
        }
        EdgeHasTooManyControlPoints => Apply(Directive::SimplifyEdgeControlPoints),

        VertexIsInvalid | VertexFarFromTrims => NotImplemented,
        VertexIsUnused => Apply(Directive::RemoveUnusedVertices),
        VertexFarFromEdges => Apply(Directive::MoveVertexToEdges),
        VertexIsDuplicated => Apply(Directive::MergeDuplicateVertices),

        MeshIsEmpty | MeshFailedValidation => Apply(Directive::RebuildMesh),
        MeshHasDisjoints => NotImplemented,
        MeshHasInvalidFaces => Apply(Directive::CullInvalidMeshFaces),
        MeshHasUnattachedVertices => Apply(Directive::CullUnattachedMeshVertices),
    }
}

// =============================================================================
// FIX PLAN
// =============================================================================

/// The resolved repair plan of one problem-collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixPlan {
    directives: BTreeSet<Directive>,
    has_fixable_problem: bool,
    has_unfixable_problem: bool,
    /// Distinct non-empty reasons, in first-seen order.
    unfixable_reasons: Vec<String>,
}

impl FixPlan {
    /// Resolve a plan from records in collection order.
    pub fn resolve<'a, I>(records: I, registry: &DefectRegistry) -> Self
    where
        I: IntoIterator<Item = &'a ProblemRecord>,
    {
        let mut plan = FixPlan::default();

        for record in records {
            let kind = record.kind();
            if registry.is_excluded_from_fix_plan(kind) {
                continue;
            }

            if let Fixability::NotFixable { reason } = record.fixability() {
                plan.has_unfixable_problem = true;
                plan.add_reason(reason);
                continue;
            }

            match fix_action(kind) {
                FixAction::Apply(directive) => {
                    plan.directives.insert(directive);
                    plan.has_fixable_problem = true;
                }
                FixAction::NotImplemented => {
                    plan.has_unfixable_problem = true;
                    let reason = format!(
                        "automatic fix not implemented yet for {}",
                        registry.caption(kind).to_lowercase()
                    );
                    plan.add_reason(&reason);
                }
            }
        }

        if plan.directives.contains(&Directive::RecreateTrimFromEdge)
            && plan.directives.remove(&Directive::RecreateEdgeFromTrim)
        {
            tracing::debug!("edge and trim recreation both requested, keeping trim from edge");
        }

        plan
    }

    /// Whether a directive is set.
    #[must_use]
    pub fn is_set(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }

    /// Set directives in declaration order.
    pub fn directives(&self) -> impl Iterator<Item = Directive> + '_ {
        self.directives.iter().copied()
    }

    /// Every directive by name with its flag.
    #[must_use]
    pub fn flags(&self) -> BTreeMap<&'static str, bool> {
        Directive::ALL
            .iter()
            .map(|d| (d.name(), self.is_set(*d)))
            .collect()
    }

    /// At least one problem mapped to a directive.
    #[must_use]
    pub fn has_fixable_problem(&self) -> bool {
        self.has_fixable_problem
    }

    /// At least one problem cannot be fixed automatically.
    #[must_use]
    pub fn has_unfixable_problem(&self) -> bool {
        self.has_unfixable_problem
    }

    /// Reasons for unfixable problems, `"; "`-joined.
    #[must_use]
    pub fn unfixable_reasons(&self) -> String {
        self.unfixable_reasons.join(REASON_SEPARATOR)
    }

    /// Reasons for unfixable problems, one per distinct reason.
    #[must_use]
    pub fn reasons(&self) -> &[String] {
        &self.unfixable_reasons
    }

    /// No directive set and nothing unfixable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && !self.has_unfixable_problem
    }

    fn add_reason(&mut self, reason: &str) {
        if reason.is_empty() || self.unfixable_reasons.iter().any(|known| known == reason) {
            return;
        }
        self.unfixable_reasons.push(reason.to_string());
    }
}

// =============================================================================
// TESTS
// =============================================================================
