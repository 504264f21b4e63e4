//! # Defect Kinds
//!
//! The closed set of recognized topological and geometric problems.
//!
//! The set is fixed at compile time. The registry only attaches metadata to
//! these values; it never introduces new kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The element a defect kind afflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementGroup {
    Brep,
    Face,
    Loop,
    Trim,
    Edge,
    Vertex,
    Mesh,
}

/// One recognized topological or geometric problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DefectKind {
    // Brep
    BrepIsEmpty,
    BrepIsInvalid,
    BrepHasDisjoints,
    BrepIsNotClosed,
    // Face
    FaceIsInvalid,
    FaceHasNoLoops,
    FaceSurfaceIsInvalid,
    FaceSurfaceIsDegenerate,
    FaceHasBadUvDomain,
    FaceHasTooManyControlPoints,
    FaceIsTooSmall,
    // Loop
    LoopIsEmpty,
    LoopIsNotClosed,
    LoopHasWrongDirection,
    // Trim
    TrimIsInvalid,
    TrimHasNoEdge,
    TrimIsTooShort,
    TrimHasTooManyControlPoints,
    TrimFarFromEdge,
    TrimHasGap,
    TrimInvalidDomainLength,
    TrimIsOutsideSurfaceDomain,
    // Edge
    EdgeIsInvalid,
    EdgeHasNoTrims,
    EdgeIsNaked,
    EdgeIsNonManifold,
    EdgeIsTooShort,
    EdgeInvalidDomainLength,
    EdgeFarFromTrim,
    EdgeHasTooManyControlPoints,
    EdgeHasKinks,
    // Vertex
    VertexIsInvalid,
    VertexIsUnused,
    VertexFarFromEdges,
    VertexFarFromTrims,
    VertexIsDuplicated,
    // Mesh
    MeshIsEmpty,
    MeshFailedValidation,
    MeshHasDisjoints,
    MeshHasInvalidFaces,
    MeshHasUnattachedVertices,
}

impl DefectKind {
    /// Every kind, in declaration order.
    pub const ALL: [DefectKind; 41] = [
        DefectKind::BrepIsEmpty,
        DefectKind::BrepIsInvalid,
        DefectKind::BrepHasDisjoints,
        DefectKind::BrepIsNotClosed,
        DefectKind::FaceIsInvalid,
        DefectKind::FaceHasNoLoops,
        DefectKind::FaceSurfaceIsInvalid,
        DefectKind::FaceSurfaceIsDegenerate,
        DefectKind::FaceHasBadUvDomain,
        DefectKind::FaceHasTooManyControlPoints,
        DefectKind::FaceIsTooSmall,
        DefectKind::LoopIsEmpty,
        DefectKind::LoopIsNotClosed,
        DefectKind::LoopHasWrongDirection,
        DefectKind::TrimIsInvalid,
        DefectKind::TrimHasNoEdge,
        DefectKind::TrimIsTooShort,
        DefectKind::TrimHasTooManyControlPoints,
        DefectKind::TrimFarFromEdge,
        DefectKind::TrimHasGap,
        DefectKind::TrimInvalidDomainLength,
        DefectKind::TrimIsOutsideSurfaceDomain,
        DefectKind::EdgeIsInvalid,
        DefectKind::EdgeHasNoTrims,
        DefectKind::EdgeIsNaked,
        DefectKind::EdgeIsNonManifold,
        DefectKind::EdgeIsTooShort,
        DefectKind::EdgeInvalidDomainLength,
        DefectKind::EdgeFarFromTrim,
        DefectKind::EdgeHasTooManyControlPoints,
        DefectKind::EdgeHasKinks,
        DefectKind::VertexIsInvalid,
        DefectKind::VertexIsUnused,
        DefectKind::VertexFarFromEdges,
        DefectKind::VertexFarFromTrims,
        DefectKind::VertexIsDuplicated,
        DefectKind::MeshIsEmpty,
        DefectKind::MeshFailedValidation,
        DefectKind::MeshHasDisjoints,
        DefectKind::MeshHasInvalidFaces,
        DefectKind::MeshHasUnattachedVertices,
    ];

    /// The element this kind afflicts.
    #[must_use]
    pub fn group(&self) -> ElementGroup {
        use DefectKind::*;
        match self {
            BrepIsEmpty | BrepIsInvalid | BrepHasDisjoints | BrepIsNotClosed => ElementGroup::Brep,
            FaceIsInvalid
            | FaceHasNoLoops
            | FaceSurfaceIsInvalid
            | FaceSurfaceIsDegenerate
            | FaceHasBadUvDomain
            | FaceHasTooManyControlPoints
            | FaceIsTooSmall => ElementGroup::Face,
            LoopIsEmpty | LoopIsNotClosed | LoopHasWrongDirection => ElementGroup::Loop,
            TrimIsInvalid
            | TrimHasNoEdge
            | TrimIsTooShort
            | TrimHasTooManyControlPoints
            | TrimFarFromEdge
            | TrimHasGap
            | TrimInvalidDomainLength
            | TrimIsOutsideSurfaceDomain => ElementGroup::Trim,
            EdgeIsInvalid
            | EdgeHasNoTrims
            | EdgeIsNaked
            | EdgeIsNonManifold
            | EdgeIsTooShort
            | EdgeInvalidDomainLength
            | EdgeFarFromTrim
            | EdgeHasTooManyControlPoints
            | EdgeHasKinks => ElementGroup::Edge,
            VertexIsInvalid
            | VertexIsUnused
            | VertexFarFromEdges
            | VertexFarFromTrims
            | VertexIsDuplicated => ElementGroup::Vertex,
            MeshIsEmpty
            | MeshFailedValidation
            | MeshHasDisjoints
            | MeshHasInvalidFaces
            | MeshHasUnattachedVertices => ElementGroup::Mesh,
        }
    }

    /// Identifier of the kind, as used in configuration files.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{:?}", self)
    }

    /// Look up a kind by its identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
