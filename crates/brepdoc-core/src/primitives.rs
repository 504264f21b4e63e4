//! # Fixed Constants
//!
//! Compiled-in constants of the defect engine.
//! These values are immutable at runtime; user-tunable thresholds live in
//! the option store instead (see `options`).

/// Upper bound of `Weight::complexity`.
pub const MAX_COMPLEXITY: u8 = 60;

/// First synthetic priority handed out to kinds registered without one.
///
/// Synthetic priorities count down from here (`-1, -2, ...`), so they never
/// collide with explicit priorities, which are non-negative.
pub const FIRST_SYNTHETIC_PRIORITY: i32 = -1;

/// Separator between formatted problems in `ProblemCollection::info`.
pub const INFO_SEPARATOR: &str = ";  ";

/// Separator between reasons in `FixPlan::unfixable_reasons`.
pub const REASON_SEPARATOR: &str = "; ";

// =============================================================================
// OPTION NAMES
// =============================================================================

/// Minimal edge length below which an edge is reported as too short.
pub const OPT_SMALL_EDGE_LENGTH: &str = "edge.small_length";

/// Maximal trim/edge distance, relative to the edge length.
pub const OPT_MAX_TRIM_EDGE_DISTANCE: &str = "trim.max_relative_edge_distance";

/// Control-point simplification aggressiveness for trims (0 = off).
pub const OPT_TRIM_SIMPLIFY_LEVEL: &str = "trim.simplify_level";

/// Control-point simplification aggressiveness for edges (0 = off).
pub const OPT_EDGE_SIMPLIFY_LEVEL: &str = "edge.simplify_level";

/// Control-point simplification aggressiveness for surfaces (0 = off).
pub const OPT_FACE_SIMPLIFY_LEVEL: &str = "face.simplify_level";

/// Number of disjoint mesh pieces tolerated before reporting.
pub const OPT_MESH_MAX_DISJOINT_SHELLS: &str = "mesh.max_disjoint_shells";

/// Report a failed mesh validity check under its own kind.
pub const OPT_MESH_SPLIT_VALIDITY_KIND: &str = "mesh.split_validity_kind";
