//! # brepdoc-core
//!
//! The deterministic defect engine of brepdoc - THE LOGIC.
//!
//! This crate classifies, collects, ranks and resolves the defects found in
//! B-Rep solids and polygon meshes:
//! - a closed set of defect kinds with registry metadata (caption, priority,
//!   weight, default enablement, tunable options)
//! - an ordered problem collection with priority-ordered formatting,
//!   filtering and semantic de-duplication
//! - a fix-plan resolver turning problems into repair directives
//! - producers (mesh and topology detectors) reading models through a
//!   query façade
//!
//! ## Architectural Constraints
//!
//! - Pure Rust, synchronous, no I/O
//! - Deterministic: `BTreeMap`/`BTreeSet` only, stable sorts
//! - Never mutates geometry; repairs belong to the consumer of the plan
//! - Absence is `Option`/`bool`/`""`, never an error

// =============================================================================
// MODULES
// =============================================================================

pub mod collection;
pub mod detect;
pub mod geometry;
pub mod kind;
pub mod options;
pub mod primitives;
pub mod problem;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use kind::{DefectKind, ElementGroup};
pub use types::{
    BrepdocError, ComponentIdentity, ComponentKind, Fixability, IndexBase, Payload, Severity,
    Weight,
};

// =============================================================================
// RE-EXPORTS: Defect Engine
// =============================================================================

pub use collection::ProblemCollection;
pub use options::{
    DeclaredOption, EnablementSource, OptionAccessor, OptionRegistrar, OptionStore, OptionValue,
};
pub use problem::ProblemRecord;
pub use registry::{
    DefectMetadata, DefectRegistry, IntegrityWarning, Registration, SettingsInitializer,
};
pub use resolver::{Directive, FixAction, FixPlan, fix_action};
pub use session::{IssueSession, ProblemReport, ReportEntry};

// =============================================================================
// RE-EXPORTS: Producers (from geometry and detect modules)
// =============================================================================

pub use detect::{DefectDetector, MeshDefectDetector, MeshDetectorOptions, TopologyDefectDetector};
pub use geometry::{BrepTopology, IndexedMesh, MeshQuery, TopologySnapshot};
