//! # Defect Detectors
//!
//! Producers that inspect a model and append problems to a collection.
//!
//! Detectors never mutate the model and never remove problems. They can run
//! in parallel into independent collections that are merged afterwards with
//! `ProblemCollection::add_range`.

pub mod mesh;
pub mod topology;

pub use mesh::{MeshDefectDetector, MeshDetectorOptions};
pub use topology::TopologyDefectDetector;

use crate::ProblemCollection;

/// A producer of problems for models viewed through `M`.
pub trait DefectDetector<M: ?Sized> {
    /// Append every problem found in `model` to `problems`.
    ///
    /// `None` stands for an absent model. Returns the number of problems
    /// appended.
    fn find(&self, problems: &mut ProblemCollection, model: Option<&M>) -> usize;
}

/// Convert a table position to a component index.
pub(crate) fn component_index(position: usize) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}

/// `"<n> <noun>"`, with the plural form unless `n` is 1.
pub(crate) fn counted(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
