//! # Topology Defect Detector
//!
//! Adjacency checks of a B-Rep: faces, loops, trims, edges and vertices.
//!
//! Problems are emitted element group by element group (faces, loops,
//! trims, edges, vertices), in index order within a group. An edge problem
//! with an owning trim is shown under that trim, since trims are what the
//! user picks in a face's boundary.

use super::{DefectDetector, component_index};
use crate::geometry::{BrepTopology, in_range};
use crate::{ComponentIdentity, DefectKind, ProblemCollection};

/// Finds topological defects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyDefectDetector;

impl TopologyDefectDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run the checks against any [`BrepTopology`].
    pub fn find_in<T: BrepTopology + ?Sized>(
        &self,
        problems: &mut ProblemCollection,
        brep: Option<&T>,
    ) -> usize {
        let before = problems.len();

        let Some(brep) = brep.filter(|b| b.face_count() > 0) else {
            problems.add(
                ComponentIdentity::unset(),
                "Brep has no faces",
                DefectKind::BrepIsEmpty,
            );
            return problems.len() - before;
        };

        for face in 0..brep.face_count() {
            if brep.face_loops(face).is_empty() {
                problems.add(
                    ComponentIdentity::face(component_index(face)),
                    "has no loops",
                    DefectKind::FaceHasNoLoops,
                );
            }
        }

        for loop_index in 0..brep.loop_count() {
            if brep.loop_trims(loop_index).is_empty() {
                problems.add(
                    ComponentIdentity::loop_(component_index(loop_index)),
                    "has no trims",
                    DefectKind::LoopIsEmpty,
                );
            }
        }

        // Edge → owning trims, in trim order.
        let mut edge_trims: Vec<Vec<i32>> = vec![Vec::new(); brep.edge_count()];
        for trim in 0..brep.trim_count() {
            let Some(edge) = brep.trim_edge(trim) else {
                continue;
            };
            match usize::try_from(edge).ok().and_then(|e| edge_trims.get_mut(e)) {
                Some(owners) => owners.push(component_index(trim)),
                None => {
                    problems.add(
                        ComponentIdentity::trim(component_index(trim)),
                        format!("references missing edge {}", edge),
                        DefectKind::TrimHasNoEdge,
                    );
                }
            }
        }

        let base = problems.index_base();
        let mut vertex_used = vec![false; brep.vertex_count()];
        for (edge, owners) in edge_trims.iter().enumerate() {
            let real = ComponentIdentity::edge(component_index(edge));
            let display = owners
                .first()
                .map_or(real, |&trim| ComponentIdentity::trim(trim));
            let label = base.display(real.index);

            for vertex in brep.edge_vertices(edge).into_iter().flatten() {
                match usize::try_from(vertex).ok().and_then(|v| vertex_used.get_mut(v)) {
                    Some(used) => *used = true,
                    None => {
                        problems.add_aliased(
                            real,
                            display,
                            format!("edge {} references missing vertex {}", label, vertex),
                            DefectKind::EdgeIsInvalid,
                        );
                    }
                }
            }

            match owners.len() {
                0 => {
                    problems.add(real, "is not used by any trim", DefectKind::EdgeHasNoTrims);
                }
                1 => {
                    problems.add_aliased(
                        real,
                        display,
                        format!("edge {} is naked", label),
                        DefectKind::EdgeIsNaked,
                    );
                }
                2 => {}
                n => {
                    problems.add_aliased(
                        real,
                        display,
                        format!("edge {} is shared by {} trims", label, n),
                        DefectKind::EdgeIsNonManifold,
                    );
                }
            }
        }

        for (vertex, _) in vertex_used.iter().enumerate().filter(|(_, used)| !**used) {
            problems.add(
                ComponentIdentity::vertex(component_index(vertex)),
                "is not used by any edge",
                DefectKind::VertexIsUnused,
            );
        }

        let found = problems.len() - before;
        tracing::debug!(
            faces = brep.face_count(),
            edges = brep.edge_count(),
            found,
            "topology detection finished"
        );
        found
    }
}

impl<T: BrepTopology + ?Sized> DefectDetector<T> for TopologyDefectDetector {
    fn find(&self, problems: &mut ProblemCollection, model: Option<&T>) -> usize {
        self.find_in(problems, model)
    }
}

/// Whether every trim → edge and edge → vertex reference resolves.
#[must_use]
pub fn references_resolve<T: BrepTopology + ?Sized>(brep: &T) -> bool {
    let trims_ok = (0..brep.trim_count())
        .filter_map(|t| brep.trim_edge(t))
        .all(|e| in_range(e, brep.edge_count()));
    let edges_ok = (0..brep.edge_count())
        .filter_map(|e| brep.edge_vertices(e))
        .all(|[a, b]| in_range(a, brep.vertex_count()) && in_range(b, brep.vertex_count()));
    trims_ok && edges_ok
}

// =============================================================================
// TESTS
// =============================================================================
