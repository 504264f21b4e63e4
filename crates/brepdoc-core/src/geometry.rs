//! # Geometry Query Façade
//!
//! Read-only views of the models the detectors inspect.
//!
//! The core never constructs or mutates geometry. Producers see a model only
//! through [`MeshQuery`] or [`BrepTopology`]; [`IndexedMesh`] and
//! [`TopologySnapshot`] are plain serializable implementations used by the
//! CLI and the tests.
//!
//! Indices are `i32` like component indices: a negative or out-of-range
//! reference is data to report, not a reason to panic.

use crate::BrepdocError;
use serde::{Deserialize, Serialize};

// =============================================================================
// MESH
// =============================================================================

/// Read access to a polygon mesh.
pub trait MeshQuery {
    fn face_count(&self) -> usize;

    fn vertex_count(&self) -> usize;

    /// Vertex references of one face, or `None` if `face` is out of range.
    fn face_vertices(&self, face: usize) -> Option<&[i32]>;

    fn face_is_triangle(&self, face: usize) -> bool;

    fn face_is_quad(&self, face: usize) -> bool;

    /// Number of connected pieces, counting faces sharing a vertex as
    /// connected.
    fn disjoint_shell_count(&self) -> usize;

    /// The mesh's own validity oracle. `Err` carries a diagnostic log.
    fn validate(&self) -> Result<(), String>;
}

/// A face-vertex mesh.
///
/// A face lists 3 or 4 vertex references. A 4-corner face whose last two
/// corners coincide is a triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedMesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<i32>>,
}

impl IndexedMesh {
    #[must_use]
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<Vec<i32>>) -> Self {
        Self { vertices, faces }
    }

    fn vertex_index(&self, reference: i32) -> Option<usize> {
        usize::try_from(reference)
            .ok()
            .filter(|&index| index < self.vertices.len())
    }
}

impl MeshQuery for IndexedMesh {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_vertices(&self, face: usize) -> Option<&[i32]> {
        self.faces.get(face).map(Vec::as_slice)
    }

    fn face_is_triangle(&self, face: usize) -> bool {
        match self.faces.get(face).map(Vec::as_slice) {
            Some([_, _, _]) => true,
            Some([_, _, c, d]) => c == d,
            _ => false,
        }
    }

    fn face_is_quad(&self, face: usize) -> bool {
        matches!(self.faces.get(face).map(Vec::as_slice), Some([_, _, c, d]) if c != d)
    }

    fn disjoint_shell_count(&self) -> usize {
        let mut shells = DisjointSets::new(self.vertices.len());
        let mut used = vec![false; self.vertices.len()];

        for face in &self.faces {
            let mut corners = face.iter().filter_map(|&v| self.vertex_index(v));
            if let Some(first) = corners.next() {
                used[first] = true;
                for other in corners {
                    used[other] = true;
                    shells.union(first, other);
                }
            }
        }

        let mut roots: Vec<usize> = used
            .iter()
            .enumerate()
            .filter(|&(_, &is_used)| is_used)
            .map(|(vertex, _)| shells.find(vertex))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }

    fn validate(&self) -> Result<(), String> {
        let mut log = Vec::new();

        for (index, position) in self.vertices.iter().enumerate() {
            if position.iter().any(|c| !c.is_finite()) {
                log.push(format!("vertex {} has a non-finite coordinate", index));
            }
        }

        for (index, face) in self.faces.iter().enumerate() {
            if !(3..=4).contains(&face.len()) {
                log.push(format!("face {} has {} corners", index, face.len()));
            }
            for &reference in face {
                if self.vertex_index(reference).is_none() {
                    log.push(format!(
                        "face {} references vertex {} (mesh has {})",
                        index,
                        reference,
                        self.vertices.len()
                    ));
                }
            }
        }

        if log.is_empty() {
            Ok(())
        } else {
            Err(log.join("\n"))
        }
    }
}

/// Union-find over vertex indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let grandparent = self.parent[self.parent[x]];
            self.parent[x] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

// =============================================================================
// B-REP TOPOLOGY
// =============================================================================

/// Read access to the topology of a boundary representation.
///
/// Only adjacency is exposed. Geometric checks (distances, domains, control
/// point counts) belong to collaborators with access to the curves and
/// surfaces.
pub trait BrepTopology {
    fn face_count(&self) -> usize;

    fn loop_count(&self) -> usize;

    fn trim_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    fn vertex_count(&self) -> usize;

    /// Loops bounding a face.
    fn face_loops(&self, face: usize) -> &[i32];

    /// Trims of a loop, in order.
    fn loop_trims(&self, loop_index: usize) -> &[i32];

    /// The edge a trim runs along, if any.
    fn trim_edge(&self, trim: usize) -> Option<i32>;

    /// Start and end vertex of an edge.
    fn edge_vertices(&self, edge: usize) -> Option<[i32; 2]>;
}

/// Plain adjacency tables of a B-Rep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Face → loop indices.
    pub faces: Vec<Vec<i32>>,
    /// Loop → trim indices.
    pub loops: Vec<Vec<i32>>,
    /// Trim → edge index. `None` for singular trims.
    pub trims: Vec<Option<i32>>,
    /// Edge → [start vertex, end vertex].
    pub edges: Vec<[i32; 2]>,
    pub vertex_count: usize,
}

impl TopologySnapshot {
    /// Face → loop and loop → trim references must be in range.
    ///
    /// Trim → edge and edge → vertex references are not checked here; bad
    /// values there are defects the topology detector reports.
    pub fn check_references(&self) -> Result<(), BrepdocError> {
        for (face, loops) in self.faces.iter().enumerate() {
            if let Some(bad) = loops.iter().find(|&&l| !in_range(l, self.loops.len())) {
                return Err(BrepdocError::InvalidInput(format!(
                    "face {} references missing loop {}",
                    face, bad
                )));
            }
        }
        for (loop_index, trims) in self.loops.iter().enumerate() {
            if let Some(bad) = trims.iter().find(|&&t| !in_range(t, self.trims.len())) {
                return Err(BrepdocError::InvalidInput(format!(
                    "loop {} references missing trim {}",
                    loop_index, bad
                )));
            }
        }
        Ok(())
    }
}

impl BrepTopology for TopologySnapshot {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn loop_count(&self) -> usize {
        self.loops.len()
    }

    fn trim_count(&self) -> usize {
        self.trims.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn face_loops(&self, face: usize) -> &[i32] {
        self.faces.get(face).map(Vec::as_slice).unwrap_or_default()
    }

    fn loop_trims(&self, loop_index: usize) -> &[i32] {
        self.loops.get(loop_index).map(Vec::as_slice).unwrap_or_default()
    }

    fn trim_edge(&self, trim: usize) -> Option<i32> {
        self.trims.get(trim).copied().flatten()
    }

    fn edge_vertices(&self, edge: usize) -> Option<[i32; 2]> {
        self.edges.get(edge).copied()
    }
}

/// Whether `reference` is a valid index into a table of `len` entries.
#[must_use]
pub fn in_range(reference: i32, len: usize) -> bool {
    usize::try_from(reference).is_ok_and(|index| index < len)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(vertex_count: usize) -> Vec<[f64; 3]> {
        (0..vertex_count).map(|i| [i as f64, 0.0, 0.0]).collect()
    }

    #[test]
    fn triangle_and_quad_classification() {
        let mesh = IndexedMesh::new(
            grid(5),
            vec![vec![0, 1, 2], vec![0, 1, 2, 2], vec![0, 1, 2, 3], vec![0, 1]],
        );
        assert!(mesh.face_is_triangle(0));
        assert!(mesh.face_is_triangle(1));
        assert!(!mesh.face_is_quad(1));
        assert!(mesh.face_is_quad(2));
        assert!(!mesh.face_is_triangle(3));
        assert!(!mesh.face_is_quad(3));
        assert!(!mesh.face_is_quad(99));
    }

    #[test]
    fn shells_count_connected_pieces() {
        let mesh = IndexedMesh::new(
            grid(9),
            vec![vec![0, 1, 2], vec![2, 1, 3], vec![4, 5, 6], vec![7, 8, 7]],
        );
        assert_eq!(mesh.disjoint_shell_count(), 3);
    }

    #[test]
    fn shells_ignore_bad_references() {
        let mesh = IndexedMesh::new(grid(3), vec![vec![0, 1, 2], vec![-1, 0, 1]]);
        assert_eq!(mesh.disjoint_shell_count(), 1);
        assert_eq!(IndexedMesh::default().disjoint_shell_count(), 0);
    }

    #[test]
    fn validate_reports_bad_references() {
        let mesh = IndexedMesh::new(grid(3), vec![vec![0, 1, 2], vec![0, 1, -1]]);
        let log = mesh.validate().expect_err("invalid");
        assert!(log.contains("face 1 references vertex -1"), "{log}");

        let ok = IndexedMesh::new(grid(3), vec![vec![0, 1, 2]]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn validate_reports_non_finite_vertices() {
        let mesh = IndexedMesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn mesh_deserializes_from_json() {
        let mesh: IndexedMesh = serde_json::from_str(
            r#"{"vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]]}"#,
        )
        .expect("parse");
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn snapshot_rejects_dangling_loop_reference() {
        let snapshot = TopologySnapshot {
            faces: vec![vec![0, 3]],
            loops: vec![vec![]],
            ..TopologySnapshot::default()
        };
        assert!(matches!(
            snapshot.check_references(),
            Err(BrepdocError::InvalidInput(_))
        ));
    }

    #[test]
    fn snapshot_accessors_tolerate_out_of_range() {
        let snapshot = TopologySnapshot {
            trims: vec![Some(0), None],
            edges: vec![[0, 1]],
            vertex_count: 2,
            ..TopologySnapshot::default()
        };
        assert!(snapshot.face_loops(7).is_empty());
        assert_eq!(snapshot.trim_edge(0), Some(0));
        assert_eq!(snapshot.trim_edge(1), None);
        assert_eq!(snapshot.trim_edge(9), None);
        assert_eq!(snapshot.edge_vertices(0), Some([0, 1]));
        assert_eq!(snapshot.edge_vertices(1), None);
    }

    #[test]
    fn in_range_handles_negatives() {
        assert!(in_range(0, 1));
        assert!(!in_range(1, 1));
        assert!(!in_range(-1, 5));
    }
}
