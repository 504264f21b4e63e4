//! # Mesh Defect Detector
//!
//! Structural checks of a polygon mesh.
//!
//! Emission order:
//! 1. `MeshIsEmpty` when the mesh is absent or has no faces, then stop
//! 2. `MeshHasDisjoints` when there are more pieces than allowed
//! 3. the validity-oracle failure, with the oracle's log
//! 4. `MeshHasInvalidFaces` with a count
//! 5. `MeshHasUnattachedVertices` with a count
//!
//! Flipped faces are not detected.

use super::{DefectDetector, counted};
use crate::geometry::MeshQuery;
use crate::options::OptionAccessor;
use crate::primitives::{OPT_MESH_MAX_DISJOINT_SHELLS, OPT_MESH_SPLIT_VALIDITY_KIND};
use crate::{ComponentIdentity, DefectKind, ProblemCollection};

/// Tunables of the mesh detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshDetectorOptions {
    /// Pieces tolerated before `MeshHasDisjoints` is reported. Values below
    /// 1 act as 1, so 0 and 1 behave the same and a single connected piece
    /// is never reported.
    pub max_allowed_disjoint_shells: usize,
    /// Report a failed validity check as `MeshFailedValidation` instead of
    /// `MeshIsEmpty`.
    pub split_validity_kind: bool,
}

impl MeshDetectorOptions {
    /// Read the current values from an option store.
    #[must_use]
    pub fn from_options(options: &impl OptionAccessor) -> Self {
        let max = options.int_or(OPT_MESH_MAX_DISJOINT_SHELLS, 0);
        Self {
            max_allowed_disjoint_shells: usize::try_from(max).unwrap_or(0),
            split_validity_kind: options.bool_or(OPT_MESH_SPLIT_VALIDITY_KIND, false),
        }
    }

    #[must_use]
    pub fn validity_kind(&self) -> DefectKind {
        if self.split_validity_kind {
            DefectKind::MeshFailedValidation
        } else {
            DefectKind::MeshIsEmpty
        }
    }
}

/// Finds structural mesh defects.
#[derive(Debug, Clone, Default)]
pub struct MeshDefectDetector {
    options: MeshDetectorOptions,
}

impl MeshDefectDetector {
    #[must_use]
    pub fn new(options: MeshDetectorOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn from_options(options: &impl OptionAccessor) -> Self {
        Self::new(MeshDetectorOptions::from_options(options))
    }

    #[must_use]
    pub fn options(&self) -> MeshDetectorOptions {
        self.options
    }

    /// Run the checks against any [`MeshQuery`].
    pub fn find_in<M: MeshQuery + ?Sized>(
        &self,
        problems: &mut ProblemCollection,
        mesh: Option<&M>,
    ) -> usize {
        let before = problems.len();
        let whole = ComponentIdentity::unset();

        let Some(mesh) = mesh.filter(|m| m.face_count() > 0) else {
            problems.add(whole, "Mesh is empty", DefectKind::MeshIsEmpty);
            return problems.len() - before;
        };

        let shells = mesh.disjoint_shell_count();
        if shells > self.options.max_allowed_disjoint_shells.max(1) {
            problems.add(
                whole,
                format!("Mesh has {} disjoint pieces", shells),
                DefectKind::MeshHasDisjoints,
            );
        }

        if let Err(log) = mesh.validate() {
            problems.add(
                whole,
                format!("Mesh is not valid: {}", log),
                self.options.validity_kind(),
            );
        }

        let invalid_faces = (0..mesh.face_count())
            .filter(|&face| !face_is_well_formed(mesh, face))
            .count();
        if invalid_faces > 0 {
            problems.add(
                whole,
                format!(
                    "Mesh has {}",
                    counted(invalid_faces, "invalid face", "invalid faces")
                ),
                DefectKind::MeshHasInvalidFaces,
            );
        }

        let unattached = unattached_vertex_count(mesh);
        if unattached > 0 {
            problems.add(
                whole,
                format!(
                    "Mesh has {}",
                    counted(unattached, "unattached vertex", "unattached vertices")
                ),
                DefectKind::MeshHasUnattachedVertices,
            );
        }

        let found = problems.len() - before;
        tracing::debug!(
            faces = mesh.face_count(),
            vertices = mesh.vertex_count(),
            shells,
            found,
            "mesh detection finished"
        );
        found
    }
}

impl<M: MeshQuery + ?Sized> DefectDetector<M> for MeshDefectDetector {
    fn find(&self, problems: &mut ProblemCollection, model: Option<&M>) -> usize {
        self.find_in(problems, model)
    }
}

/// Exactly one of triangle/quad, every corner in range.
fn face_is_well_formed<M: MeshQuery + ?Sized>(mesh: &M, face: usize) -> bool {
    if mesh.face_is_triangle(face) == mesh.face_is_quad(face) {
        return false;
    }
    let vertex_count = mesh.vertex_count();
    mesh.face_vertices(face).is_some_and(|corners| {
        corners
            .iter()
            .all(|&v| usize::try_from(v).is_ok_and(|v| v < vertex_count))
    })
}

fn unattached_vertex_count<M: MeshQuery + ?Sized>(mesh: &M) -> usize {
    let mut used = vec![false; mesh.vertex_count()];
    for face in 0..mesh.face_count() {
        for &v in mesh.face_vertices(face).unwrap_or_default() {
            if let Some(slot) = usize::try_from(v).ok().and_then(|v| used.get_mut(v)) {
                *slot = true;
            }
        }
    }
    used.iter().filter(|&&is_used| !is_used).count()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefectRegistry;
    use crate::geometry::IndexedMesh;
    use crate::options::OptionStore;
    use crate::options::OptionValue;
    use std::sync::Arc;

    fn problems() -> ProblemCollection {
        ProblemCollection::new(Arc::new(DefectRegistry::standard())).expect("collection")
    }

    fn vertices(n: usize) -> Vec<[f64; 3]> {
        (0..n).map(|i| [0.0, i as f64, 0.0]).collect()
    }

    fn kinds(problems: &ProblemCollection) -> Vec<DefectKind> {
        problems.iter().map(|r| r.kind()).collect()
    }

    /// A mesh whose face flags are set independently of its corners.
    struct FlaggedMesh {
        triangle: bool,
        quad: bool,
    }

    impl MeshQuery for FlaggedMesh {
        fn face_count(&self) -> usize {
            1
        }
        fn vertex_count(&self) -> usize {
            3
        }
        fn face_vertices(&self, _face: usize) -> Option<&[i32]> {
            Some(&[0, 1, 2])
        }
        fn face_is_triangle(&self, _face: usize) -> bool {
            self.triangle
        }
        fn face_is_quad(&self, _face: usize) -> bool {
            self.quad
        }
        fn disjoint_shell_count(&self) -> usize {
            1
        }
        fn validate(&self) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn absent_mesh_is_empty() {
        let mut problems = problems();
        let found = MeshDefectDetector::default().find_in::<IndexedMesh>(&mut problems, None);
        assert_eq!(found, 1);
        assert_eq!(kinds(&problems), vec![DefectKind::MeshIsEmpty]);
    }

    #[test]
    fn faceless_mesh_reports_only_empty() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(4), vec![]);
        MeshDefectDetector::default().find_in(&mut problems, Some(&mesh));
        assert_eq!(kinds(&problems), vec![DefectKind::MeshIsEmpty]);
    }

    #[test]
    fn clean_mesh_reports_nothing() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(4), vec![vec![0, 1, 2], vec![0, 2, 3, 3]]);
        let found = MeshDefectDetector::default().find(&mut problems, Some(&mesh));
        assert_eq!(found, 0);
        assert!(problems.is_empty());
    }

    #[test]
    fn disjoint_pieces_are_counted() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(
            vertices(9),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]],
        );
        MeshDefectDetector::default().find_in(&mut problems, Some(&mesh));

        assert_eq!(kinds(&problems), vec![DefectKind::MeshHasDisjoints]);
        assert_eq!(problems.info(), "Mesh has 3 disjoint pieces");
    }

    #[test]
    fn disjoint_pieces_within_allowance() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(6), vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let detector = MeshDefectDetector::new(MeshDetectorOptions {
            max_allowed_disjoint_shells: 2,
            split_validity_kind: false,
        });
        detector.find_in(&mut problems, Some(&mesh));
        assert!(problems.is_empty());
    }

    #[test]
    fn allowance_below_one_acts_as_one() {
        let two_pieces = IndexedMesh::new(vertices(6), vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let one_piece = IndexedMesh::new(vertices(3), vec![vec![0, 1, 2]]);

        for allowed in [0, 1] {
            let detector = MeshDefectDetector::new(MeshDetectorOptions {
                max_allowed_disjoint_shells: allowed,
                split_validity_kind: false,
            });

            let mut split = problems();
            detector.find_in(&mut split, Some(&two_pieces));
            assert_eq!(split.info(), "Mesh has 2 disjoint pieces");

            let mut connected = problems();
            detector.find_in(&mut connected, Some(&one_piece));
            assert!(connected.is_empty());
        }
    }

    #[test]
    fn negative_vertex_reference_is_invalid_face() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(3), vec![vec![0, 1, 2, -1]]);
        MeshDefectDetector::default().find_in(&mut problems, Some(&mesh));

        assert_eq!(
            kinds(&problems),
            vec![DefectKind::MeshIsEmpty, DefectKind::MeshHasInvalidFaces]
        );
        let invalid = problems
            .exists_with_info(DefectKind::MeshHasInvalidFaces)
            .expect("invalid faces");
        assert_eq!(invalid, "Mesh has 1 invalid face");
        let validity = problems.get(0).expect("validity problem");
        assert!(validity.text().starts_with("Mesh is not valid: "));
    }

    #[test]
    fn split_validity_kind_routes_to_own_kind() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(3), vec![vec![0, 1, 7]]);
        let detector = MeshDefectDetector::new(MeshDetectorOptions {
            max_allowed_disjoint_shells: 0,
            split_validity_kind: true,
        });
        detector.find_in(&mut problems, Some(&mesh));

        assert!(problems.exists(DefectKind::MeshFailedValidation));
        assert!(!problems.exists(DefectKind::MeshIsEmpty));
    }

    #[test]
    fn face_flagged_as_both_or_neither_is_invalid() {
        for (triangle, quad) in [(true, true), (false, false)] {
            let mut problems = problems();
            MeshDefectDetector::default()
                .find_in(&mut problems, Some(&FlaggedMesh { triangle, quad }));
            assert_eq!(kinds(&problems), vec![DefectKind::MeshHasInvalidFaces]);
        }
    }

    #[test]
    fn unattached_vertices_are_counted() {
        let mut problems = problems();
        let mesh = IndexedMesh::new(vertices(5), vec![vec![0, 1, 2]]);
        MeshDefectDetector::default().find_in(&mut problems, Some(&mesh));

        assert_eq!(kinds(&problems), vec![DefectKind::MeshHasUnattachedVertices]);
        assert_eq!(problems.info(), "Mesh has 2 unattached vertices");
    }

    #[test]
    fn detector_reads_current_option_values() {
        let registry = DefectRegistry::standard();
        let mut store = OptionStore::new();
        registry.initialize_settings(&mut store);

        assert_eq!(
            MeshDefectDetector::from_options(&store).options(),
            MeshDetectorOptions::default()
        );

        store
            .set(OPT_MESH_MAX_DISJOINT_SHELLS, OptionValue::Int(4))
            .expect("set");
        store
            .set(OPT_MESH_SPLIT_VALIDITY_KIND, OptionValue::Bool(true))
            .expect("set");
        let options = MeshDetectorOptions::from_options(&store);
        assert_eq!(options.max_allowed_disjoint_shells, 4);
        assert_eq!(options.validity_kind(), DefectKind::MeshFailedValidation);
    }

    #[test]
    fn negative_allowance_reads_as_zero() {
        let mut store = OptionStore::new();
        DefectRegistry::standard().initialize_settings(&mut store);
        store
            .set(OPT_MESH_MAX_DISJOINT_SHELLS, OptionValue::Int(-3))
            .expect("set");
        assert_eq!(
            MeshDetectorOptions::from_options(&store).max_allowed_disjoint_shells,
            0
        );
    }
}
