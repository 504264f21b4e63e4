//! Integration tests for the brepdoc commands.
//!
//! Inputs and configuration files are written to temporary directories.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use brepdoc::cli::{
    Cli, Commands, check_mesh, check_topology, execute, kind_rows, load_mesh, load_topology,
};
use brepdoc::config::Config;
use brepdoc_core::{BrepdocError, DefectKind, Directive, IndexBase};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const TWO_PIECE_MESH: &str = r#"{
    "vertices": [[0,0,0],[1,0,0],[0,1,0],[5,0,0],[6,0,0],[5,1,0],[9,9,9]],
    "faces": [[0,1,2],[3,4,5]]
}"#;

const OPEN_TOPOLOGY: &str = r#"{
    "faces": [[0]],
    "loops": [[0, 1]],
    "trims": [0, 1],
    "edges": [[0, 1], [1, 0]],
    "vertex_count": 3
}"#;

// =============================================================================
// MESH
// =============================================================================

#[test]
fn mesh_report_lists_problems_by_priority() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "part.json", TWO_PIECE_MESH);

    let report = check_mesh(&Config::default(), &path).unwrap();

    let kinds: Vec<_> = report.entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DefectKind::MeshHasDisjoints,
            DefectKind::MeshHasUnattachedVertices
        ]
    );
    assert_eq!(
        report.info,
        "Mesh has 2 disjoint pieces;  Mesh has 1 unattached vertex"
    );
    assert!(report.fix_plan.is_set(Directive::CullUnattachedMeshVertices));
    assert!(report.fix_plan.has_unfixable_problem());
}

#[test]
fn mesh_config_raises_disjoint_allowance() {
    let dir = TempDir::new().unwrap();
    let mesh = write_file(&dir, "part.json", TWO_PIECE_MESH);
    let config = write_file(
        &dir,
        "brepdoc.toml",
        "[options]\n\"mesh.max_disjoint_shells\" = 2\n",
    );

    let config = Config::load(Some(config.as_path())).unwrap();
    let report = check_mesh(&config, &mesh).unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].kind, DefectKind::MeshHasUnattachedVertices);
}

#[test]
fn mesh_report_serializes_to_json() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "part.json", TWO_PIECE_MESH);

    let report = check_mesh(&Config::default(), &path).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["entries"][0]["kind"], "MeshHasDisjoints");
    assert_eq!(json["entries"][0]["severity"], "Warning");
    assert!(json["fix_plan"].is_object());
}

#[test]
fn malformed_mesh_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.json", "{ \"vertices\": ");
    assert!(matches!(
        load_mesh(&path),
        Err(BrepdocError::Serialization(_))
    ));
}

#[test]
fn missing_input_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json");
    assert!(matches!(load_mesh(&path), Err(BrepdocError::Io(_))));
    assert!(matches!(load_mesh(dir.path()), Err(BrepdocError::Io(_))));
}

// =============================================================================
// TOPOLOGY
// =============================================================================

#[test]
fn topology_report_uses_configured_index_base() {
    let dir = TempDir::new().unwrap();
    let brep = write_file(&dir, "part.json", OPEN_TOPOLOGY);
    let config = write_file(&dir, "brepdoc.toml", "first_index = 1\n");

    let config = Config::load(Some(config.as_path())).unwrap();
    assert_eq!(config.index_base().unwrap(), IndexBase::One);

    let report = check_topology(&config, &brep).unwrap();
    assert_eq!(
        report.info,
        "Trim 1: edge 1 is naked;  Trim 2: edge 2 is naked;  Vertex 3: is not used by any edge"
    );
    assert!(report.fix_plan.is_set(Directive::JoinNakedEdges));
    assert!(report.fix_plan.is_set(Directive::RemoveUnusedVertices));
}

#[test]
fn topology_with_dangling_loop_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "bad.json",
        r#"{"faces": [[4]], "loops": [], "trims": [], "edges": [], "vertex_count": 0}"#,
    );
    assert!(matches!(
        load_topology(&path),
        Err(BrepdocError::InvalidInput(_))
    ));
}

#[test]
fn disabled_kind_is_reported_but_not_planned() {
    let dir = TempDir::new().unwrap();
    let brep = write_file(&dir, "part.json", OPEN_TOPOLOGY);
    let config = Config::from_toml_str("[enabled]\nVertexIsUnused = false\n").unwrap();

    let report = check_topology(&config, &brep).unwrap();

    let unused = report
        .entries
        .iter()
        .find(|e| e.kind == DefectKind::VertexIsUnused)
        .unwrap();
    assert!(!unused.enabled);
    assert!(!report.fix_plan.is_set(Directive::RemoveUnusedVertices));
}

// =============================================================================
// KINDS & EXECUTE
// =============================================================================

#[test]
fn kinds_cover_every_defect_kind() {
    let rows = kind_rows(&Config::default(), None).unwrap();
    assert_eq!(rows.len(), DefectKind::ALL.len());
    assert_eq!(rows[0].kind, DefectKind::BrepIsEmpty);
    assert!(rows.windows(2).all(|w| w[0].priority >= w[1].priority));

    let excluded = rows
        .iter()
        .find(|r| r.kind == DefectKind::VertexFarFromTrims)
        .unwrap();
    assert!(excluded.excluded_from_fix_plan);
    assert!(!excluded.enabled);
}

#[test]
fn execute_runs_commands_with_explicit_config() {
    let dir = TempDir::new().unwrap();
    let mesh = write_file(&dir, "part.json", TWO_PIECE_MESH);
    let config = write_file(&dir, "brepdoc.toml", "");

    let cli = Cli {
        verbose: false,
        quiet: true,
        config: Some(config.clone()),
        json: true,
        command: Some(Commands::Mesh { file: mesh }),
    };
    assert!(execute(cli).is_ok());

    let cli = Cli {
        verbose: false,
        quiet: true,
        config: Some(config),
        json: false,
        command: Some(Commands::Kinds {
            group: Some("nonsense".to_string()),
        }),
    };
    assert!(matches!(execute(cli), Err(BrepdocError::InvalidInput(_))));
}
