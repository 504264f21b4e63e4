//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Each `cmd_*` function prints; the functions it builds on return data so
//! they can be tested without capturing stdout.

use crate::config::Config;
use brepdoc_core::{
    BrepdocError, DefectKind, ElementGroup, FixAction, IndexedMesh, MeshQuery, OptionValue,
    ProblemReport, Severity, TopologySnapshot, fix_action,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum input snapshot size (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BrepdocError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BrepdocError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BrepdocError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, BrepdocError> {
    let canonical = path.canonicalize().map_err(|e| {
        BrepdocError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(BrepdocError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn read_input(path: &Path) -> Result<Vec<u8>, BrepdocError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_INPUT_FILE_SIZE)?;
    std::fs::read(&validated_path).map_err(|e| BrepdocError::Io(format!("Read file: {}", e)))
}

// =============================================================================
// INPUT LOADING
// =============================================================================

/// Load a mesh snapshot from a JSON file.
pub fn load_mesh(path: &Path) -> Result<IndexedMesh, BrepdocError> {
    let contents = read_input(path)?;
    serde_json::from_slice(&contents).map_err(|e| BrepdocError::Serialization(e.to_string()))
}

/// Load a topology snapshot from a JSON file.
///
/// Dangling face → loop and loop → trim references are rejected here; the
/// remaining references are checked by the topology detector.
pub fn load_topology(path: &Path) -> Result<TopologySnapshot, BrepdocError> {
    let contents = read_input(path)?;
    let snapshot: TopologySnapshot = serde_json::from_slice(&contents)
        .map_err(|e| BrepdocError::Serialization(e.to_string()))?;
    snapshot.check_references()?;
    Ok(snapshot)
}

// =============================================================================
// CHECK COMMANDS
// =============================================================================

/// Run the mesh detector on a snapshot file.
pub fn check_mesh(config: &Config, path: &Path) -> Result<ProblemReport, BrepdocError> {
    let mesh = load_mesh(path)?;
    tracing::info!(
        "Checking mesh {:?} ({} faces, {} vertices)",
        path,
        mesh.face_count(),
        mesh.vertex_count()
    );

    let mut session = config.session()?;
    session.detect_mesh(Some(&mesh));
    Ok(session.report())
}

/// Run the topology detector on a snapshot file.
pub fn check_topology(config: &Config, path: &Path) -> Result<ProblemReport, BrepdocError> {
    let brep = load_topology(path)?;
    tracing::info!(
        "Checking topology {:?} ({} faces, {} edges)",
        path,
        brep.faces.len(),
        brep.edges.len()
    );

    let mut session = config.session()?;
    session.detect_topology(Some(&brep));
    Ok(session.report())
}

/// Check a mesh and print the report.
pub fn cmd_mesh(config: &Config, json_mode: bool, file: &Path) -> Result<(), BrepdocError> {
    let report = check_mesh(config, file)?;
    print_report("Mesh", &report, json_mode)
}

/// Check a topology snapshot and print the report.
pub fn cmd_topology(config: &Config, json_mode: bool, file: &Path) -> Result<(), BrepdocError> {
    let report = check_topology(config, file)?;
    print_report("Topology", &report, json_mode)
}

fn print_report(title: &str, report: &ProblemReport, json_mode: bool) -> Result<(), BrepdocError> {
    if json_mode {
        return print_json(report);
    }

    let heading = format!("brepdoc {} Report", title);
    println!("{}", heading);
    println!("{}", "=".repeat(heading.len()));
    println!();

    if report.entries.is_empty() {
        println!("No problems found.");
        return Ok(());
    }

    println!("Problems ({}):", report.entries.len());
    for entry in &report.entries {
        let disabled = if entry.enabled { "" } else { " (disabled)" };
        println!(
            "  [{:<10}] {}{}",
            entry.severity.to_string(),
            entry.text,
            disabled
        );
    }
    println!();

    let plan = &report.fix_plan;
    println!("Fix Plan:");
    if plan.directives().next().is_none() {
        println!("  (no automatic repair)");
    }
    for directive in plan.directives() {
        println!("  - {}", directive.name());
    }
    if plan.has_unfixable_problem() {
        println!();
        println!("Not fixable: {}", plan.unfixable_reasons());
    }

    Ok(())
}

// =============================================================================
// KINDS COMMAND
// =============================================================================

/// One defect kind as listed by `brepdoc kinds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindRow {
    pub kind: DefectKind,
    pub group: ElementGroup,
    pub caption: String,
    pub priority: i32,
    pub synthetic_priority: bool,
    pub severity: Severity,
    pub complexity: u8,
    pub automation_allowed: bool,
    pub enabled: bool,
    /// Directive name, or `None` when no automatic fix exists.
    pub fix: Option<&'static str>,
    pub excluded_from_fix_plan: bool,
}

fn parse_group(name: &str) -> Result<ElementGroup, BrepdocError> {
    const GROUPS: [ElementGroup; 7] = [
        ElementGroup::Brep,
        ElementGroup::Face,
        ElementGroup::Loop,
        ElementGroup::Trim,
        ElementGroup::Edge,
        ElementGroup::Vertex,
        ElementGroup::Mesh,
    ];
    GROUPS
        .into_iter()
        .find(|g| format!("{:?}", g).eq_ignore_ascii_case(name))
        .ok_or_else(|| BrepdocError::InvalidInput(format!("Unknown element group: {}", name)))
}

/// Registry metadata of every kind, highest priority first.
pub fn kind_rows(config: &Config, group: Option<&str>) -> Result<Vec<KindRow>, BrepdocError> {
    let group = group.map(parse_group).transpose()?;
    let session = config.session()?;
    let registry = session.registry();

    Ok(registry
        .by_priority()
        .into_iter()
        .filter(|meta| group.is_none_or(|g| meta.kind.group() == g))
        .map(|meta| {
            let weight = meta.weight();
            KindRow {
                kind: meta.kind,
                group: meta.kind.group(),
                caption: meta.caption.clone(),
                priority: meta.priority,
                synthetic_priority: meta.priority_is_synthetic,
                severity: weight.severity,
                complexity: weight.complexity,
                automation_allowed: weight.automation_allowed,
                enabled: registry.is_enabled(meta.kind),
                fix: match fix_action(meta.kind) {
                    FixAction::Apply(directive) => Some(directive.name()),
                    FixAction::NotImplemented => None,
                },
                excluded_from_fix_plan: meta.excluded_from_fix_plan,
            }
        })
        .collect())
}

/// List defect kinds.
pub fn cmd_kinds(config: &Config, json_mode: bool, group: Option<&str>) -> Result<(), BrepdocError> {
    let rows = kind_rows(config, group)?;

    if json_mode {
        return print_json(&rows);
    }

    println!("brepdoc Defect Kinds");
    println!("====================");
    println!();
    for row in &rows {
        let state = if row.enabled { "on " } else { "off" };
        let fix = row.fix.unwrap_or("-");
        println!(
            "  {:>4}  {}  {:<10}  {:<28}  {}  [{}]",
            row.priority,
            state,
            row.severity.to_string(),
            row.kind.to_string(),
            row.caption,
            fix
        );
    }
    println!();
    println!("{} kinds", rows.len());

    Ok(())
}

// =============================================================================
// OPTIONS COMMAND
// =============================================================================

/// One option as listed by `brepdoc options`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRow {
    pub name: String,
    pub owner: DefectKind,
    pub default: OptionValue,
    pub value: OptionValue,
}

/// Every declared option with its effective value.
pub fn option_rows(config: &Config) -> Result<Vec<OptionRow>, BrepdocError> {
    let session = config.session()?;
    let store = session
        .options()
        .read()
        .map_err(|_| BrepdocError::InvalidInput("option store lock poisoned".into()))?;

    Ok(store
        .iter()
        .map(|(name, declared)| OptionRow {
            name: name.to_string(),
            owner: declared.owner,
            default: declared.default,
            value: declared.value,
        })
        .collect())
}

/// Show the effective option values.
pub fn cmd_options(config: &Config, json_mode: bool) -> Result<(), BrepdocError> {
    let rows = option_rows(config)?;

    if json_mode {
        return print_json(&rows);
    }

    println!("brepdoc Options");
    println!("===============");
    println!();
    for row in &rows {
        let marker = if row.value == row.default { " " } else { "*" };
        println!(
            "{} {:<34} = {:<8} (default {}, {})",
            marker,
            row.name,
            row.value.to_string(),
            row.default,
            row.owner
        );
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), BrepdocError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| BrepdocError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
