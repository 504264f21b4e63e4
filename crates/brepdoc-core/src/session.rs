//! # Issue Session
//!
//! One analyzed model: its problem collection, the option store the
//! detectors read, and the registry both are interpreted against.
//!
//! The session is the single owner of its collection. Parallel producers
//! detect into their own collections and hand them to [`IssueSession::merge`]
//! one after another.

use crate::detect::{MeshDefectDetector, TopologyDefectDetector};
use crate::geometry::{BrepTopology, MeshQuery};
use crate::options::OptionStore;
use crate::{
    BrepdocError, ComponentIdentity, DefectKind, DefectRegistry, FixPlan, IndexBase,
    ProblemCollection, Severity,
};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// One line of a [`ProblemReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub kind: DefectKind,
    pub severity: Severity,
    pub component: ComponentIdentity,
    pub display: ComponentIdentity,
    /// Formatted with the session's index base.
    pub text: String,
    pub enabled: bool,
}

/// Snapshot of a session's problems, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemReport {
    pub entries: Vec<ReportEntry>,
    pub info: String,
    pub fix_plan: FixPlan,
}

/// A diagnostic session over one model.
#[derive(Debug)]
pub struct IssueSession {
    registry: Arc<DefectRegistry>,
    options: Arc<RwLock<OptionStore>>,
    problems: ProblemCollection,
}

impl IssueSession {
    /// Create a session over an existing registry and option store.
    pub fn new(
        registry: Arc<DefectRegistry>,
        options: Arc<RwLock<OptionStore>>,
    ) -> Result<Self, BrepdocError> {
        let problems = ProblemCollection::new(Arc::clone(&registry))?;
        Ok(Self {
            registry,
            options,
            problems,
        })
    }

    /// A session over the standard registry, with every settings
    /// initializer run and enablement read live from the option store.
    pub fn standard() -> Result<Self, BrepdocError> {
        let base = DefectRegistry::standard();
        let mut store = OptionStore::new();
        base.initialize_settings(&mut store);

        let options = Arc::new(RwLock::new(store));
        let registry = Arc::new(base.with_enablement(options.clone()));
        Self::new(registry, options)
    }

    #[must_use]
    pub fn with_index_base(mut self, index_base: IndexBase) -> Self {
        self.problems = self.problems.duplicate().with_index_base(index_base);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DefectRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> &Arc<RwLock<OptionStore>> {
        &self.options
    }

    #[must_use]
    pub fn problems(&self) -> &ProblemCollection {
        &self.problems
    }

    pub fn problems_mut(&mut self) -> &mut ProblemCollection {
        &mut self.problems
    }

    /// Run the mesh detector with the current option values.
    pub fn detect_mesh<M: MeshQuery + ?Sized>(&mut self, mesh: Option<&M>) -> usize {
        let detector = match self.options.read() {
            Ok(store) => MeshDefectDetector::from_options(&*store),
            Err(_) => {
                tracing::warn!("option store lock poisoned, using default mesh options");
                MeshDefectDetector::default()
            }
        };
        detector.find_in(&mut self.problems, mesh)
    }

    /// Run the topology detector.
    pub fn detect_topology<T: BrepTopology + ?Sized>(&mut self, brep: Option<&T>) -> usize {
        TopologyDefectDetector::new().find_in(&mut self.problems, brep)
    }

    /// Append the problems another producer collected.
    pub fn merge(&mut self, other: &ProblemCollection) {
        self.problems.add_range(other);
    }

    /// Fix plan over the problems whose kind is currently enabled.
    #[must_use]
    pub fn fix_plan(&self) -> FixPlan {
        FixPlan::resolve(
            self.problems
                .iter()
                .filter(|record| self.registry.is_enabled(record.kind())),
            &self.registry,
        )
    }

    /// All problems, highest priority first, plus the enabled fix plan.
    #[must_use]
    pub fn report(&self) -> ProblemReport {
        let entries = self
            .problems
            .by_priority()
            .into_iter()
            .map(|record| ReportEntry {
                kind: record.kind(),
                severity: self.registry.weight(record.kind()).severity,
                component: record.real(),
                display: record.display(),
                text: self.problems.format(record),
                enabled: self.registry.is_enabled(record.kind()),
            })
            .collect();

        ProblemReport {
            entries,
            info: self.problems.info(),
            fix_plan: self.fix_plan(),
        }
    }

    /// Forget every problem found so far.
    pub fn reset(&mut self) {
        self.problems.close();
    }
}

// =============================================================================
// TESTS
// =============================================================================
