//! # Problem Collection
//!
//! The ordered set of problems found in one model.
//!
//! - Insertion order is kept unless `sort_by_priority` is called
//! - Priority-ordered reads sort by descending registry priority, stable
//!   among equal priorities
//! - The derived [`FixPlan`] is built lazily and dropped on every mutation
//!
//! Absence is never an error here: `select` returns `None` when nothing
//! matches, `exists` returns `false`, `info` returns an empty string.
//!
//! Not thread-safe for concurrent mutation. Detect into independent
//! collections in parallel, then merge them with `add_range` on one thread.

use crate::primitives::INFO_SEPARATOR;
use crate::{
    BrepdocError, ComponentIdentity, DefectKind, DefectRegistry, FixPlan, IndexBase,
    ProblemRecord,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An ordered collection of problem records.
#[derive(Debug, Clone)]
pub struct ProblemCollection {
    registry: Arc<DefectRegistry>,
    index_base: IndexBase,
    records: Vec<Arc<ProblemRecord>>,
    /// True only right after `sort_by_priority`; any addition clears it.
    sorted: bool,
    plan: Option<FixPlan>,
}

impl ProblemCollection {
    /// Create an empty collection over a validated registry.
    pub fn new(registry: Arc<DefectRegistry>) -> Result<Self, BrepdocError> {
        if !registry.is_validated() {
            return Err(BrepdocError::RegistryNotValidated);
        }
        Ok(Self {
            registry,
            index_base: IndexBase::default(),
            records: Vec::new(),
            sorted: false,
            plan: None,
        })
    }

    /// Set whether displayed component numbers start at 0 or 1.
    #[must_use]
    pub fn with_index_base(mut self, index_base: IndexBase) -> Self {
        self.index_base = index_base;
        self
    }

    #[must_use]
    pub fn index_base(&self) -> IndexBase {
        self.index_base
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DefectRegistry> {
        &self.registry
    }

    // =========================================================================
    // ADDING
    // =========================================================================

    /// Add a problem whose real and display components coincide.
    pub fn add(
        &mut self,
        component: ComponentIdentity,
        text: impl Into<String>,
        kind: DefectKind,
    ) -> Arc<ProblemRecord> {
        self.push(ProblemRecord::new(component, text, kind))
    }

    /// Add an edge problem displayed under its owning trim.
    pub fn add_aliased(
        &mut self,
        real: ComponentIdentity,
        display: ComponentIdentity,
        text: impl Into<String>,
        kind: DefectKind,
    ) -> Arc<ProblemRecord> {
        self.push(ProblemRecord::aliased(real, display, text, kind))
    }

    /// Add a fully built record (payload, fixability override).
    pub fn push(&mut self, record: ProblemRecord) -> Arc<ProblemRecord> {
        let record = Arc::new(record);
        self.records.push(Arc::clone(&record));
        self.invalidate();
        record
    }

    /// Append every record of `other`, sharing them.
    pub fn add_range(&mut self, other: &ProblemCollection) {
        if other.records.is_empty() {
            return;
        }
        self.records.extend(other.records.iter().cloned());
        self.invalidate();
    }

    // =========================================================================
    // READING
    // =========================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in current order.
    pub fn iter(&self) -> impl Iterator<Item = &ProblemRecord> + '_ {
        self.records.iter().map(Arc::as_ref)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ProblemRecord> {
        self.records.get(index).map(Arc::as_ref)
    }

    /// Format one record with this collection's index base.
    #[must_use]
    pub fn format(&self, record: &ProblemRecord) -> String {
        record.format(self.index_base)
    }

    /// All problems as one line, highest priority first.
    ///
    /// Empty for no records; a single record is returned as is.
    #[must_use]
    pub fn info(&self) -> String {
        match self.records.as_slice() {
            [] => String::new(),
            [only] => self.format(only),
            _ => self
                .by_priority()
                .into_iter()
                .map(|record| self.format(record))
                .collect::<Vec<_>>()
                .join(INFO_SEPARATOR),
        }
    }

    /// Records in descending priority, ties in current order.
    #[must_use]
    pub fn by_priority(&self) -> Vec<&ProblemRecord> {
        let mut ordered: Vec<&ProblemRecord> = self.iter().collect();
        if !self.sorted {
            ordered.sort_by_key(|record| Reverse(self.registry.priority(record.kind())));
        }
        ordered
    }

    /// Reorder the records by descending priority, stable among ties.
    pub fn sort_by_priority(&mut self) {
        if self.sorted {
            return;
        }
        let registry = Arc::clone(&self.registry);
        self.records
            .sort_by_key(|record| Reverse(registry.priority(record.kind())));
        self.invalidate();
        self.sorted = true;
    }

    /// Whether the current order is the priority order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of records per kind.
    #[must_use]
    pub fn kind_counts(&self) -> BTreeMap<DefectKind, usize> {
        let mut counts = BTreeMap::new();
        for record in self.iter() {
            *counts.entry(record.kind()).or_insert(0) += 1;
        }
        counts
    }

    // =========================================================================
    // FILTERING
    // =========================================================================

    /// Records matching `predicate`, or `None` if nothing matches.
    #[must_use]
    pub fn select<F>(&self, predicate: F) -> Option<ProblemCollection>
    where
        F: Fn(&ProblemRecord) -> bool,
    {
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect();
        if records.is_empty() {
            return None;
        }
        Some(self.with_records(records))
    }

    /// Records of one kind, or `None`.
    #[must_use]
    pub fn select_kind(&self, kind: DefectKind) -> Option<ProblemCollection> {
        self.select(|record| record.kind() == kind)
    }

    /// Records whose kind is currently enabled, or `None`.
    #[must_use]
    pub fn select_enabled(&self) -> Option<ProblemCollection> {
        self.select(|record| self.registry.is_enabled(record.kind()))
    }

    /// Remove every record matching `predicate`. Returns how many went.
    pub fn remove_all<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&ProblemRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|record| !predicate(record));
        let removed = before - self.records.len();
        if removed > 0 {
            self.plan = None;
        }
        removed
    }

    /// Remove every record of one kind.
    pub fn remove_kind(&mut self, kind: DefectKind) -> usize {
        self.remove_all(|record| record.kind() == kind)
    }

    #[must_use]
    pub fn exists(&self, kind: DefectKind) -> bool {
        self.iter().any(|record| record.kind() == kind)
    }

    /// Joined description of every record of `kind`, or `None`.
    #[must_use]
    pub fn exists_with_info(&self, kind: DefectKind) -> Option<String> {
        self.select_kind(kind).map(|found| found.info())
    }

    /// True if some record has the same kind and the same formatted text.
    ///
    /// Payloads and components are ignored on purpose so the same defect is
    /// recognized across detection runs.
    #[must_use]
    pub fn contains_problem(&self, candidate: &ProblemRecord) -> bool {
        let text = self.format(candidate);
        self.iter()
            .any(|record| record.kind() == candidate.kind() && self.format(record) == text)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Shallow copy: a new collection sharing the same records.
    #[must_use]
    pub fn duplicate(&self) -> ProblemCollection {
        let mut copy = self.with_records(self.records.clone());
        copy.sorted = self.sorted;
        copy
    }

    /// Drop every record and the cached plan.
    ///
    /// Payloads are only released by this collection; other holders keep
    /// them alive.
    pub fn close(&mut self) {
        self.records.clear();
        self.invalidate();
    }

    /// The fix plan of the current records, built on first access.
    pub fn fix_plan(&mut self) -> &FixPlan {
        self.plan.get_or_insert_with(|| {
            tracing::debug!(records = self.records.len(), "resolving fix plan");
            FixPlan::resolve(self.records.iter().map(Arc::as_ref), &self.registry)
        })
    }

    /// Whether a fix plan is cached.
    #[must_use]
    pub fn has_cached_plan(&self) -> bool {
        self.plan.is_some()
    }

    fn with_records(&self, records: Vec<Arc<ProblemRecord>>) -> ProblemCollection {
        ProblemCollection {
            registry: Arc::clone(&self.registry),
            index_base: self.index_base,
            records,
            sorted: false,
            plan: None,
        }
    }

    fn invalidate(&mut self) {
        self.sorted = false;
        self.plan = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Directive, Payload, Registration, Severity};

    fn collection() -> ProblemCollection {
        ProblemCollection::new(Arc::new(DefectRegistry::standard())).expect("collection")
    }

    #[test]
    fn new_requires_validated_registry() {
        let result = ProblemCollection::new(Arc::new(DefectRegistry::new()));
        assert!(matches!(result, Err(BrepdocError::RegistryNotValidated)));
    }

    #[test]
    fn info_empty_and_single() {
        let mut problems = collection();
        assert_eq!(problems.info(), "");

        problems.add(ComponentIdentity::face(3), "is invalid", DefectKind::FaceIsInvalid);
        assert_eq!(problems.info(), "Face 3: is invalid");
    }

    #[test]
    fn info_sorts_by_descending_priority() {
        let mut problems = collection();
        problems.add(ComponentIdentity::edge(1), "naked", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::unset(), "empty", DefectKind::BrepIsEmpty);
        problems.add(ComponentIdentity::face(0), "invalid", DefectKind::FaceIsInvalid);

        assert_eq!(problems.info(), "empty;  Face 0: invalid;  Edge 1: naked");
        // Reading in priority order leaves insertion order alone.
        assert_eq!(problems.get(0).map(|r| r.kind()), Some(DefectKind::EdgeIsNaked));
        assert!(!problems.is_sorted());
    }

    #[test]
    fn sort_is_stable_for_equal_priorities() {
        let mut problems = collection();
        problems.add(ComponentIdentity::edge(5), "a", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::face(1), "b", DefectKind::FaceIsInvalid);
        problems.add(ComponentIdentity::edge(2), "c", DefectKind::EdgeIsNaked);
        problems.fix_plan();
        assert!(problems.has_cached_plan());

        problems.sort_by_priority();
        assert!(!problems.has_cached_plan());

        let texts: Vec<_> = problems.iter().map(|r| r.text().to_string()).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
        assert!(problems.is_sorted());

        problems.add(ComponentIdentity::edge(9), "d", DefectKind::EdgeIsNaked);
        assert!(!problems.is_sorted());
    }

    #[test]
    fn index_base_one_shifts_numbers() {
        let mut problems = collection().with_index_base(IndexBase::One);
        problems.add(ComponentIdentity::vertex(0), "unused", DefectKind::VertexIsUnused);
        assert_eq!(problems.info(), "Vertex 1: unused");
    }

    #[test]
    fn select_none_when_nothing_matches() {
        let mut problems = collection();
        assert!(problems.select_kind(DefectKind::EdgeIsNaked).is_none());

        problems.add(ComponentIdentity::edge(0), "naked", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::edge(1), "short", DefectKind::EdgeIsTooShort);

        assert!(problems.select_kind(DefectKind::MeshIsEmpty).is_none());
        let naked = problems.select_kind(DefectKind::EdgeIsNaked).expect("some");
        assert_eq!(naked.len(), 1);
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn select_enabled_drops_disabled_kinds() {
        let mut problems = collection();
        problems.add(ComponentIdentity::edge(0), "kinks", DefectKind::EdgeHasKinks);
        assert!(problems.select_enabled().is_none());

        problems.add(ComponentIdentity::edge(0), "naked", DefectKind::EdgeIsNaked);
        let enabled = problems.select_enabled().expect("enabled");
        assert_eq!(enabled.len(), 1);
    }

    #[test]
    fn remove_all_by_kind_and_predicate() {
        let mut problems = collection();
        problems.add(ComponentIdentity::edge(0), "a", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::edge(1), "b", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::face(0), "c", DefectKind::FaceIsInvalid);

        assert_eq!(problems.remove_kind(DefectKind::EdgeIsNaked), 2);
        assert_eq!(problems.remove_kind(DefectKind::EdgeIsNaked), 0);
        assert_eq!(problems.remove_all(|r| r.text() == "c"), 1);
        assert!(problems.is_empty());
    }

    #[test]
    fn exists_and_exists_with_info() {
        let mut problems = collection();
        problems.add(ComponentIdentity::loop_(2), "open", DefectKind::LoopIsNotClosed);
        problems.add(ComponentIdentity::loop_(4), "open", DefectKind::LoopIsNotClosed);

        assert!(problems.exists(DefectKind::LoopIsNotClosed));
        assert!(!problems.exists(DefectKind::LoopIsEmpty));
        assert_eq!(
            problems.exists_with_info(DefectKind::LoopIsNotClosed),
            Some("Loop 2: open;  Loop 4: open".to_string())
        );
        assert_eq!(problems.exists_with_info(DefectKind::LoopIsEmpty), None);
    }

    #[test]
    fn contains_problem_is_semantic() {
        let mut problems = collection();
        let payload: Payload = Arc::new("first run");
        problems.push(
            ProblemRecord::aliased(
                ComponentIdentity::edge(10),
                ComponentIdentity::trim(3),
                "is naked",
                DefectKind::EdgeIsNaked,
            )
            .with_payload(payload),
        );

        let same_text = ProblemRecord::aliased(
            ComponentIdentity::edge(99),
            ComponentIdentity::trim(3),
            "is naked",
            DefectKind::EdgeIsNaked,
        )
        .with_payload(Arc::new("second run"));
        let other_kind = ProblemRecord::new(
            ComponentIdentity::trim(3),
            "is naked",
            DefectKind::TrimIsInvalid,
        );
        let other_text = ProblemRecord::new(
            ComponentIdentity::trim(3),
            "is short",
            DefectKind::EdgeIsNaked,
        );

        assert!(problems.contains_problem(&same_text));
        assert!(!problems.contains_problem(&other_kind));
        assert!(!problems.contains_problem(&other_text));
    }

    #[test]
    fn duplicate_shares_records() {
        let mut problems = collection();
        let original = problems.add(ComponentIdentity::face(0), "x", DefectKind::FaceIsInvalid);

        let mut copy = problems.duplicate();
        copy.remove_kind(DefectKind::FaceIsInvalid);

        assert_eq!(problems.len(), 1);
        assert!(copy.is_empty());
        assert_eq!(Arc::strong_count(&original), 2);
    }

    #[test]
    fn close_keeps_payload_alive() {
        let payload: Payload = Arc::new(vec![1_u8, 2, 3]);
        let mut problems = collection();
        problems.push(
            ProblemRecord::new(ComponentIdentity::face(0), "x", DefectKind::FaceIsInvalid)
                .with_payload(Arc::clone(&payload)),
        );
        problems.fix_plan();

        problems.close();

        assert!(problems.is_empty());
        assert!(!problems.has_cached_plan());
        assert_eq!(Arc::strong_count(&payload), 1);
        assert_eq!(payload.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn fix_plan_is_cached_and_invalidated() {
        let mut problems = collection();
        problems.add(ComponentIdentity::loop_(0), "reversed", DefectKind::LoopHasWrongDirection);

        assert!(problems.fix_plan().is_set(Directive::ReverseLoop));
        assert!(problems.has_cached_plan());

        problems.add(ComponentIdentity::trim(1), "gap", DefectKind::TrimHasGap);
        assert!(!problems.has_cached_plan());
        assert!(problems.fix_plan().is_set(Directive::CloseTrimGaps));

        problems.remove_kind(DefectKind::TrimHasGap);
        assert!(!problems.has_cached_plan());
        assert!(!problems.fix_plan().is_set(Directive::CloseTrimGaps));
    }

    #[test]
    fn add_range_merges_without_renumbering() {
        let registry = Arc::new(DefectRegistry::standard());
        let mut a = ProblemCollection::new(Arc::clone(&registry)).expect("a");
        let mut b = ProblemCollection::new(registry).expect("b");
        a.add(ComponentIdentity::face(0), "x", DefectKind::FaceIsInvalid);
        b.add(ComponentIdentity::face(0), "y", DefectKind::FaceHasNoLoops);
        a.fix_plan();
        assert!(a.has_cached_plan());

        a.add_range(&b);

        assert!(!a.has_cached_plan());
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(1).map(|r| r.real()), Some(ComponentIdentity::face(0)));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn kinds_without_explicit_priority_keep_registration_order() {
        let mut registry = DefectRegistry::new();
        registry.register(Registration::new(DefectKind::TrimIsTooShort, "first"));
        registry.register(Registration::new(DefectKind::EdgeIsTooShort, "second"));
        registry.register(
            Registration::new(DefectKind::EdgeIsNaked, "explicit")
                .priority(0)
                .weight(Severity::Hint, 1, false),
        );
        registry.validate();
        let mut problems = ProblemCollection::new(Arc::new(registry)).expect("collection");

        problems.add(ComponentIdentity::unset(), "second", DefectKind::EdgeIsTooShort);
        problems.add(ComponentIdentity::unset(), "first", DefectKind::TrimIsTooShort);
        problems.add(ComponentIdentity::unset(), "explicit", DefectKind::EdgeIsNaked);

        assert_eq!(problems.info(), "explicit;  first;  second");
    }

    #[test]
    fn kind_counts() {
        let mut problems = collection();
        problems.add(ComponentIdentity::edge(0), "a", DefectKind::EdgeIsNaked);
        problems.add(ComponentIdentity::edge(1), "b", DefectKind::EdgeIsNaked);
        let counts = problems.kind_counts();
        assert_eq!(counts.get(&DefectKind::EdgeIsNaked), Some(&2));
    }
}
