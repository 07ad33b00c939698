//! Memoization of computed types and evaluated nodes

use conduit_ast::{DocumentId, NodeKey};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::evaluated::EvaluatedNode;
use crate::types::Type;

/// Cache key: a node inside a specific document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePath {
    pub document: DocumentId,
    pub node: NodeKey,
}

/// Per-document cache for `compute_type` and `evaluate`.
///
/// Entries may be derived from each other, so the cache is only ever
/// invalidated as a whole.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    types: FxHashMap<NodePath, Type>,
    evaluations: FxHashMap<NodePath, EvaluatedNode>,
    types_in_progress: FxHashSet<NodePath>,
    evaluations_in_progress: FxHashSet<NodePath>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_type(&self, path: &NodePath) -> Option<&Type> {
        self.types.get(path)
    }

    /// Mark a type computation as started. Returns `false` if it already is,
    /// i.e. the request is re-entrant.
    pub fn begin_type(&mut self, path: NodePath) -> bool {
        self.types_in_progress.insert(path)
    }

    pub fn finish_type(&mut self, path: NodePath, ty: Type) {
        self.types_in_progress.remove(&path);
        self.types.insert(path, ty);
    }

    pub fn cached_evaluation(&self, path: &NodePath) -> Option<&EvaluatedNode> {
        self.evaluations.get(path)
    }

    pub fn begin_evaluation(&mut self, path: NodePath) -> bool {
        self.evaluations_in_progress.insert(path)
    }

    pub fn finish_evaluation(&mut self, path: NodePath, value: EvaluatedNode) {
        self.evaluations_in_progress.remove(&path);
        self.evaluations.insert(path, value);
    }

    /// End an evaluation without memoizing its value
    pub fn abandon_evaluation(&mut self, path: NodePath) {
        self.evaluations_in_progress.remove(&path);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.types.len() + self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.evaluations.clear();
        self.types_in_progress.clear();
        self.evaluations_in_progress.clear();
    }
}
