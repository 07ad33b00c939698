//! Analysis context of one document
//!
//! An [`Analysis`] owns everything that is shared between the query
//! components: the resolved builtin classes, the options and the memoization
//! cache. Components are lightweight views borrowed from it.

use std::cell::RefCell;

use conduit_ast::{Module, NodeKey};
use tracing::debug;

use crate::builtins::Builtins;
use crate::cache::{AnalysisCache, NodePath};
use crate::checker::TypeChecker;
use crate::class_hierarchy::ClassHierarchy;
use crate::computer::TypeComputer;
use crate::error::AnalysisError;
use crate::evaluated::EvaluatedNode;
use crate::evaluator::{EvaluationState, PartialEvaluator};
use crate::options::AnalysisOptions;
use crate::types::Type;

pub struct Analysis<'m> {
    module: &'m Module,
    builtins: Builtins,
    options: AnalysisOptions,
    pub(crate) cache: RefCell<AnalysisCache>,
    pub(crate) evaluation_state: RefCell<EvaluationState>,
}

impl<'m> Analysis<'m> {
    pub fn new(module: &'m Module) -> Result<Self, AnalysisError> {
        Self::with_options(module, AnalysisOptions::default())
    }

    pub fn with_options(module: &'m Module, options: AnalysisOptions) -> Result<Self, AnalysisError> {
        let builtins = Builtins::resolve(module, &options.builtin_names)?;
        debug!(
            document = module.document,
            max_call_depth = options.max_call_depth,
            "created analysis"
        );
        Ok(Self {
            module,
            builtins,
            options,
            cache: RefCell::new(AnalysisCache::new()),
            evaluation_state: RefCell::new(EvaluationState::default()),
        })
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Cache key of a node of this analysis' module
    pub(crate) fn path_of(&self, node: NodeKey) -> NodePath {
        NodePath {
            document: self.module.span_of(node).file_id,
            node,
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    pub fn class_hierarchy(&self) -> ClassHierarchy<'_> {
        ClassHierarchy::new(self.module, &self.builtins)
    }

    pub fn evaluator(&self) -> PartialEvaluator<'_> {
        PartialEvaluator::new(self)
    }

    pub fn type_computer(&self) -> TypeComputer<'_> {
        TypeComputer::new(self)
    }

    pub fn type_checker(&self) -> TypeChecker<'_> {
        TypeChecker::new(self)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn compute_type(&self, node: impl Into<NodeKey>) -> Type {
        self.type_computer().compute_type(node)
    }

    pub fn evaluate(&self, node: impl Into<NodeKey>) -> EvaluatedNode {
        self.evaluator().evaluate(node)
    }

    pub fn is_assignable_to(&self, ty: &Type, other: &Type) -> bool {
        self.type_checker().is_assignable_to(ty, other)
    }

    pub fn lowest_common_supertype(&self, types: &[Type]) -> Type {
        self.type_computer().lowest_common_supertype(types)
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Number of memoized types and evaluations
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Drop every memoized result
    pub fn invalidate(&self) {
        let mut cache = self.cache.borrow_mut();
        debug!(
            document = self.module.document,
            entries = cache.len(),
            "invalidating analysis cache"
        );
        cache.clear();
        *self.evaluation_state.borrow_mut() = EvaluationState::default();
    }

    /// Switch to a reparsed version of the document
    pub fn reload(&mut self, module: &'m Module) -> Result<(), AnalysisError> {
        self.builtins = Builtins::resolve(module, &self.options.builtin_names)?;
        self.module = module;
        self.invalidate();
        Ok(())
    }
}
