//! Lookup table from task kind to strategy.

use super::{
    PushCommitStrategy, PushStrategy, PushTagSingleStrategy, PushTagsStrategy, StrategyError,
    TaskStrategy,
};
use crate::schedule::domain::TaskKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves task kinds to strategies; fails closed on anything unregistered.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<TaskKind, Arc<dyn TaskStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with one strategy per [`TaskKind`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_strategy(Arc::new(PushStrategy))
            .with_strategy(Arc::new(PushTagsStrategy))
            .with_strategy(Arc::new(PushTagSingleStrategy))
            .with_strategy(Arc::new(PushCommitStrategy))
    }

    /// Registers `strategy` under its own kind, replacing any previous entry.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn TaskStrategy>) -> Self {
        self.strategies.insert(strategy.kind(), strategy);
        self
    }

    /// Returns the strategy for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::UnknownTaskType`] when nothing is registered
    /// for `kind`.
    pub fn resolve(&self, kind: TaskKind) -> Result<Arc<dyn TaskStrategy>, StrategyError> {
        self.strategies
            .get(&kind)
            .cloned()
            .ok_or_else(|| StrategyError::UnknownTaskType(kind.as_str().to_owned()))
    }

    /// Returns the strategy for a textual task type.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::UnknownTaskType`] when the identifier does not
    /// parse or has no registered strategy.
    pub fn resolve_identifier(
        &self,
        identifier: &str,
    ) -> Result<Arc<dyn TaskStrategy>, StrategyError> {
        let kind = TaskKind::try_from(identifier)
            .map_err(|_| StrategyError::UnknownTaskType(identifier.to_owned()))?;
        self.resolve(kind)
    }

    /// Returns `true` when every [`TaskKind`] has a strategy.
    #[must_use]
    pub fn covers_all_kinds(&self) -> bool {
        TaskKind::ALL
            .iter()
            .all(|kind| self.strategies.contains_key(kind))
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.strategies.keys().map(|kind| kind.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("StrategyRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
