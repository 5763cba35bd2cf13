use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::strategies;
use crate::traits::AnalysisStrategy;
use crate::types::{AnalysisError, Result, TaskInfo, TaskKind};

/// Maps task identifiers to strategies. This is the single source of truth for which
/// tasks exist; it is filled at startup and only read afterwards.
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn AnalysisStrategy>>,
    index: HashMap<String, usize>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A registry holding one built-in strategy per task kind.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for kind in TaskKind::ALL {
            // Every kind is distinct, so this cannot collide
            if let Err(e) = registry.register(strategies::builtin(kind)) {
                debug!("Skipping built-in strategy: {}", e);
            }
        }
        registry
    }

    /// Register a strategy under its task identifier
    pub fn register(&mut self, strategy: Arc<dyn AnalysisStrategy>) -> Result<()> {
        let task_id = strategy.kind().as_str().to_string();
        if self.index.contains_key(&task_id) {
            return Err(AnalysisError::DuplicateTask(task_id));
        }

        info!("Registering analysis strategy: {}", task_id);
        self.index.insert(task_id, self.strategies.len());
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn resolve(&self, task_id: &str) -> Result<Arc<dyn AnalysisStrategy>> {
        self.index
            .get(task_id)
            .map(|&i| Arc::clone(&self.strategies[i]))
            .ok_or_else(|| AnalysisError::UnknownTask(task_id.to_string()))
    }

    /// Registered tasks in registration order.
    pub fn list_tasks(&self) -> Vec<TaskInfo> {
        self.strategies
            .iter()
            .map(|strategy| {
                let kind = strategy.kind();
                TaskInfo {
                    task_id: kind.as_str().to_string(),
                    display_name: kind.display_name().to_string(),
                }
            })
            .collect()
    }

    pub fn task_ids(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.kind().as_str()).collect()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Load every strategy's model ahead of traffic.
    pub async fn warm_up(&self) -> Result<()> {
        for strategy in &self.strategies {
            strategy.warm_up().await?;
        }
        Ok(())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
