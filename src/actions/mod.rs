pub mod records;
pub mod schedule;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::data::Datasets;
use records::RecordsAction;
use schedule::ScheduleAction;

/// The text produced by running an action. Errors are folded into the same
/// string, so there is no success flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub value: String,
}

impl ActionResult {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Definition sent to the model in the request's `functions` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Every lookup implements this trait.
#[async_trait::async_trait]
pub trait Action: Send + Sync {
    /// Unique name the model uses to call this action.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the action's arguments.
    fn schema(&self) -> Value;

    /// Runs the lookup with already-parsed JSON arguments.
    async fn execute(&self, args: Value) -> Result<ActionResult>;

    fn spec(&self) -> ActionSpec {
        ActionSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

/// Holds the registered actions and looks them up by name.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Names must be unique.
    pub fn register(&mut self, action: Box<dyn Action>) -> Result<()> {
        anyhow::ensure!(
            self.get(action.name()).is_none(),
            "Action '{}' is already registered",
            action.name()
        );
        self.actions.push(Arc::from(action));
        Ok(())
    }

    /// Specs for every action, in registration order.
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.actions.iter().map(|a| a.spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.iter().find(|a| a.name() == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The schedule and boxing-records lookups over `datasets`.
    pub fn with_builtins(datasets: Arc<Datasets>) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(ScheduleAction::new(Arc::clone(&datasets))))?;
        registry.register(Box::new(RecordsAction::new(datasets)))?;
        Ok(registry)
    }
}

/// Parses the raw argument text and runs the action. A parse or execution
/// failure becomes the result text so the model can see it and retry.
pub async fn run_action(action: &dyn Action, arguments: &str) -> ActionResult {
    debug!(action = action.name(), args_len = arguments.len(), "dispatching action");
    let outcome = match serde_json::from_str::<Value>(arguments) {
        Ok(args) => action.execute(args).await,
        Err(e) => Err(e.into()),
    };
    match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(action = action.name(), error = %e, "action failed");
            ActionResult::new(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests;
