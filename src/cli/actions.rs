//! `ringside actions` subcommands: inspect and run the lookups directly,
//! without a model in the loop.

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use super::ActionsCommand;
use crate::actions::{run_action, ActionRegistry};
use crate::config::Config;
use crate::data::Datasets;

/// Dispatches an actions subcommand to its handler.
pub(crate) async fn handle_actions(command: ActionsCommand) -> Result<()> {
    let config = Config::load()?;
    let data_dir = config.data_dir();
    let datasets = Datasets::load(&data_dir)
        .with_context(|| format!("Failed to load lookup datasets from {:?}", data_dir))?;
    let registry = ActionRegistry::with_builtins(Arc::new(datasets))?;

    match command {
        ActionsCommand::List => {
            let specs = registry.specs();
            println!("{}", serde_json::to_string_pretty(&specs)?);
            Ok(())
        }
        ActionsCommand::Run { name, args } => {
            let output = run_named(&registry, &name, &args).await?;
            println!("{}", output);
            Ok(())
        }
    }
}

/// Runs one action by name. Unknown names are an error here; failures
/// inside the action come back as result text, same as in a conversation.
pub(crate) async fn run_named(registry: &ActionRegistry, name: &str, args: &str) -> Result<String> {
    let action = registry.get(name).with_context(|| {
        let known: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        format!(
            "Unknown action '{}'. Available: {}",
            name,
            known.join(", ")
        )
    })?;
    eprintln!("{} {}", "running".dimmed(), name.cyan());
    Ok(run_action(action.as_ref(), args).await.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn registry() -> ActionRegistry {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        ActionRegistry::with_builtins(Arc::new(Datasets::load(&dir).unwrap())).unwrap()
    }

    #[tokio::test]
    async fn test_run_named_known_action() {
        let out = run_named(
            &registry(),
            "get_boxing_champs_or_bouts_or_reigns",
            r#"{"collection_to_query": "champions", "jmespath_query": "[-1].name.short"}"#,
        )
        .await
        .unwrap();
        assert_eq!(out, "Canelo");
    }

    #[tokio::test]
    async fn test_run_named_unknown_action() {
        let err = run_named(&registry(), "nope", "{}").await.unwrap_err();
        assert!(err.to_string().starts_with("Unknown action 'nope'"));
    }
}
