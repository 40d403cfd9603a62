//! Model resolution logic for ringside.
//!
//! Picks the provider and model for a session from CLI flags, the config
//! file and built-in defaults.

use anyhow::Result;

use super::kind::{default_model_for, ProviderKind};
use crate::config::Config;

use crate::constants::DEFAULT_PROVIDER;

/// The provider and model a session talks to.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model: String,
}

/// Resolves the session's provider and model. Flags beat the config file,
/// which beats the provider defaults.
///
/// Examples:
///   --model ollama/llama3  (provider/model shorthand, only when --provider is omitted)
///   --provider openrouter --model "org/model-name"  (slash preserved as model name)
///   --provider openai --model gpt-4o
///   --provider ollama  (uses the provider table's model, then the provider default)
///   (no flags)  (config `model` / `default_provider`, then defaults)
pub fn resolve_model(
    cli_provider: Option<&str>,
    cli_model: Option<&str>,
    config: &Config,
) -> Result<ModelSelection> {
    if cli_provider.is_none() {
        if let Some(model_str) = cli_model {
            if let Some((prov, model)) = model_str.split_once('/') {
                if let Ok(provider) = ProviderKind::from_str(prov) {
                    return Ok(ModelSelection {
                        provider,
                        model: model.to_string(),
                    });
                }
            }
        }
    }

    let provider_str = cli_provider
        .or(config.provider_name())
        .unwrap_or(DEFAULT_PROVIDER);
    let provider = ProviderKind::from_str(provider_str)?;

    let model = cli_model
        .map(String::from)
        .or_else(|| config.model_name())
        .or_else(|| {
            config
                .provider_entry(provider.as_str())
                .and_then(|e| e.model.clone())
        })
        .unwrap_or_else(|| default_model_for(&provider).to_string());

    Ok(ModelSelection { provider, model })
}
