//! Struct definitions and serde defaults for ringside configuration.

use serde::{Deserialize, Serialize};

/// Root configuration, deserialized from `config.toml`.
///
/// Every field has a serde default, so an empty file is a valid config.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"gpt-4"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// `[provider.<name>]` tables.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g. "openai", "ollama").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// System prompt that opens every conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Read the system prompt from this file instead. Wins over `system_prompt`.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Serde default for [`Config::model`].
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// One optional table per supported provider; unconfigured ones stay `None`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
}

/// Connection details for a single provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProviderEntry {
    /// Bearer token; `<PROVIDER>_API_KEY` in the environment takes precedence.
    pub api_key: Option<String>,
    /// Custom base URL (proxies, self-hosted gateways).
    pub base_url: Option<String>,
    /// Model identifier to use with this provider when none is given elsewhere.
    pub model: Option<String>,
}

/// Conversation loop settings.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatConfig {
    /// Sampling temperature sent with every request.
    pub temperature: Option<f32>,
    /// Show function calls and raw lookup results in the transcript.
    pub show_function_calls: Option<bool>,
    /// Function dispatches allowed per user message before giving up.
    pub max_function_turns: Option<usize>,
    /// First assistant message of a conversation. Empty disables it.
    pub welcome_message: Option<String>,
}

/// Where the lookup datasets live.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            default_provider: None,
            system_prompt: default_system_prompt(),
            system_prompt_file: None,
            chat: ChatConfig::default(),
            data: DataConfig::default(),
        }
    }
}
