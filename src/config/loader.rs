//! File loading and merging for ringside configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::types::{default_model, ChatConfig, Config, DataConfig, ProviderConfig, ProviderEntry};

impl Config {
    /// Loads the global config from `~/.config/ringside/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = default_config_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            debug!(path = %path.display(), "wrote default config");
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        Self::load_file(&path)
    }

    /// Look for ringside.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                debug!(path = %candidate.display(), "found project config");
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: ProviderConfig {
                openai: merge_entry(global.provider.openai, project.provider.openai),
                openrouter: merge_entry(global.provider.openrouter, project.provider.openrouter),
                ollama: merge_entry(global.provider.ollama, project.provider.ollama),
            },
            default_provider: project.default_provider.or(global.default_provider),
            // Both default to Some, so the project only wins when it differs.
            system_prompt: if project.system_prompt != Config::default().system_prompt {
                project.system_prompt
            } else {
                global.system_prompt
            },
            system_prompt_file: project.system_prompt_file.or(global.system_prompt_file),
            chat: ChatConfig {
                temperature: project.chat.temperature.or(global.chat.temperature),
                show_function_calls: project
                    .chat
                    .show_function_calls
                    .or(global.chat.show_function_calls),
                max_function_turns: project
                    .chat
                    .max_function_turns
                    .or(global.chat.max_function_turns),
                welcome_message: project.chat.welcome_message.or(global.chat.welcome_message),
            },
            data: DataConfig {
                dir: project.data.dir.or(global.data.dir),
            },
        }
    }
}

fn merge_entry(global: Option<ProviderEntry>, project: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (global, project) {
        (Some(g), Some(p)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
            model: p.model.or(g.model),
        }),
        (g, p) => p.or(g),
    }
}

fn default_config_toml() -> String {
    format!(
        r#"model = "{model}"

[provider]

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "{ollama}"

[chat]
temperature = {temperature}
show_function_calls = {show}
max_function_turns = {turns}

[data]
dir = "{data}"
"#,
        model = default_model(),
        ollama = crate::constants::OLLAMA_DEFAULT_BASE_URL,
        temperature = crate::constants::DEFAULT_TEMPERATURE,
        show = crate::constants::SHOW_FUNCTION_CALLS_DEFAULT,
        turns = crate::constants::MAX_FUNCTION_TURNS_DEFAULT,
        data = crate::constants::DEFAULT_DATA_DIR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_toml_parses() {
        let config: Config = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.chat.temperature, Some(0.25));
        assert_eq!(config.chat.show_function_calls, Some(false));
        assert_eq!(config.chat.max_function_turns, Some(3));
        assert_eq!(config.data.dir.as_deref(), Some("data"));
        assert_eq!(
            config.provider.openai.unwrap().api_key.as_deref(),
            Some("{env:OPENAI_API_KEY}")
        );
    }

    #[test]
    fn test_merge_project_wins_per_field() {
        let global: Config = toml::from_str(
            r#"
            model = "gpt-4"
            default_provider = "openai"
            [provider.openai]
            api_key = "global-key"
            base_url = "https://proxy.example/v1"
            [chat]
            temperature = 0.5
            show_function_calls = true
            "#,
        )
        .unwrap();
        let project: Config = toml::from_str(
            r#"
            model = "gpt-4o"
            [provider.openai]
            api_key = "project-key"
            [chat]
            max_function_turns = 1
            [data]
            dir = "fixtures"
            "#,
        )
        .unwrap();

        let merged = Config::merge(global, project);
        assert_eq!(merged.model, "gpt-4o");
        assert_eq!(merged.default_provider.as_deref(), Some("openai"));
        let openai = merged.provider.openai.unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("project-key"));
        assert_eq!(openai.base_url.as_deref(), Some("https://proxy.example/v1"));
        assert_eq!(merged.chat.temperature, Some(0.5));
        assert_eq!(merged.chat.show_function_calls, Some(true));
        assert_eq!(merged.chat.max_function_turns, Some(1));
        assert_eq!(merged.data.dir.as_deref(), Some("fixtures"));
    }

    #[test]
    fn test_merge_keeps_global_system_prompt_when_project_is_default() {
        let global = Config {
            system_prompt: Some("Only talk about boxing.".into()),
            ..Config::default()
        };
        let merged = Config::merge(global, Config::default());
        assert_eq!(merged.system_prompt.as_deref(), Some("Only talk about boxing."));
    }
}
