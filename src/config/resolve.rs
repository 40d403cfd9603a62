//! Environment variable substitution, API key resolution and the
//! accessors that apply built-in defaults.

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::types::{Config, ProviderEntry};

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_TEMPERATURE, DEFAULT_WELCOME_MESSAGE, MAX_FUNCTION_TURNS_DEFAULT,
    SHOW_FUNCTION_CALLS_DEFAULT,
};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        for field in [
            &mut self.system_prompt,
            &mut self.system_prompt_file,
            &mut self.default_provider,
            &mut self.data.dir,
        ] {
            if let Some(value) = field {
                *value = Self::resolve_str(value);
            }
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
        Self::resolve_provider_entry(&mut self.provider.ollama);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            if let Some(ref mut key) = e.api_key {
                *key = Self::resolve_str(key);
            }
            if let Some(ref mut url) = e.base_url {
                *url = Self::resolve_str(url);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// The `[provider.<name>]` table for a provider, if configured.
    pub fn provider_entry(&self, provider: &str) -> Option<&ProviderEntry> {
        match provider {
            "openai" => self.provider.openai.as_ref(),
            "openrouter" => self.provider.openrouter.as_ref(),
            "ollama" => self.provider.ollama.as_ref(),
            _ => None,
        }
    }

    /// Resolve API key for a provider: env var first, then config value.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        // OPENAI_API_KEY, OPENROUTER_API_KEY, ...
        let env_key = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(val) = std::env::var(&env_key) {
            if !val.is_empty() {
                return Some(val);
            }
        }

        self.provider_entry(provider)
            .and_then(|e| e.api_key.clone())
            .filter(|key| !key.is_empty())
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Get the model name from config, stripping a known provider prefix.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        match m.split_once('/') {
            Some((prov, model)) if self.provider_entry(prov).is_some() || is_provider(prov) => {
                Some(model.to_string())
            }
            _ => Some(m.to_string()),
        }
    }

    /// The system prompt text: the file's contents when `system_prompt_file`
    /// is set, otherwise `system_prompt`, otherwise empty.
    pub fn effective_system_prompt(&self) -> Result<String> {
        if let Some(ref file) = self.system_prompt_file {
            return std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read system prompt file {:?}", file));
        }
        Ok(self.system_prompt.clone().unwrap_or_default())
    }

    pub fn temperature(&self) -> f32 {
        self.chat.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn show_function_calls(&self) -> bool {
        self.chat
            .show_function_calls
            .unwrap_or(SHOW_FUNCTION_CALLS_DEFAULT)
    }

    pub fn max_function_turns(&self) -> usize {
        self.chat
            .max_function_turns
            .unwrap_or(MAX_FUNCTION_TURNS_DEFAULT)
    }

    /// `None` when the welcome message is configured as empty.
    pub fn welcome_message(&self) -> Option<&str> {
        match self.chat.welcome_message.as_deref() {
            Some("") => None,
            Some(msg) => Some(msg),
            None => Some(DEFAULT_WELCOME_MESSAGE),
        }
    }

    /// Directory holding the lookup datasets.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.data.dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }
}

fn is_provider(name: &str) -> bool {
    matches!(name, "openai" | "openrouter" | "ollama")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_str_substitutes_env() {
        std::env::set_var("RINGSIDE_TEST_SUBST", "abc");
        assert_eq!(Config::resolve_str("x-{env:RINGSIDE_TEST_SUBST}-y"), "x-abc-y");
        assert_eq!(Config::resolve_str("{env:RINGSIDE_TEST_UNSET_VAR}"), "");
        assert_eq!(Config::resolve_str("{env:BROKEN"), "{env:BROKEN");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.temperature(), 0.25);
        assert!(!config.show_function_calls());
        assert_eq!(config.max_function_turns(), 3);
        assert_eq!(config.welcome_message(), Some(DEFAULT_WELCOME_MESSAGE));
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert_eq!(config.model_name(), None);
    }

    #[test]
    fn test_empty_welcome_message_disables_it() {
        let mut config = Config::default();
        config.chat.welcome_message = Some(String::new());
        assert_eq!(config.welcome_message(), None);
    }

    #[test]
    fn test_model_name_strips_provider_prefix_only() {
        let mut config = Config::default();
        config.model = "ollama/llama3".into();
        assert_eq!(config.model_name().as_deref(), Some("llama3"));
        config.model = "meta-llama/llama-3-70b".into();
        assert_eq!(config.model_name().as_deref(), Some("meta-llama/llama-3-70b"));
    }

    #[test]
    fn test_api_key_from_config_entry() {
        let mut config = Config::default();
        config.provider.ollama = Some(ProviderEntry {
            api_key: Some("local".into()),
            ..ProviderEntry::default()
        });
        assert_eq!(config.resolve_api_key("ollama").as_deref(), Some("local"));
        assert_eq!(config.resolve_api_key("nonexistent"), None);
    }

    #[test]
    fn test_system_prompt_file_wins() {
        let path = std::env::temp_dir().join("ringside_test_system_prompt.md");
        std::fs::write(&path, "From a file.").unwrap();
        let config = Config {
            system_prompt_file: Some(path.to_string_lossy().into_owned()),
            ..Config::default()
        };
        assert_eq!(config.effective_system_prompt().unwrap(), "From a file.");
        std::fs::remove_file(&path).unwrap();

        let missing = Config {
            system_prompt_file: Some("/nonexistent/prompt.md".into()),
            ..Config::default()
        };
        assert!(missing.effective_system_prompt().is_err());
    }
}
