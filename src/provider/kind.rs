//! Provider kind enumeration and per-provider defaults.
//!
//! Every supported backend speaks the OpenAI chat-completions protocol, so a
//! [`ProviderKind`] only decides where requests go, which key they carry and
//! which model is used when none is configured.

use anyhow::{anyhow, Result};

use crate::constants::{
    DEFAULT_MODEL, DEFAULT_OPENROUTER_MODEL, OLLAMA_DEFAULT_BASE_URL, OLLAMA_DEFAULT_MODEL,
    OPENAI_DEFAULT_BASE_URL, OPENROUTER_DEFAULT_BASE_URL,
};

/// Identifies which LLM provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI (GPT models).
    OpenAI,
    /// OpenRouter (multi-provider gateway).
    OpenRouter,
    /// Ollama (local models via its OpenAI-compatible endpoint).
    Ollama,
}

impl ProviderKind {
    /// Parses a provider name string into a [`ProviderKind`].
    ///
    /// Matching is case-insensitive. Returns an error for unknown providers.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!(
                "Unknown provider: {other}. Supported: openai, openrouter, ollama"
            )),
        }
    }

    /// Config table name and API-key prefix (`openai` → `OPENAI_API_KEY`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        }
    }

    /// Base URL when the config does not override it. For Ollama this is the
    /// server root; the OpenAI-compatible API lives under `/v1`.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_DEFAULT_BASE_URL,
            Self::OpenRouter => OPENROUTER_DEFAULT_BASE_URL,
            Self::Ollama => OLLAMA_DEFAULT_BASE_URL,
        }
    }
}

/// Returns the default model identifier for a given provider.
pub fn default_model_for(provider: &ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAI => DEFAULT_MODEL,
        ProviderKind::OpenRouter => DEFAULT_OPENROUTER_MODEL,
        ProviderKind::Ollama => OLLAMA_DEFAULT_MODEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(ProviderKind::from_str("OpenAI").unwrap(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::from_str("ollama").unwrap(), ProviderKind::Ollama);
        let err = ProviderKind::from_str("anthropic").unwrap_err();
        assert!(err.to_string().contains("Supported: openai, openrouter, ollama"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_model_for(&ProviderKind::OpenAI), "gpt-4");
        assert_eq!(default_model_for(&ProviderKind::OpenRouter), "openai/gpt-4");
        assert_eq!(ProviderKind::Ollama.default_base_url(), "http://localhost:11434");
    }
}
