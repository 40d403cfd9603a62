//! Centralized constants for ringside.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "ringside";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default system prompt sent ahead of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly sports assistant for DAZN viewers. \
Answer questions about the DAZN event schedule and about boxing champions, bouts and title reigns. \
Use the provided functions to look data up instead of guessing, and keep answers short.";

/// First assistant message shown when a conversation starts.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to DAZN 👋 How's it going? 🙂";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "ringside.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default base URL for the OpenAI API.
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL for the OpenRouter API.
pub const OPENROUTER_DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

/// Connect timeout for the chat-completions endpoint, in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

// --- Chat defaults ---

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.25;

/// Default: function calls and raw results are hidden from the transcript.
pub const SHOW_FUNCTION_CALLS_DEFAULT: bool = false;

/// Default maximum number of function dispatches per user message.
pub const MAX_FUNCTION_TURNS_DEFAULT: usize = 3;

/// Assistant reply used when the model keeps calling functions past the limit.
pub const GIVE_UP_MESSAGE: &str =
    "Sorry, I couldn't find that information. Could you rephrase your question?";

// --- Streaming display ---

/// Trailing marker drawn after partial output while a reply streams in.
pub const CURSOR: &str = "▌";

/// Placeholder shown while a hidden function call is being assembled.
pub const WORKING_PLACEHOLDER: &str = "Just a sec 🔍";

/// Prefix drawn before streamed function arguments when calls are shown.
pub const CALL_DISPLAY_PREFIX: &str = "\n\n`Query: ";

// --- Lookups ---

/// Default directory holding the lookup datasets.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Maximum number of rows or list items a lookup returns.
pub const LOOKUP_MAX_RESULTS: usize = 5;

/// Sentinel returned when the schedule filter matches nothing.
pub const NO_EVENTS_FOUND: &str = "Query result: No events found with that criteria";
