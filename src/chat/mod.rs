//! Interactive chat REPL for ringside.
//!
//! Provides a multi-turn conversation using [`rustyline`] for readline
//! support (history, line editing). Each line runs one turn of the
//! conversation loop; the whole context log goes out with every request.

mod commands;

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::debug;

use crate::actions::ActionRegistry;
use crate::agent::{agent_loop, TurnSettings};
use crate::config::Config;
use crate::conversation::{dated_system_prompt, Conversation};
use crate::data::Datasets;
use crate::format;
use crate::output::{Renderer, StdoutRenderer};
use crate::provider::{ChatModel, ModelSelection, OpenAiCompatible};

/// Everything one conversation needs: the model, the actions it may call,
/// the turn settings and the conversation state itself.
pub struct ChatSession {
    model: Box<dyn ChatModel>,
    actions: ActionRegistry,
    settings: TurnSettings,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(
        model: Box<dyn ChatModel>,
        actions: ActionRegistry,
        settings: TurnSettings,
        conversation: Conversation,
    ) -> Self {
        Self {
            model,
            actions,
            settings,
            conversation,
        }
    }

    /// Loads the datasets, builds the provider client and opens a fresh
    /// conversation. `show_calls` forces function-call display on.
    pub fn from_config(config: &Config, selection: &ModelSelection, show_calls: bool) -> Result<Self> {
        let data_dir = config.data_dir();
        let datasets = Datasets::load(&data_dir)
            .with_context(|| format!("Failed to load lookup datasets from {:?}", data_dir))?;
        let actions = ActionRegistry::with_builtins(Arc::new(datasets))?;
        let model = OpenAiCompatible::from_config(config, selection)?;

        let system_prompt = dated_system_prompt(&config.effective_system_prompt()?);
        let conversation = Conversation::new(system_prompt, config.welcome_message());

        let settings = TurnSettings {
            model: selection.model.clone(),
            temperature: config.temperature(),
            show_function_calls: show_calls || config.show_function_calls(),
            max_function_turns: config.max_function_turns(),
        };
        debug!(?settings, actions = actions.len(), "chat session ready");
        Ok(Self::new(Box::new(model), actions, settings, conversation))
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Runs one user turn. On failure the conversation is rolled back to
    /// before the user's message so the turn can be retried.
    pub async fn turn(&mut self, input: &str, renderer: &mut dyn Renderer) -> Result<String> {
        let checkpoint = self.conversation.checkpoint();
        self.conversation.push_user(input);
        let result = agent_loop(
            self.model.as_ref(),
            &mut self.conversation,
            &self.actions,
            renderer,
            &self.settings,
        )
        .await;
        if result.is_err() {
            self.conversation.rollback(checkpoint);
        }
        result
    }
}

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/ringside/chat_history.txt`
pub async fn run_chat(config: Config, selection: &ModelSelection, show_calls: bool) -> Result<()> {
    let mut session = ChatSession::from_config(&config, selection, show_calls)?;

    println!(
        "{} [model: {}] (Ctrl+D to exit, /help for commands)",
        format!("{} chat", crate::constants::APP_NAME).bold().cyan(),
        selection.model.yellow(),
    );
    if session.settings().show_function_calls {
        println!("{}", "function calls and lookup results are shown".dimmed());
    }
    println!();
    for entry in session.conversation().display() {
        println!("{}", format::format_entry(entry));
        println!();
    }

    // Set up readline with persistent history
    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let readline = rl.readline(&format!("{} ", ">".green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    match commands::handle_slash_command(&line, session.conversation_mut()) {
                        commands::CommandAction::Continue => continue,
                        commands::CommandAction::Unknown(cmd) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                            continue;
                        }
                    }
                }

                let _ = rl.add_history_entry(&line);
                println!();

                let mut renderer = StdoutRenderer::new();
                if let Err(e) = session.turn(&line, &mut renderer).await {
                    renderer.render_error(&format!("{:#}", e));
                    println!();
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                debug!(turns = session.conversation().user_turns(), "chat ended");
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    // Save readline history
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatRequest, DeltaStream};
    use crate::stream::Delta;
    use futures::StreamExt;

    struct Offline;

    #[async_trait::async_trait]
    impl ChatModel for Offline {
        async fn stream_chat(&self, _request: ChatRequest<'_>) -> Result<DeltaStream> {
            anyhow::bail!("connection refused")
        }
    }

    struct Canned(&'static str);

    #[async_trait::async_trait]
    impl ChatModel for Canned {
        async fn stream_chat(&self, _request: ChatRequest<'_>) -> Result<DeltaStream> {
            Ok(futures::stream::iter(vec![Ok(Delta::content(self.0))]).boxed())
        }
    }

    struct Silent;

    impl Renderer for Silent {
        fn render_frame(&mut self, _frame: &str) {}
        fn render_done(&mut self, _final_frame: &str) {}
        fn render_function_result(&mut self, _name: &str, _result: &str) {}
        fn render_warning(&mut self, _msg: &str) {}
        fn render_error(&mut self, _err: &str) {}
    }

    fn session(model: Box<dyn ChatModel>) -> ChatSession {
        ChatSession::new(
            model,
            ActionRegistry::new(),
            TurnSettings {
                model: "gpt-4".into(),
                temperature: 0.25,
                show_function_calls: false,
                max_function_turns: 3,
            },
            Conversation::new("sys", Some("Welcome")),
        )
    }

    #[tokio::test]
    async fn test_failed_turn_rolls_back() {
        let mut session = session(Box::new(Offline));
        let err = session.turn("hello?", &mut Silent).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(session.conversation().context().len(), 2);
        assert_eq!(session.conversation().user_turns(), 0);
    }

    #[tokio::test]
    async fn test_turn_appends_user_and_reply() {
        let mut session = session(Box::new(Canned("Hi there!")));
        let reply = session.turn("hello", &mut Silent).await.unwrap();
        assert_eq!(reply, "Hi there!");
        assert_eq!(session.conversation().context().len(), 4);
        assert_eq!(session.conversation().display().len(), 3);
    }
}
