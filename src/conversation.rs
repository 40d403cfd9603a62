//! Conversation state for one chat session.
//!
//! A [`Conversation`] owns two parallel, append-only logs: the model-context
//! log sent to the API on every call (system prompt and function bookkeeping
//! included) and the display log shown to the user, which may omit or
//! simplify entries. The caller owns the value and lends it to
//! [`agent_loop`](crate::agent::agent_loop) for each turn.

use crate::message::{FunctionCall, Message, Role};

/// What a display entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    User,
    Assistant,
    /// The assistant's rendering of a function call (show-calls mode).
    FunctionCall,
    /// Raw lookup output (show-calls mode).
    FunctionResult,
}

/// One entry of the user-visible transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub kind: DisplayKind,
    pub content: String,
}

impl DisplayEntry {
    fn new(kind: DisplayKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Log lengths captured before a turn, used to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    context_len: usize,
    display_len: usize,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    context: Vec<Message>,
    display: Vec<DisplayEntry>,
    /// Length of both logs right after construction; `clear` returns here.
    initial: Checkpoint,
}

impl Conversation {
    /// Starts a conversation with the system prompt and an optional welcome
    /// message. The welcome message lands in both logs; the system prompt
    /// only in the model-context log.
    pub fn new(system_prompt: impl Into<String>, welcome: Option<&str>) -> Self {
        let mut context = vec![Message::system(system_prompt)];
        let mut display = Vec::new();
        if let Some(welcome) = welcome {
            context.push(Message::assistant(welcome));
            display.push(DisplayEntry::new(DisplayKind::Assistant, welcome));
        }
        let initial = Checkpoint {
            context_len: context.len(),
            display_len: display.len(),
        };
        Self {
            context,
            display,
            initial,
        }
    }

    pub fn context(&self) -> &[Message] {
        &self.context
    }

    pub fn display(&self) -> &[DisplayEntry] {
        &self.display
    }

    pub fn push_user(&mut self, text: &str) {
        self.context.push(Message::user(text));
        self.display.push(DisplayEntry::new(DisplayKind::User, text));
    }

    /// Records a plain assistant reply in both logs.
    pub fn push_reply(&mut self, text: &str) {
        self.context.push(Message::assistant(text));
        self.display
            .push(DisplayEntry::new(DisplayKind::Assistant, text));
    }

    /// Records the assistant's function-call turn. With `show`, the
    /// transcript gets the rendered call; otherwise only the text the model
    /// wrote before the call, if any.
    pub fn push_function_call(&mut self, content: &str, call: FunctionCall, show: bool, transcript: &str) {
        self.context
            .push(Message::assistant_function_call(content, call));
        if show {
            self.display
                .push(DisplayEntry::new(DisplayKind::FunctionCall, transcript));
        } else if !content.is_empty() {
            self.display
                .push(DisplayEntry::new(DisplayKind::Assistant, content));
        }
    }

    /// Records a lookup result for the model, and in the transcript when `show` is set.
    pub fn push_function_result(&mut self, name: &str, result: &str, show: bool) {
        self.context.push(Message::function_result(name, result));
        if show {
            self.display
                .push(DisplayEntry::new(DisplayKind::FunctionResult, result));
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            context_len: self.context.len(),
            display_len: self.display.len(),
        }
    }

    /// Drops everything appended after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.context.truncate(checkpoint.context_len);
        self.display.truncate(checkpoint.display_len);
    }

    /// Forgets every turn, keeping the system prompt and welcome message.
    pub fn clear(&mut self) {
        self.rollback(self.initial);
    }

    /// Number of user turns so far.
    pub fn user_turns(&self) -> usize {
        self.context.iter().filter(|m| m.role == Role::User).count()
    }
}

/// Appends the current local date to a system prompt, so relative dates in
/// questions ("this weekend") can be resolved by the model.
pub fn dated_system_prompt(prompt: &str) -> String {
    format!(
        "{}\n\nCurrent date: {}",
        prompt,
        chrono::Local::now().format("%Y-%m-%d")
    )
}
