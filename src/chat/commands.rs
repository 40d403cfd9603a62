//! Slash command handlers for the chat REPL.
//!
//! Dispatches `/history`, `/context`, `/clear` and `/help`. Returns a
//! [`CommandAction`] so the REPL loop can decide how to proceed.

use colored::Colorize;

use crate::conversation::Conversation;
use crate::format;

/// Action returned by slash command handling.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    /// Command was handled successfully; continue the REPL loop.
    Continue,
    /// Unknown command was entered.
    Unknown(String),
}

pub(crate) fn handle_slash_command(command: &str, conversation: &mut Conversation) -> CommandAction {
    match command {
        "/history" => {
            for entry in conversation.display() {
                println!("{}", format::format_entry(entry));
                println!();
            }
            CommandAction::Continue
        }
        "/context" => {
            for msg in conversation.context() {
                println!("{}", format::format_message(msg));
                println!();
            }
            CommandAction::Continue
        }
        "/clear" => {
            conversation.clear();
            println!("{}", "History cleared.".dimmed());
            CommandAction::Continue
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - show the conversation", "/history".cyan());
            println!(
                "  {} - show what the model sees, function calls included",
                "/context".cyan()
            );
            println!("  {} - clear conversation", "/clear".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            CommandAction::Continue
        }
        _ => CommandAction::Unknown(command.to_string()),
    }
}
