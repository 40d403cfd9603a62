//! Terminal formatting for transcript replays (`/history`, `/context`).

use colored::Colorize;

use crate::constants::APP_NAME;
use crate::conversation::{DisplayEntry, DisplayKind};
use crate::message::{Message, Role};

/// Format a transcript entry with a role label and colors.
pub fn format_entry(entry: &DisplayEntry) -> String {
    let label = match entry.kind {
        DisplayKind::User => "you:".green().bold().to_string(),
        DisplayKind::Assistant => format!("{}:", APP_NAME).cyan().bold().to_string(),
        DisplayKind::FunctionCall => format!("{}:", APP_NAME).cyan().to_string(),
        DisplayKind::FunctionResult => "query result:".yellow().to_string(),
    };
    let body = match entry.kind {
        DisplayKind::User => entry.content.clone(),
        DisplayKind::Assistant | DisplayKind::FunctionCall => {
            render_markdown_lite(entry.content.trim_start_matches('\n'))
        }
        DisplayKind::FunctionResult => entry.content.dimmed().to_string(),
    };
    format!("{}\n{}", label, body)
}

/// Format a model-context message, including function-call bookkeeping.
pub fn format_message(msg: &Message) -> String {
    let label = match msg.role {
        Role::System => "system:".dimmed().to_string(),
        Role::User => "user:".green().bold().to_string(),
        Role::Assistant => "assistant:".cyan().bold().to_string(),
        Role::Function => match msg.name {
            Some(ref name) => format!("function ({}):", name).yellow().to_string(),
            None => "function:".yellow().to_string(),
        },
    };

    let mut body = match msg.role {
        Role::System | Role::Function => msg.text().dimmed().to_string(),
        _ => msg.text().to_string(),
    };
    if let Some(ref call) = msg.function_call {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&format!("→ {}({})", call.name.bold(), call.arguments));
    }
    format!("{}\n{}", label, body)
}

/// Minimal markdown renderer for terminal output: **bold**, `inline code`
/// and fenced code blocks. Anything else passes through.
pub fn render_markdown_lite(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if let Some(lang) = line.strip_prefix("```") {
            in_code_block = !in_code_block;
            if in_code_block && !lang.is_empty() {
                lines.push(format!("  {}", lang.dimmed()));
            } else if !in_code_block {
                lines.push(String::new());
            }
            continue;
        }

        if in_code_block {
            lines.push(format!("  {}", line.dimmed()));
        } else {
            lines.push(render_inline(line));
        }
    }

    lines.join("\n")
}

/// Handle **bold** and `inline code` within a single line. Unclosed markers
/// are left as they are.
fn render_inline(line: &str) -> String {
    let mut out = String::new();
    let mut rest = line;

    loop {
        let bold = rest.find("**");
        let code = rest.find('`');
        let (start, marker) = match (bold, code) {
            (Some(b), Some(c)) if c < b => (c, "`"),
            (Some(b), _) => (b, "**"),
            (None, Some(c)) => (c, "`"),
            (None, None) => break,
        };

        let inner_start = start + marker.len();
        let Some(len) = rest[inner_start..].find(marker) else {
            break;
        };
        let inner = &rest[inner_start..inner_start + len];
        out.push_str(&rest[..start]);
        if marker == "**" {
            out.push_str(&inner.bold().to_string());
        } else {
            out.push_str(&inner.dimmed().to_string());
        }
        rest = &rest[inner_start + len + marker.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_lite_plain_passthrough() {
        colored::control::set_override(false);
        assert_eq!(render_markdown_lite("no markup here"), "no markup here");
        assert_eq!(render_inline("a **b** c `d` e"), "a b c d e");
        assert_eq!(render_inline("unclosed **bold"), "unclosed **bold");
        assert_eq!(
            render_markdown_lite("```json\n{}\n```\nafter"),
            "  json\n  {}\n\nafter"
        );
    }

    #[test]
    fn test_format_message_shows_function_call() {
        colored::control::set_override(false);
        let msg = Message::assistant_function_call(
            "",
            crate::message::FunctionCall {
                name: "query_dazn_event_schedule".into(),
                arguments: "{\"pandas_dataframe_query\":\"Sport == 'Boxing'\"}".into(),
            },
        );
        let text = format_message(&msg);
        assert!(text.starts_with("assistant:\n→ query_dazn_event_schedule("));
    }
}
