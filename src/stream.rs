//! Reassembly of a streamed model reply.
//!
//! The API streams a reply as ordered [`Delta`]s: content text, or pieces of
//! a function call (a name once, then argument text token by token). A
//! [`Reassembler`] consumes them for one model invocation, producing a display
//! frame after each fragment and a [`Reply`] when the stream ends.
//!
//! Argument text is not valid JSON until the stream is over, so nothing here
//! parses it.

use crate::constants::{CALL_DISPLAY_PREFIX, CURSOR, WORKING_PLACEHOLDER};
use crate::message::FunctionCall;

/// One incremental piece of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A content substring.
    Content(String),
    /// A function-call fragment. The name is present on the first fragment
    /// only; later fragments carry argument continuations.
    FunctionCall {
        name: Option<String>,
        arguments: Option<String>,
    },
}

#[cfg(test)]
impl Delta {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    pub fn call_name(name: impl Into<String>) -> Self {
        Self::FunctionCall {
            name: Some(name.into()),
            arguments: None,
        }
    }

    pub fn call_arguments(arguments: impl Into<String>) -> Self {
        Self::FunctionCall {
            name: None,
            arguments: Some(arguments.into()),
        }
    }
}

/// The finished reply of one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Concatenated content fragments. Kept even when a function call follows.
    pub content: String,
    pub function_call: Option<FunctionCall>,
    /// What the display shows once the stream has ended.
    pub transcript: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Text,
    Function,
}

/// Accumulates deltas for a single model invocation.
#[derive(Debug)]
pub struct Reassembler {
    show_calls: bool,
    branch: Branch,
    content: String,
    /// Everything drawn so far, minus the cursor.
    display: String,
    function_name: Option<String>,
    arguments: String,
}

impl Reassembler {
    pub fn new(show_calls: bool) -> Self {
        Self {
            show_calls,
            branch: Branch::Text,
            content: String::new(),
            display: String::new(),
            function_name: None,
            arguments: String::new(),
        }
    }

    /// Feeds one fragment and returns the frame to draw, if it changed.
    pub fn push(&mut self, delta: Delta) -> Option<String> {
        match delta {
            Delta::Content(text) => {
                if text.is_empty() {
                    return None;
                }
                self.content.push_str(&text);
                self.display.push_str(&text);
                match self.branch {
                    Branch::Text => Some(format!("{}{}", self.display, CURSOR)),
                    // Content after a call started only matters for the message.
                    Branch::Function => None,
                }
            }
            Delta::FunctionCall { name, arguments } => {
                if self.branch == Branch::Text {
                    self.branch = Branch::Function;
                    if self.show_calls {
                        self.display.push_str(CALL_DISPLAY_PREFIX);
                    }
                }
                if self.function_name.is_none() {
                    self.function_name = name.filter(|n| !n.is_empty());
                }
                let arguments = arguments.unwrap_or_default();
                self.arguments.push_str(&arguments);
                if self.show_calls {
                    self.display.push_str(&arguments);
                    Some(format!("{}`{}", self.display, CURSOR))
                } else {
                    Some(format!("{}{}", WORKING_PLACEHOLDER, CURSOR))
                }
            }
        }
    }

    /// Ends the stream and returns the assembled reply.
    pub fn finish(self) -> Reply {
        match self.branch {
            Branch::Text => Reply {
                transcript: self.display,
                content: self.content,
                function_call: None,
            },
            Branch::Function => {
                let transcript = if self.show_calls {
                    format!("{}`", self.display)
                } else {
                    WORKING_PLACEHOLDER.to_string()
                };
                Reply {
                    content: self.content,
                    function_call: Some(FunctionCall {
                        name: self.function_name.unwrap_or_default(),
                        arguments: self.arguments,
                    }),
                    transcript,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(show_calls: bool, deltas: Vec<Delta>) -> (Vec<String>, Reply) {
        let mut reassembler = Reassembler::new(show_calls);
        let frames = deltas
            .into_iter()
            .filter_map(|d| reassembler.push(d))
            .collect();
        (frames, reassembler.finish())
    }

    #[test]
    fn test_text_stream_concatenates() {
        let (frames, reply) = run(false, vec![Delta::content("Hello"), Delta::content(" world")]);
        assert_eq!(reply.content, "Hello world");
        assert_eq!(reply.transcript, "Hello world");
        assert!(reply.function_call.is_none());
        assert_eq!(frames, vec!["Hello▌".to_string(), "Hello world▌".to_string()]);
    }

    #[test]
    fn test_function_arguments_accumulate() {
        let (_, reply) = run(
            false,
            vec![
                Delta::FunctionCall {
                    name: Some("f".into()),
                    arguments: Some(String::new()),
                },
                Delta::call_arguments("{\"a\":"),
                Delta::call_arguments("1}"),
            ],
        );
        let call = reply.function_call.unwrap();
        assert_eq!(call.name, "f");
        assert_eq!(call.arguments, "{\"a\":1}");
        let parsed: serde_json::Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": 1}));
        assert_eq!(reply.transcript, WORKING_PLACEHOLDER);
    }

    #[test]
    fn test_name_captured_once() {
        let (_, reply) = run(
            false,
            vec![
                Delta::call_name("first"),
                Delta::FunctionCall {
                    name: Some("second".into()),
                    arguments: Some("{}".into()),
                },
            ],
        );
        assert_eq!(reply.function_call.unwrap().name, "first");
    }

    #[test]
    fn test_replies_compare_whole() {
        let (_, first) = run(false, vec![Delta::call_name("f"), Delta::call_arguments("{}")]);
        let (_, second) = run(false, vec![Delta::call_name("f"), Delta::call_arguments("{}")]);
        assert_eq!(first, second);
        assert_eq!(
            first,
            Reply {
                content: String::new(),
                function_call: Some(FunctionCall {
                    name: "f".into(),
                    arguments: "{}".into(),
                }),
                transcript: WORKING_PLACEHOLDER.to_string(),
            }
        );
    }

    #[test]
    fn test_leading_content_kept_with_call() {
        let (_, reply) = run(
            false,
            vec![
                Delta::content("Let me check. "),
                Delta::call_name("f"),
                Delta::call_arguments("{}"),
            ],
        );
        assert_eq!(reply.content, "Let me check. ");
        assert_eq!(reply.function_call.unwrap().arguments, "{}");
    }

    #[test]
    fn test_hidden_calls_draw_placeholder() {
        let (frames, _) = run(false, vec![Delta::call_name("f"), Delta::call_arguments("{}")]);
        assert!(frames.iter().all(|f| f == "Just a sec 🔍▌"));
    }

    #[test]
    fn test_shown_calls_draw_arguments() {
        let (frames, reply) = run(
            true,
            vec![
                Delta::content("Checking"),
                Delta::call_name("f"),
                Delta::call_arguments("{\"q\":"),
                Delta::call_arguments("1}"),
            ],
        );
        assert_eq!(frames[0], "Checking▌");
        assert_eq!(frames.last().unwrap(), "Checking\n\n`Query: {\"q\":1}`▌");
        assert_eq!(reply.transcript, "Checking\n\n`Query: {\"q\":1}`");
        assert_eq!(reply.content, "Checking");
    }

    #[test]
    fn test_empty_content_is_ignored() {
        let (frames, reply) = run(false, vec![Delta::content(""), Delta::content("ok")]);
        assert_eq!(frames.len(), 1);
        assert_eq!(reply.content, "ok");
    }
}
