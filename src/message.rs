//! Message types for the model-context log.
//!
//! [`Message`] mirrors the chat-completions wire shape so the log can be sent
//! to the API as-is. Function-call bookkeeping rides on the same type: an
//! assistant message may carry a [`FunctionCall`], and lookup output comes
//! back as a [`Role::Function`] message naming the action that produced it.

use serde::{Deserialize, Serialize};

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the action to invoke.
    pub name: String,
    /// Raw JSON argument text, exactly as streamed by the model.
    pub arguments: String,
}

/// A single message in the model-context log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Name of the action whose result this is (function messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Assistant turn that requested a function call. `content` holds any
    /// text the model streamed before switching to the call.
    pub fn assistant_function_call(content: impl Into<String>, call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Creates a function result message to feed back to the model.
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Role::Function, content)
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Function => write!(f, "function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_message_omits_optional_fields() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_function_call_message_wire_shape() {
        let msg = Message::assistant_function_call(
            "",
            FunctionCall {
                name: "f".into(),
                arguments: "{\"a\":1}".into(),
            },
        );
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "content": "",
                "function_call": {"name": "f", "arguments": "{\"a\":1}"}
            })
        );
    }

    #[test]
    fn test_function_result_carries_name() {
        let value = serde_json::to_value(Message::function_result("f", "ok")).unwrap();
        assert_eq!(
            value,
            json!({"role": "function", "content": "ok", "name": "f"})
        );
    }
}
