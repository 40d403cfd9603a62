//! The conversation loop.
//!
//! [`agent_loop`] runs one user turn: call the model, and while it answers
//! with a function call, dispatch the call to the matching action, feed the
//! result back and call the model again. The number of dispatches per turn
//! is capped; past the cap the loop gives up with a fixed reply.

use anyhow::Result;
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actions::{run_action, ActionRegistry, ActionSpec};
use crate::constants::GIVE_UP_MESSAGE;
use crate::conversation::Conversation;
use crate::message::Message;
use crate::output::Renderer;
use crate::provider::{ChatModel, ChatRequest};
use crate::stream::{Reassembler, Reply};

/// Per-turn knobs, resolved from config and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSettings {
    pub model: String,
    pub temperature: f32,
    /// Render function calls and raw lookup results in the transcript.
    pub show_function_calls: bool,
    /// Function dispatches allowed before giving up.
    pub max_function_turns: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    /// The model asked for a function that was never offered to it.
    #[error("Function {0} is not defined in the function collection")]
    UnknownAction(String),
}

/// Runs one user turn against `conversation`, which must already end with
/// the user's message. Returns the final assistant reply.
///
/// Network and API failures propagate; the caller decides whether to roll
/// the conversation back. Action failures do not: their error text becomes
/// the function result.
pub async fn agent_loop(
    model: &dyn ChatModel,
    conversation: &mut Conversation,
    actions: &ActionRegistry,
    renderer: &mut dyn Renderer,
    settings: &TurnSettings,
) -> Result<String> {
    let specs = actions.specs();
    let mut dispatched = 0;

    loop {
        let reply = stream_reply(model, conversation.context(), &specs, renderer, settings).await?;
        let Reply {
            content,
            function_call,
            transcript,
        } = reply;

        let Some(call) = function_call else {
            conversation.push_reply(&content);
            return Ok(content);
        };

        if dispatched >= settings.max_function_turns {
            warn!(
                limit = settings.max_function_turns,
                function = %call.name,
                "function turn limit reached, giving up"
            );
            if !content.is_empty() {
                debug!(content = %content, "discarding text streamed before the refused call");
            }
            renderer.render_done(GIVE_UP_MESSAGE);
            conversation.push_reply(GIVE_UP_MESSAGE);
            return Ok(GIVE_UP_MESSAGE.to_string());
        }

        let name = call.name.clone();
        let arguments = call.arguments.clone();
        conversation.push_function_call(&content, call, settings.show_function_calls, &transcript);

        let action = actions
            .get(&name)
            .ok_or_else(|| AgentError::UnknownAction(name.clone()))?;
        let result = run_action(action.as_ref(), &arguments).await;
        dispatched += 1;
        info!(
            function = %name,
            turn = dispatched,
            result_len = result.value.len(),
            "function dispatched"
        );

        conversation.push_function_result(&name, &result.value, settings.show_function_calls);
        if settings.show_function_calls {
            renderer.render_function_result(&name, &result.value);
        }
    }
}

/// One model invocation: streams the reply through a fresh reassembler,
/// drawing a frame per fragment.
async fn stream_reply(
    model: &dyn ChatModel,
    context: &[Message],
    specs: &[ActionSpec],
    renderer: &mut dyn Renderer,
    settings: &TurnSettings,
) -> Result<Reply> {
    let request = ChatRequest {
        model: &settings.model,
        messages: context,
        functions: specs,
        temperature: settings.temperature,
    };
    let mut deltas = model.stream_chat(request).await?;

    let mut reassembler = Reassembler::new(settings.show_function_calls);
    while let Some(delta) = deltas.next().await {
        if let Some(frame) = reassembler.push(delta?) {
            renderer.render_frame(&frame);
        }
    }

    let reply = reassembler.finish();
    renderer.render_done(&reply.transcript);
    Ok(reply)
}
