//! Model API boundary for ringside.
//!
//! A [`ChatModel`] takes the full context log plus the callable action specs
//! and returns the reply as an ordered stream of [`Delta`]s. The only real
//! implementation is [`OpenAiCompatible`]; tests script their own.

mod client;
mod kind;
mod resolve;

use anyhow::Result;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::actions::ActionSpec;
use crate::message::Message;
use crate::stream::Delta;

pub use client::OpenAiCompatible;
#[allow(unused_imports)]
pub use kind::{default_model_for, ProviderKind};
pub use resolve::{resolve_model, ModelSelection};

/// Deltas of one streamed reply, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<Delta>>;

/// One chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "no_functions")]
    pub functions: &'a [ActionSpec],
    pub temperature: f32,
}

#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `request` and returns the reply's delta stream.
    async fn stream_chat(&self, request: ChatRequest<'_>) -> Result<DeltaStream>;
}

fn no_functions(functions: &&[ActionSpec]) -> bool {
    functions.is_empty()
}
