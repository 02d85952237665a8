//! AI reading companion.
//!
//! This module handles:
//! - Building prompts from the reader's position ([`prompt`])
//! - Talking to a completion backend ([`provider`])
//! - Reading text aloud ([`speech`])
//! - Running one cancellable background request at a time ([`request`])
//! - The append-only conversation history

pub mod prompt;
pub mod provider;
pub mod request;
pub mod speech;

use chrono::{DateTime, Local};

pub use provider::{
    CompletionProvider, CompletionRequest, FragmentStream, OpenAiProvider, ProviderError,
};
pub use request::{
    Backends, BufferSnapshot, FragmentBuffer, PendingRequest, Phase, RequestKind, RequestSpec,
    read_aloud, send_context,
};
pub use speech::{CommandSpeaker, SpeechError, SpeechSynthesizer};

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Role name used on the wire by chat-completion APIs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in the conversation. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    role: ChatRole,
    content: String,
    timestamp: DateTime<Local>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    pub const fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// Append-only conversation log for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.turns.push(ChatTurn::new(role, content));
    }

    /// Record a finished exchange.
    pub fn push_exchange(&mut self, prompt: impl Into<String>, answer: impl Into<String>) {
        self.push(ChatRole::User, prompt);
        self.push(ChatRole::Assistant, answer);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The last `exchanges` prompt/answer pairs, oldest first.
    pub fn recent_exchanges(&self, exchanges: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(exchanges.saturating_mul(2));
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
