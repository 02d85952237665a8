//! Completion backends.
//!
//! [`CompletionProvider`] is the seam between the reader and a language
//! model. [`OpenAiProvider`] speaks the OpenAI-compatible
//! `/chat/completions` API with server-sent-event streaming, which also
//! covers local servers such as Ollama or llama.cpp.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ChatTurn;

/// Failures talking to a completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed (HTTP {0}); check the API key")]
    Auth(u16),
    #[error("rate limited by the provider; try again shortly")]
    RateLimited,
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider reported an error: {0}")]
    Api(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no response from the provider within {0} seconds")]
    Timeout(u64),
}

impl From<ureq::Error> for ProviderError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code @ (401 | 403)) => Self::Auth(code),
            ureq::Error::StatusCode(429) => Self::RateLimited,
            ureq::Error::StatusCode(code) => Self::Status(code),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Lazily produced response fragments. Finite and not restartable.
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, ProviderError>> + Send>;

/// Everything a provider needs for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub history: Vec<ChatTurn>,
    pub prompt: String,
}

/// A conversational text-generation backend.
pub trait CompletionProvider: Send + Sync {
    /// Start an exchange and return its fragments in arrival order.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the exchange cannot be started. Errors
    /// after the first fragment are reported through the stream.
    fn complete(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError>;
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
}

/// OpenAI-compatible streaming chat client.
pub struct OpenAiProvider {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    /// Create a client for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// `response_timeout` bounds connecting and waiting for response headers;
    /// the body is streamed without a global deadline.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        response_timeout: Duration,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(response_timeout))
            .timeout_recv_response(Some(response_timeout))
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn wire_request<'a>(model: &'a str, request: &'a CompletionRequest) -> WireRequest<'a> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(system) = request.system.as_deref() {
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
    }
    messages.extend(request.history.iter().map(|turn| WireMessage {
        role: turn.role().as_str(),
        content: turn.content(),
    }));
    messages.push(WireMessage {
        role: "user",
        content: &request.prompt,
    });
    WireRequest {
        model,
        messages,
        stream: true,
    }
}

impl CompletionProvider for OpenAiProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
        let url = self.endpoint();
        tracing::debug!(
            url = %url,
            model = %self.model,
            history = request.history.len(),
            "starting completion"
        );
        let mut call = self.agent.post(&url).header("Accept", "text/event-stream");
        if let Some(key) = self.api_key.as_deref() {
            call = call.header("Authorization", format!("Bearer {key}"));
        }
        let response = call.send_json(wire_request(&self.model, request))?;
        let reader = BufReader::new(response.into_body().into_reader());
        Ok(Box::new(SseFragments::new(reader)))
    }
}

/// Iterator over the text deltas of a server-sent-event chat stream.
///
/// Ends at `data: [DONE]` or end of input. Comment, `event:` and blank lines
/// are skipped.
pub struct SseFragments<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> SseFragments<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    fn fail(&mut self, err: ProviderError) -> Option<Result<String, ProviderError>> {
        self.finished = true;
        Some(Err(err))
    }
}

fn parse_delta(data: &str) -> Result<Option<String>, ProviderError> {
    let chunk: StreamChunk =
        serde_json::from_str(data).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(ProviderError::Api(error.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}

impl<R: BufRead> Iterator for SseFragments<R> {
    type Item = Result<String, ProviderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => return self.fail(ProviderError::Network(err.to_string())),
            }

            let Some(data) = line.trim_end().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();
            if data == "[DONE]" {
                self.finished = true;
                return None;
            }
            match parse_delta(data) {
                Ok(Some(text)) if !text.is_empty() => return Some(Ok(text)),
                Ok(_) => {}
                Err(err) => return self.fail(err),
            }
        }
    }
}
