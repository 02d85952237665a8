//! Background exchanges with the completion provider.
//!
//! A request runs on its own worker thread. The worker appends fragments to a
//! shared [`FragmentBuffer`] and sets its terminal [`Phase`]; the event loop
//! only reads snapshots. Cancellation is a flag the worker checks between
//! fragments and while speech is playing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::ChatTurn;
use super::provider::{CompletionProvider, CompletionRequest};
use super::speech::SpeechSynthesizer;
use crate::navigation::Cursor;

/// Lifecycle of a background request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Streaming,
    Speaking,
    Done,
    Failed(String),
}

impl Phase {
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

#[derive(Debug)]
struct BufferState {
    text: String,
    phase: Phase,
    revision: u64,
    last_activity: Instant,
}

/// Append-only text shared between a worker and the event loop.
#[derive(Debug)]
pub struct FragmentBuffer {
    state: Mutex<BufferState>,
}

/// Point-in-time copy of a [`FragmentBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    pub text: String,
    pub phase: Phase,
    /// Bumped on every change; lets the loop skip redundant renders.
    pub revision: u64,
    /// Time since the last fragment or phase change.
    pub idle: Duration,
}

impl FragmentBuffer {
    pub fn new(phase: Phase) -> Self {
        Self {
            state: Mutex::new(BufferState {
                text: String::new(),
                phase,
                revision: 0,
                last_activity: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, fragment: &str) {
        let mut state = self.lock();
        state.text.push_str(fragment);
        state.revision += 1;
        state.last_activity = Instant::now();
    }

    /// Move to `phase`. A settled buffer keeps its phase.
    pub fn set_phase(&self, phase: Phase) {
        let mut state = self.lock();
        if state.phase.is_settled() {
            return;
        }
        state.phase = phase;
        state.revision += 1;
        state.last_activity = Instant::now();
    }

    pub fn fail(&self, message: impl ToString) {
        self.set_phase(Phase::Failed(message.to_string()));
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        let state = self.lock();
        BufferSnapshot {
            text: state.text.clone(),
            phase: state.phase.clone(),
            revision: state.revision,
            idle: state.last_activity.elapsed(),
        }
    }
}

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Explain the visible page.
    Ask,
    /// Summarize the chapter up to the visible page.
    Summary,
    /// Spoken reading guide for the current location.
    Compass,
    /// Speak the visible page.
    ReadAloud,
}

impl RequestKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Ask => "Ask",
            Self::Summary => "Summary",
            Self::Compass => "Reading Guide",
            Self::ReadAloud => "Read Aloud",
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Summary => "summary",
            Self::Compass => "compass",
            Self::ReadAloud => "read-aloud",
        }
    }

    /// Whether the answer is shown in an overlay.
    pub const fn uses_overlay(self) -> bool {
        !matches!(self, Self::ReadAloud)
    }
}

/// A request to start, built by `update` and launched by the side-effect pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub kind: RequestKind,
    /// Reading position when the request was made.
    pub origin: Cursor,
    /// Prompt text, or the text to speak for [`RequestKind::ReadAloud`].
    pub payload: String,
}

/// The single in-flight background request.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub spec: RequestSpec,
    cancel: Arc<AtomicBool>,
    buffer: Arc<FragmentBuffer>,
    started_at: Instant,
}

impl PartialEq for PendingRequest {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl PendingRequest {
    pub fn new(spec: RequestSpec, phase: Phase) -> Self {
        Self {
            spec,
            cancel: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(FragmentBuffer::new(phase)),
            started_at: Instant::now(),
        }
    }

    pub const fn kind(&self) -> RequestKind {
        self.spec.kind
    }

    /// Ask the worker to stop. Partial output is abandoned.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        tracing::debug!(
            kind = self.kind().slug(),
            elapsed_ms = self.started_at.elapsed().as_millis(),
            "request cancelled"
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        self.buffer.snapshot()
    }

    pub fn buffer(&self) -> &Arc<FragmentBuffer> {
        &self.buffer
    }
}

/// External services available to requests.
#[derive(Clone)]
pub struct Backends {
    pub provider: Arc<dyn CompletionProvider>,
    pub speaker: Option<Arc<dyn SpeechSynthesizer>>,
    pub system_prompt: String,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("speech", &self.speaker.is_some())
            .field("system_prompt", &self.system_prompt)
            .finish_non_exhaustive()
    }
}

/// Start a chat exchange in the background and return immediately.
///
/// `history` is sent as prior conversation. Compass requests are spoken once
/// the text is complete, when a speaker is configured.
pub fn send_context(
    backends: &Backends,
    spec: RequestSpec,
    history: &[ChatTurn],
) -> PendingRequest {
    let request = CompletionRequest {
        system: Some(backends.system_prompt.clone()),
        history: history.to_vec(),
        prompt: spec.payload.clone(),
    };
    let speaker = match spec.kind {
        RequestKind::Compass => backends.speaker.clone(),
        _ => None,
    };
    let pending = PendingRequest::new(spec, Phase::Streaming);
    tracing::info!(
        kind = pending.kind().slug(),
        prompt_chars = request.prompt.len(),
        history = request.history.len(),
        "starting request"
    );

    let provider = Arc::clone(&backends.provider);
    let cancel = Arc::clone(&pending.cancel);
    let buffer = Arc::clone(&pending.buffer);
    spawn_worker(&pending, move || {
        run_exchange(provider.as_ref(), speaker.as_deref(), &request, &cancel, &buffer);
    });
    pending
}

/// Speak `spec.payload` in the background.
///
/// Returns `None` when no speaker is configured.
pub fn read_aloud(backends: &Backends, spec: RequestSpec) -> Option<PendingRequest> {
    let speaker = backends.speaker.clone()?;
    let text = spec.payload.clone();
    let pending = PendingRequest::new(spec, Phase::Speaking);
    tracing::info!(chars = text.len(), "starting read-aloud");

    let cancel = Arc::clone(&pending.cancel);
    let buffer = Arc::clone(&pending.buffer);
    spawn_worker(&pending, move || {
        speak_then_finish(speaker.as_ref(), &text, &cancel, &buffer);
    });
    Some(pending)
}

fn spawn_worker(pending: &PendingRequest, work: impl FnOnce() + Send + 'static) {
    let spawned = thread::Builder::new()
        .name(format!("lectern-{}", pending.kind().slug()))
        .spawn(work);
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to spawn request worker");
        pending.buffer.fail(format!("cannot start background request: {err}"));
    }
}

fn run_exchange(
    provider: &dyn CompletionProvider,
    speaker: Option<&dyn SpeechSynthesizer>,
    request: &CompletionRequest,
    cancel: &AtomicBool,
    buffer: &FragmentBuffer,
) {
    let stream = match provider.complete(request) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "completion request failed");
            buffer.fail(err);
            return;
        }
    };

    for item in stream {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        match item {
            Ok(fragment) => buffer.append(&fragment),
            Err(err) => {
                tracing::warn!(error = %err, "completion stream failed");
                buffer.fail(err);
                return;
            }
        }
    }
    if cancel.load(Ordering::Relaxed) {
        return;
    }

    match speaker {
        Some(speaker) => {
            buffer.set_phase(Phase::Speaking);
            let text = buffer.snapshot().text;
            speak_then_finish(speaker, &text, cancel, buffer);
        }
        None => {
            tracing::debug!(chars = buffer.snapshot().text.len(), "request finished");
            buffer.set_phase(Phase::Done);
        }
    }
}

fn speak_then_finish(
    speaker: &dyn SpeechSynthesizer,
    text: &str,
    cancel: &AtomicBool,
    buffer: &FragmentBuffer,
) {
    match speaker.speak(text, cancel) {
        Ok(()) if cancel.load(Ordering::Relaxed) => {}
        Ok(()) => buffer.set_phase(Phase::Done),
        Err(err) => {
            tracing::warn!(error = %err, "speech failed");
            buffer.fail(err);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc::{self, Receiver, Sender};

    use crate::chat::provider::{
        CompletionProvider, CompletionRequest, FragmentStream, ProviderError,
    };
    use crate::chat::speech::{SpeechError, SpeechSynthesizer};

    /// Replays a fixed list of fragments and records every request.
    #[derive(Default)]
    pub struct ScriptedProvider {
        pub fragments: Vec<Result<String, ProviderError>>,
        pub start_error: Option<ProviderError>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub fn replying(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| Ok((*f).to_string())).collect(),
                ..Self::default()
            }
        }
    }

    impl CompletionProvider for ScriptedProvider {
        fn complete(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(err) = self.start_error.clone() {
                return Err(err);
            }
            Ok(Box::new(self.fragments.clone().into_iter()))
        }
    }

    /// Yields fragments only when the test sends them; ends when the sender drops.
    pub struct GatedProvider {
        rx: Mutex<Option<Receiver<Result<String, ProviderError>>>>,
    }

    impl GatedProvider {
        pub fn new() -> (Self, Sender<Result<String, ProviderError>>) {
            let (tx, rx) = mpsc::channel();
            (
                Self {
                    rx: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl CompletionProvider for GatedProvider {
        fn complete(&self, _request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
            let rx = self
                .rx
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| ProviderError::Network("already used".to_string()))?;
            Ok(Box::new(rx.into_iter()))
        }
    }

    /// Records spoken text; optionally fails.
    #[derive(Default)]
    pub struct RecordingSpeaker {
        pub spoken: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl SpeechSynthesizer for RecordingSpeaker {
        fn speak(&self, text: &str, _cancel: &AtomicBool) -> Result<(), SpeechError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(SpeechError::Io(std::io::Error::other("no audio device")));
            }
            Ok(())
        }
    }
}
