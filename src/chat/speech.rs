//! Text-to-speech through an external command.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("cannot start speech command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("speech I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("speech command `{program}` failed ({status})")]
    Failed { program: String, status: ExitStatus },
}

/// Something that can read text aloud.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, blocking until playback ends or `cancel` is set.
    ///
    /// Cancellation is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`SpeechError`] if playback cannot start or fails.
    fn speak(&self, text: &str, cancel: &AtomicBool) -> Result<(), SpeechError>;
}

/// Speaks by piping text to a command's standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line such as `espeak -s 160 --stdin`.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts.map(str::to_string).collect()))
    }

    /// `say` on macOS, `espeak --stdin` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say", Vec::new())
        } else {
            Self::new("espeak", vec!["--stdin".to_string()])
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn stop(child: &mut std::process::Child) {
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl SpeechSynthesizer for CommandSpeaker {
    fn speak(&self, text: &str, cancel: &AtomicBool) -> Result<(), SpeechError> {
        tracing::debug!(program = %self.program, chars = text.len(), "speaking");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(err) = stdin.write_all(text.as_bytes())
            && err.kind() != io::ErrorKind::BrokenPipe
        {
            Self::stop(&mut child);
            return Err(err.into());
        }

        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(program = %self.program, "speech cancelled");
                Self::stop(&mut child);
                return Ok(());
            }
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                return Err(SpeechError::Failed {
                    program: self.program.clone(),
                    status,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
