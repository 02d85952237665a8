//! Lectern - A terminal e-book reader with an AI reading companion.
//!
//! # Usage
//!
//! ```bash
//! lectern moby-dick.md
//! lectern --model llama3 --api-base http://localhost:11434/v1 book.json
//! lectern --no-speech --timeout 30 --save book.txt
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;

use lectern::app::App;
use lectern::book::load_book;
use lectern::chat::prompt::SYSTEM_PROMPT;
use lectern::chat::{Backends, CommandSpeaker, OpenAiProvider, SpeechSynthesizer};
use lectern::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};

/// A terminal e-book reader with an AI reading companion
#[derive(Parser, Debug)]
#[command(name = "lectern", version, about, long_about = None)]
struct Cli {
    /// Book to read (.txt, .md, or .json)
    #[arg(value_name = "BOOK")]
    book: PathBuf,

    /// Completion model name [default: gpt-4o-mini]
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API [default: https://api.openai.com/v1]
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Environment variable holding the API key [default: OPENAI_API_KEY]
    #[arg(long, value_name = "VAR")]
    api_key_env: Option<String>,

    /// Speech command that reads text from stdin
    #[arg(long, value_name = "COMMAND")]
    speech_command: Option<String>,

    /// Disable read-aloud and the spoken reading guide
    #[arg(long)]
    no_speech: bool,

    /// Seconds without output before an AI request is abandoned [default: 60]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write debug logs to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

/// The TUI owns the terminal, so logs go to stderr only at `warn` unless a
/// file is given.
fn init_logging(debug_log: Option<&Path>) -> Result<()> {
    match debug_log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create debug log {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::DEBUG.into()),
                )
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::WARN.into()),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn build_backends(flags: &ConfigFlags) -> Backends {
    let api_key = std::env::var(flags.api_key_env())
        .ok()
        .filter(|key| !key.trim().is_empty());
    if api_key.is_none() {
        tracing::warn!(var = flags.api_key_env(), "no API key set; requests are unauthenticated");
    }
    let provider = OpenAiProvider::new(
        flags.api_base(),
        flags.model(),
        api_key,
        flags.request_timeout(),
    );

    let speaker: Option<Arc<dyn SpeechSynthesizer>> = if flags.no_speech {
        None
    } else {
        let speaker = flags
            .speech_command
            .as_deref()
            .and_then(CommandSpeaker::from_command_line)
            .unwrap_or_else(CommandSpeaker::platform_default);
        tracing::debug!(program = speaker.program(), "speech enabled");
        Some(Arc::new(speaker))
    };

    Backends {
        provider: Arc::new(provider),
        speaker,
        system_prompt: SYSTEM_PROMPT.to_string(),
    }
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.debug_log.as_deref())?;

    let book = load_book(&cli.book)
        .with_context(|| format!("Failed to open {}", cli.book.display()))?;
    tracing::info!(
        path = %cli.book.display(),
        chapters = book.len(),
        model = effective.model(),
        "book loaded"
    );

    let mut app = App::new(Arc::new(book), build_backends(&effective))
        .with_request_timeout(effective.request_timeout());

    app.run().context("Application error")
}
