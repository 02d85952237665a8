use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Flags that can be saved as defaults.
///
/// Merged global < local < command line: booleans are OR-ed, options are
/// taken from the later source when set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key_env: Option<String>,
    pub speech_command: Option<String>,
    pub no_speech: bool,
    pub timeout_secs: Option<u64>,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            model: other.model.clone().or_else(|| self.model.clone()),
            api_base: other.api_base.clone().or_else(|| self.api_base.clone()),
            api_key_env: other
                .api_key_env
                .clone()
                .or_else(|| self.api_key_env.clone()),
            speech_command: other
                .speech_command
                .clone()
                .or_else(|| self.speech_command.clone()),
            no_speech: self.no_speech || other.no_speech,
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Stall timeout for AI requests. Zero is treated as one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("lectern").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("lectern")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("lectern").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("lectern")
                .join("config");
        }
    }

    PathBuf::from(".lecternrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".lecternrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_quoted)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# lectern defaults (saved with --save)".to_string());
    if let Some(model) = &flags.model {
        lines.push(format!("--model {model}"));
    }
    if let Some(base) = &flags.api_base {
        lines.push(format!("--api-base {base}"));
    }
    if let Some(env) = &flags.api_key_env {
        lines.push(format!("--api-key-env {env}"));
    }
    if let Some(command) = &flags.speech_command {
        lines.push(format!("--speech-command \"{command}\""));
    }
    if flags.no_speech {
        lines.push("--no-speech".to_string());
    }
    if let Some(secs) = flags.timeout_secs {
        lines.push(format!("--timeout {secs}"));
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from command-line style tokens. Unknown tokens,
/// including the book path, are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token, None),
        };
        if name == "--no-speech" {
            flags.no_speech = true;
            i += 1;
            continue;
        }
        if !matches!(
            name,
            "--model"
                | "--api-base"
                | "--api-key-env"
                | "--speech-command"
                | "--timeout"
                | "--debug-log"
        ) {
            i += 1;
            continue;
        }
        let value = match inline {
            Some(value) => value,
            None => {
                i += 1;
                match tokens.get(i) {
                    Some(next) => next.clone(),
                    None => break,
                }
            }
        };
        match name {
            "--model" => flags.model = Some(value),
            "--api-base" => flags.api_base = Some(value),
            "--api-key-env" => flags.api_key_env = Some(value),
            "--speech-command" => flags.speech_command = Some(value),
            "--timeout" => flags.timeout_secs = value.parse().ok().or(flags.timeout_secs),
            _ => flags.debug_log = Some(PathBuf::from(value)),
        }
        i += 1;
    }
    flags
}

/// Split a config line at whitespace, keeping double-quoted runs together.
fn split_quoted(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&args(&[
            "lectern",
            "--model",
            "llama3",
            "--api-base=http://localhost:11434/v1",
            "--speech-command",
            "espeak -s 160 --stdin",
            "--no-speech",
            "--timeout",
            "30",
            "--debug-log=lectern.log",
            "book.md",
        ]));
        assert_eq!(flags.model.as_deref(), Some("llama3"));
        assert_eq!(flags.api_base.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(flags.speech_command.as_deref(), Some("espeak -s 160 --stdin"));
        assert!(flags.no_speech);
        assert_eq!(flags.timeout_secs, Some(30));
        assert_eq!(flags.debug_log, Some(PathBuf::from("lectern.log")));
        assert_eq!(flags.api_key_env, None);
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_timeout_and_missing_value() {
        let flags = parse_flag_tokens(&args(&["--timeout", "soon", "--model"]));
        assert_eq!(flags.timeout_secs, None);
        assert_eq!(flags.model, None);
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let flags = ConfigFlags::default();
        assert_eq!(flags.model(), DEFAULT_MODEL);
        assert_eq!(flags.api_base(), DEFAULT_API_BASE);
        assert_eq!(flags.api_key_env(), DEFAULT_API_KEY_ENV);
        assert_eq!(flags.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let flags = ConfigFlags {
            timeout_secs: Some(0),
            ..ConfigFlags::default()
        };
        assert_eq!(flags.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_speech: true,
            model: Some("gpt-4o".to_string()),
            timeout_secs: Some(90),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            model: Some("llama3".to_string()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_speech);
        assert_eq!(merged.model(), "llama3");
        assert_eq!(merged.timeout_secs, Some(90));
    }

    #[test]
    fn test_split_quoted_keeps_quoted_runs() {
        assert_eq!(
            split_quoted(r#"--speech-command "say -v Alex"  --no-speech"#),
            vec!["--speech-command", "say -v Alex", "--no-speech"]
        );
        assert_eq!(split_quoted(r#"--model """#), vec!["--model", ""]);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            model: Some("llama3".to_string()),
            api_base: Some("http://localhost:8080/v1".to_string()),
            api_key_env: Some("LOCAL_KEY".to_string()),
            speech_command: Some("espeak -s 160 --stdin".to_string()),
            no_speech: true,
            timeout_secs: Some(15),
            debug_log: Some(PathBuf::from("lectern.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
