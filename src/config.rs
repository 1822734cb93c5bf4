use rustyline::EditMode;
use std::path::PathBuf;

pub const HISTORY_ENV: &str = "LISPY_HISTORY";
pub const EDIT_MODE_ENV: &str = "LISPY_EDIT_MODE";

/// Settings for the interactive prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplConfig {
    pub prompt: String,
    pub history_file: PathBuf,
    pub edit_mode: EditMode,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "lispy> ".to_string(),
            history_file: PathBuf::from("lispy_history.txt"),
            edit_mode: EditMode::Emacs,
        }
    }
}

impl ReplConfig {
    /// Defaults overridden by `LISPY_HISTORY` and `LISPY_EDIT_MODE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ReplConfig::default();
        if let Some(path) = lookup(HISTORY_ENV).filter(|p| !p.is_empty()) {
            config.history_file = PathBuf::from(path);
        }
        if let Some(mode) = lookup(EDIT_MODE_ENV) {
            match parse_edit_mode(&mode) {
                Some(edit_mode) => config.edit_mode = edit_mode,
                None => tracing::warn!(%mode, "unknown edit mode, keeping default"),
            }
        }
        config
    }

    pub fn editor_config(&self) -> rustyline::Config {
        rustyline::Config::builder()
            .edit_mode(self.edit_mode)
            .auto_add_history(false)
            .build()
    }
}

fn parse_edit_mode(mode: &str) -> Option<EditMode> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "vi" => Some(EditMode::Vi),
        "emacs" => Some(EditMode::Emacs),
        _ => None,
    }
}
