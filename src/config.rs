//! Configuration for voicejot.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (VOICEJOT_NOTE_ROOT, OPENAI_API_KEY, VOICEJOT_HOME)
//! 2. Config file (`--config <path>` or `.voicejot/config.yaml`)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .voicejot/config.yaml
//! - Relative paths in the config file are resolved against the directory
//!   containing `.voicejot/`
//!
//! The resolved [`Config`] is built once at startup and passed explicitly to
//! everything that needs it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::openai::DEFAULT_BASE_URL;
use crate::adapters::tokens::{ChunkSettings, DEFAULT_CHUNK_CHARS, DEFAULT_TOKEN_THRESHOLD};
use crate::ingest::WatcherConfig;
use crate::note::DEFAULT_TASK_HEADER;

/// Default transcription language
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";

/// Raw config file schema (matches YAML structure).
///
/// The upper-case aliases accept config files written for the earlier
/// script (`NOTE_DIRECTORY`, `TASK_HEADER`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Vault root containing `Daily Notes/` and the recordings
    #[serde(default, alias = "NOTE_DIRECTORY")]
    pub note_root: Option<String>,

    /// Task section header line
    #[serde(default, alias = "TASK_HEADER")]
    pub task_header: Option<String>,

    /// Transcription language code
    #[serde(default, alias = "LANGUAGE")]
    pub language: Option<String>,

    /// Chat model identifier
    #[serde(default, alias = "GPT_MODEL")]
    pub model: Option<String>,

    #[serde(default, alias = "OPENAI_API_KEY")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Prompt token count above which prompts are chunked
    #[serde(default)]
    pub token_threshold: Option<usize>,

    /// Characters per chunk
    #[serde(default)]
    pub chunk_chars: Option<usize>,

    #[serde(default)]
    pub watch: WatchSection,

    /// Processing journal location
    #[serde(default)]
    pub journal: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Directory to watch (defaults to the note root)
    pub path: Option<String>,
    /// Recording file extension
    pub extension: Option<String>,
    /// Seconds a new file must stay unchanged before processing
    pub stability_delay_secs: Option<u64>,
    /// Watch subdirectories too
    pub recursive: Option<bool>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Vault root
    pub note_root: PathBuf,
    /// Task section header literal
    pub task_header: String,
    /// Transcription language code
    pub language: String,
    /// Chat model identifier
    pub model: String,
    /// API key (only needed for the OpenAI adapter)
    pub api_key: Option<String>,
    /// API root URL
    pub api_base_url: String,
    /// Prompt chunking limits
    pub chunking: ChunkSettings,
    /// Recording watcher settings
    pub watch: WatcherConfig,
    /// Processing journal (JSONL)
    pub journal_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Configuration with defaults for everything but the note root
    pub fn new(note_root: PathBuf, home: &Path) -> Self {
        Self {
            watch: WatcherConfig::for_directory(note_root.clone()),
            note_root,
            task_header: DEFAULT_TASK_HEADER.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            chunking: ChunkSettings::default(),
            journal_path: home.join("journal.jsonl"),
            config_file: None,
        }
    }

    /// Load configuration from all sources.
    ///
    /// `explicit` overrides config file discovery.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        let file = match config_file {
            Some(ref path) => Some((path.clone(), load_config_file(path)?)),
            None => None,
        };

        let home = default_home()?;
        resolve(file, &home, |key| std::env::var(key).ok())
    }

    /// API key, required by the OpenAI adapter
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context("Missing OpenAI API key. Set api_key in the config file or OPENAI_API_KEY env var")
    }
}

/// Engine state directory (~/.voicejot unless VOICEJOT_HOME is set)
fn default_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("VOICEJOT_HOME") {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".voicejot"))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".voicejot").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = expand_home(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Expand a leading `~/`
fn expand_home(path_str: &str) -> PathBuf {
    match (path_str.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path_str),
    }
}

/// Merge config file, environment and defaults
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    home: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let (config_path, raw) = match file {
        Some((path, raw)) => (Some(path), raw),
        None => (None, ConfigFile::default()),
    };

    // Base directory is the parent of .voicejot/ (or the config file's own
    // directory for an explicit path outside .voicejot/)
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| {
            if dir.file_name().is_some_and(|name| name == ".voicejot") {
                dir.parent().unwrap_or(dir)
            } else {
                dir
            }
        })
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let note_root = env("VOICEJOT_NOTE_ROOT")
        .map(|root| expand_home(&root))
        .or_else(|| raw.note_root.as_deref().map(|root| resolve_path(&base_dir, root)))
        .context("Missing note root. Set note_root in the config file or VOICEJOT_NOTE_ROOT env var")?;

    let mut config = Config::new(note_root.clone(), home);
    config.config_file = config_path;

    if let Some(header) = raw.task_header.filter(|h| !h.trim().is_empty()) {
        config.task_header = header.trim().to_string();
    }
    if let Some(language) = raw.language {
        config.language = language;
    }
    if let Some(model) = raw.model {
        config.model = model;
    }
    config.api_key = env("OPENAI_API_KEY").or(raw.api_key);
    if let Some(url) = raw.api_base_url {
        config.api_base_url = url;
    }

    config.chunking = ChunkSettings {
        token_threshold: raw.token_threshold.unwrap_or(DEFAULT_TOKEN_THRESHOLD),
        chunk_chars: raw.chunk_chars.unwrap_or(DEFAULT_CHUNK_CHARS),
    };

    if let Some(path) = raw.watch.path {
        config.watch.watch_path = resolve_path(&base_dir, &path);
    }
    if let Some(extension) = raw.watch.extension {
        config.watch.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(delay) = raw.watch.stability_delay_secs {
        config.watch.stability_delay_secs = delay;
    }
    if let Some(recursive) = raw.watch.recursive {
        config.watch.recursive = recursive;
    }

    if let Some(journal) = raw.journal {
        config.journal_path = resolve_path(&base_dir, &journal);
    }

    Ok(config)
}
