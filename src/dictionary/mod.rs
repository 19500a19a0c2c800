use std::path::{Path, PathBuf};
use tokio::fs;
use anyhow::Result;

/// Words used when no word list is available
pub const BUILTIN_WORDS: [&str; 5] = ["chat", "call", "support", "request", "email"];

/// Word corpus a game draws its pool from
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Load a newline-delimited word list from a file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let list = Self::parse(&content);

        tracing::info!("Loaded {} words into word list", list.len());

        Ok(list)
    }

    /// Load from `path`, falling back to the built-in list when the file is
    /// missing, unreadable or contains no words
    pub async fn load_or_builtin<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                tracing::warn!(
                    "Word list {} is empty, using built-in words",
                    path.as_ref().display()
                );
                Self::builtin()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load word list {}: {}. Using built-in words",
                    path.as_ref().display(),
                    e
                );
                Self::builtin()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let words = content
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_words(words)
    }

    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_WORDS.iter().map(|w| w.to_string()).collect())
    }

    pub fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Optional per-word illustrations stored as `<dir>/<word>.png`
#[derive(Debug, Clone)]
pub struct ImageAssets {
    dir: Option<PathBuf>,
}

impl ImageAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Text-only presentation, no lookups at all
    pub fn none() -> Self {
        Self { dir: None }
    }

    /// An empty `dir` setting turns illustrations off
    pub fn from_setting(dir: &str) -> Self {
        if dir.trim().is_empty() {
            Self::none()
        } else {
            Self::new(dir)
        }
    }

    /// File name an illustration for `word` is stored under
    pub fn file_name(word: &str) -> String {
        format!("{}.png", word.trim().to_lowercase())
    }

    /// Path of the illustration for `word`, if one exists
    pub async fn lookup(&self, word: &str) -> Option<PathBuf> {
        let path = self.dir.as_ref()?.join(Self::file_name(word));
        match fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => None,
        }
    }
}
