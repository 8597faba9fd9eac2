//! CLI Common Utilities
//!
//! Config resolution and input reading shared by command handlers.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::types::{HumaniseError, Result, ValidationError, ValidationErrorKind};

/// Where the text to transform comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// `--text` wins over `--file`; neither means stdin
    pub fn from_args(text: Option<String>, file: Option<PathBuf>) -> Self {
        match (text, file) {
            (Some(text), _) => Self::Inline(text),
            (None, Some(path)) => Self::File(path),
            (None, None) => Self::Stdin,
        }
    }

    pub fn read(self) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text),
            Self::File(path) => std::fs::read_to_string(&path).map_err(|e| {
                HumaniseError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", path.display(), e),
                ))
            }),
            Self::Stdin => {
                let stdin = std::io::stdin();
                if stdin.is_terminal() {
                    return Err(ValidationError::new(
                        ValidationErrorKind::Empty,
                        "no input: pass --text, --file, or pipe text on stdin",
                    )
                    .with_field("input_text")
                    .into());
                }
                let mut buffer = String::new();
                stdin.lock().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}

/// Explicit `--config` file, or the layered global/project/env lookup
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
