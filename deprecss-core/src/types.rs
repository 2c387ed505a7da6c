//! Domain records shared by the parser, detector and cache.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A CSS class marked deprecated through a `--deprecated` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedClass {
    /// Class name without the leading dot
    pub class_name: String,
    /// Text of the `--deprecated` property
    pub message: String,
    /// Stylesheet that declared the class
    pub source_file: PathBuf,
    /// 1-based line of the declaring selector, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl DeprecatedClass {
    pub fn new(
        class_name: impl Into<String>,
        message: impl Into<String>,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            source_file: source_file.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Deprecated classes keyed by class name.
pub type DeclarationMap = HashMap<String, DeprecatedClass>;

/// One located occurrence of a deprecated class in a text buffer.
///
/// `line` is 0-based; `start_char`/`end_char` are UTF-16 columns with
/// `end_char` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUsage {
    pub class_name: String,
    pub line: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub deprecated_info: DeprecatedClass,
}

/// Kind of change reported by a file watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Created,
    Changed,
    Deleted,
}

/// A file watcher notification driving cache updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

impl FileChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
