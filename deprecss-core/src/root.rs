//! Project root discovery.
//!
//! Editors often open a sub-folder of a front-end project. Walking upward
//! to the directory that owns the build configuration makes the stylesheet
//! scan cover the whole project. Never panics: unreadable directories are
//! treated as "no marker here".

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Files whose presence marks a project root.
pub const ROOT_MARKERS: &[&str] = &[
    "tailwind.config.js",
    "tailwind.config.ts",
    "tailwind.config.cjs",
    "tailwind.config.mjs",
    "package.json",
];

/// Conventional stylesheet folders; one holding `.css`/`.scss` files also
/// marks a root.
pub const STYLE_DIRS: &[&str] = &["assets", "styles", "css", "src"];

fn has_stylesheets(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".css") || name.ends_with(".scss"))
    })
}

fn is_project_root(dir: &Path) -> bool {
    if let Some(marker) = ROOT_MARKERS.iter().find(|m| dir.join(m).exists()) {
        debug!(dir = %dir.display(), marker, "found project marker");
        return true;
    }

    if let Some(styles) = STYLE_DIRS
        .iter()
        .map(|d| dir.join(d))
        .find(|d| d.is_dir() && has_stylesheets(d))
    {
        debug!(dir = %styles.display(), "found stylesheet folder");
        return true;
    }

    false
}

/// Finds the project root for `start`.
///
/// Checks `start` and each ancestor (the filesystem root excluded) for a
/// marker file or a stylesheet folder; falls back to `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .take_while(|dir| dir.parent().is_some())
        .find(|dir| is_project_root(dir))
        .unwrap_or(start)
        .to_path_buf()
}
