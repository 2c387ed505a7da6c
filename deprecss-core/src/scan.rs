//! Stylesheet discovery and declaration scanning.
//!
//! Performance characteristics:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel read + parse via Rayon, folded back in enumeration order
//! - Entries sorted by file name, so "later file wins" is reproducible
//!
//! Fault tolerance: unreadable entries and files are logged and skipped;
//! `scan` never fails, it returns whatever it could collect.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{DeprecssError, DeprecssResult, IoResultExt};
use crate::parse::parse_css;
use crate::types::{DeclarationMap, DeprecatedClass};

/// Stylesheet globs scanned by default.
pub const DEFAULT_PATTERNS: &[&str] = &["**/*.css", "**/*.scss", "**/*.less"];

/// Directory names pruned by default.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &["node_modules", "dist", "build", ".git"];

/// Which files a scan looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Globs matched against the path relative to the scan root
    pub patterns: Vec<String>,
    /// Directory names whose subtrees are skipped entirely
    pub ignore_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }
}

/// Checks if a directory entry should be pruned (excluded from traversal).
///
/// The walk root itself is never pruned, even if its name is ignored.
#[inline]
fn is_ignored_dir(entry: &walkdir::DirEntry, ignore: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| ignore.contains(name))
}

fn build_globset(root: &Path, patterns: &[String]) -> DeprecssResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| DeprecssError::scan(root, format!("invalid glob `{}`: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DeprecssError::scan(root, e.to_string()))
}

/// Walks `root` and returns every file accepted by `accept`, pruning
/// `ignore_dirs` subtrees.
///
/// Unreadable entries below the root are logged and skipped. Only a root that
/// is not a directory is an error.
pub fn gather_files<F>(root: &Path, ignore_dirs: &[String], accept: F) -> DeprecssResult<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let meta = fs::metadata(root).with_path(root)?;
    if !meta.is_dir() {
        return Err(DeprecssError::scan(root, "scan root is not a directory"));
    }

    let ignore: HashSet<&str> = ignore_dirs.iter().map(String::as_str).collect();
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e, &ignore))
    {
        match entry {
            Ok(e) if e.file_type().is_file() => {
                if accept(e.path()) {
                    files.push(e.into_path());
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
            }
        }
    }

    Ok(files)
}

/// Decides whether a single path is a stylesheet the scanner would pick up.
///
/// Used to filter watcher events with the same rules as a full scan.
#[derive(Debug, Clone)]
pub struct StylesheetMatcher {
    root: PathBuf,
    globs: GlobSet,
    ignore_dirs: HashSet<String>,
}

impl StylesheetMatcher {
    pub fn new(root: &Path, options: &ScanOptions) -> DeprecssResult<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            globs: build_globset(root, &options.patterns)?,
            ignore_dirs: options.ignore_dirs.iter().cloned().collect(),
        })
    }

    /// Glob match against the root-relative path.
    fn matches_glob(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.globs.is_match(relative)
    }

    /// Checks the globs and that no directory between the root and the file
    /// is ignored. Paths outside the root never match.
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };

        let in_ignored_dir = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .any(|c| c.as_os_str().to_str().is_some_and(|name| self.ignore_dirs.contains(name)));

        !in_ignored_dir && self.matches_glob(path)
    }
}

/// Gathers stylesheets under `root` matching `options.patterns`.
pub fn gather_stylesheets(root: &Path, options: &ScanOptions) -> DeprecssResult<Vec<PathBuf>> {
    let matcher = StylesheetMatcher::new(root, options)?;
    gather_files(root, &options.ignore_dirs, |path| matcher.matches_glob(path))
}

/// Scans `root` for stylesheets and collects every deprecated class.
///
/// Files are parsed in parallel but folded in enumeration order, so when two
/// files declare the same class the later one wins. Never fails: enumeration
/// errors are logged and produce an empty map.
pub fn scan(root: &Path, options: &ScanOptions) -> DeclarationMap {
    let files = match gather_stylesheets(root, options) {
        Ok(files) => files,
        Err(e) => {
            error!(root = %root.display(), error = %e, "failed to scan stylesheets");
            return DeclarationMap::new();
        }
    };

    info!(count = files.len(), root = %root.display(), "found stylesheets to scan");
    collect_declarations(&files)
}

/// Parses `files` in parallel and folds the results in slice order, so a
/// class declared in several files keeps the last declaration.
pub fn collect_declarations(files: &[PathBuf]) -> DeclarationMap {
    let parsed: Vec<Vec<DeprecatedClass>> = files.par_iter().map(|f| parse_file(f)).collect();

    let mut map = DeclarationMap::new();
    for class in parsed.into_iter().flatten() {
        map.insert(class.class_name.clone(), class);
    }

    info!(count = map.len(), "extracted deprecated classes");
    map
}

/// Reads and parses a single stylesheet.
///
/// Parse errors are logged as warnings; a read failure is logged and yields
/// an empty list.
pub fn parse_file(path: &Path) -> Vec<DeprecatedClass> {
    let content = match fs::read_to_string(path).with_path(path) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to read stylesheet");
            return Vec::new();
        }
    };

    let result = parse_css(&content, path);
    for message in &result.errors {
        warn!(file = %path.display(), detail = %message, "stylesheet parse problem");
    }
    debug!(file = %path.display(), count = result.classes.len(), "parsed stylesheet");

    result.classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_options() {
        let options = ScanOptions::default();
        assert_eq!(options.patterns, vec!["**/*.css", "**/*.scss", "**/*.less"]);
        assert_eq!(options.ignore_dirs, vec!["node_modules", "dist", "build", ".git"]);
    }

    #[test]
    fn test_gather_respects_globs_and_ignores() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(root, "styles/a.css", "");
        write_file(root, "styles/b.scss", "");
        write_file(root, "styles/c.less", "");
        write_file(root, "top.css", "");
        write_file(root, "src/app.tsx", "");
        write_file(root, "node_modules/lib/x.css", "");
        write_file(root, "dist/bundle.css", "");

        let files = gather_stylesheets(root, &ScanOptions::default()).unwrap();
        let mut rel: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        rel.sort();

        assert_eq!(rel, vec!["styles/a.css", "styles/b.scss", "styles/c.less", "top.css"]);
    }

    #[test]
    fn test_custom_patterns_and_ignore_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(root, "a.css", "");
        write_file(root, "b.scss", "");
        write_file(root, "vendor/c.css", "");

        let options = ScanOptions::default()
            .with_patterns(["**/*.css"])
            .with_ignore_dirs(["vendor"]);
        let files = gather_stylesheets(root, &options).unwrap();

        assert_eq!(files, vec![root.join("a.css")]);
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let dir = TempDir::new().unwrap();
        let options = ScanOptions::default().with_patterns(["**/[.css"]);
        let err = gather_stylesheets(dir.path(), &options).unwrap_err();
        assert!(matches!(err, DeprecssError::Scan { .. }));
    }

    #[test]
    fn test_stylesheet_matcher() {
        let root = Path::new("/project");
        let matcher = StylesheetMatcher::new(root, &ScanOptions::default()).unwrap();

        assert!(matcher.matches(&root.join("styles/a.css")));
        assert!(matcher.matches(&root.join("b.less")));
        assert!(!matcher.matches(&root.join("src/app.tsx")));
        assert!(!matcher.matches(&root.join("node_modules/x/a.css")));
        assert!(!matcher.matches(&root.join("a/dist/a.css")));
        assert!(!matcher.matches(Path::new("/elsewhere/a.css")));
    }

    #[test]
    fn test_scan_collects_declarations() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(
            root,
            "styles/legacy.css",
            ".old-button { --deprecated: \"Use .btn-primary\"; }\n.fine { color: red; }",
        );
        write_file(
            root,
            "styles/cards.scss",
            ".card { &.card--flat { --deprecated: 'Use .card-plain'; } }",
        );

        let map = scan(root, &ScanOptions::default());

        assert_eq!(map.len(), 3);
        assert_eq!(map["old-button"].message, "Use .btn-primary");
        assert_eq!(map["old-button"].source_file, root.join("styles/legacy.css"));
        assert!(map.contains_key("card"));
        assert!(map.contains_key("card--flat"));
    }

    #[test]
    fn test_later_file_wins_on_collision() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(root, "a.css", ".dup { --deprecated: \"from a\"; }");
        write_file(root, "b.css", ".dup { --deprecated: \"from b\"; }");

        let map = scan(root, &ScanOptions::default());

        assert_eq!(map["dup"].message, "from b");
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let map = scan(&dir.path().join("nope"), &ScanOptions::default());
        assert!(map.is_empty());
    }

    #[test]
    fn test_parse_file_missing_returns_empty() {
        let dir = TempDir::new().unwrap();
        assert!(parse_file(&dir.path().join("missing.css")).is_empty());
    }

    #[test]
    fn test_ignored_name_as_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build");
        write_file(&root, "x.css", ".x { --deprecated: \"gone\"; }");

        let map = scan(&root, &ScanOptions::default());
        assert!(map.contains_key("x"));
    }
}
