//! Builder pattern API for one-shot workspace analysis.
//!
//! Provides a fluent interface for scanning declarations and reporting
//! usages across a project:
//!
//! ```rust,ignore
//! use deprecss_core::prelude::*;
//!
//! let result = Deprecss::new("/path/to/project")
//!     .exclude_dirs(["vendor"])
//!     .with_fallback_search(false)
//!     .analyze()?;
//!
//! for file in &result.files {
//!     println!("{}: {} usages", file.path.display(), file.usages.len());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::category::{file_category, should_scan_file, FileCategory};
use crate::config::Settings;
use crate::detect::ClassDetector;
use crate::error::IoResultExt;
use crate::patterns::PatternRegistry;
use crate::scan::{collect_declarations, gather_files, gather_stylesheets};
use crate::types::{ClassUsage, DeclarationMap, DeprecatedClass};

/// Builder for configuring a workspace analysis.
#[derive(Debug, Clone)]
pub struct Deprecss {
    /// Root directory to analyze
    root: PathBuf,

    /// Validated settings (globs, ignore dirs, fallback, custom patterns)
    settings: Settings,

    /// Registry overriding the one built from settings
    registry: Option<Arc<PatternRegistry>>,
}

impl Deprecss {
    /// Create a new analysis builder for the given path with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            settings: Settings::default(),
            registry: None,
        }
    }

    /// Replace all settings, e.g. with ones loaded from deprecss.toml.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a prepared pattern registry instead of building one from settings.
    pub fn with_registry(mut self, registry: Arc<PatternRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Enable or disable the detector's fallback search.
    pub fn with_fallback_search(mut self, enabled: bool) -> Self {
        self.settings.fallback_search = enabled;
        self
    }

    /// Add directory names to prune from every walk.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.settings.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Replace the stylesheet globs.
    pub fn css_globs(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.settings.css_glob = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The detector this analysis runs with.
    pub fn detector(&self) -> Result<ClassDetector> {
        let registry = match &self.registry {
            Some(registry) => Arc::clone(registry),
            None => Arc::new(
                self.settings
                    .build_registry()
                    .context("Failed to build class patterns")?,
            ),
        };
        Ok(ClassDetector::new(registry).with_fallback_search(self.settings.fallback_search))
    }

    /// Scan only the declarations, without looking for usages.
    pub fn declarations(&self) -> Result<(DeclarationMap, usize)> {
        let stylesheets = gather_stylesheets(&self.root, &self.settings.scan_options())
            .context("Failed to gather stylesheets")?;
        Ok((collect_declarations(&stylesheets), stylesheets.len()))
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        // 1. Collect declarations
        let (declarations, stylesheets_scanned) = self.declarations()?;

        self.analyze_with(declarations, stylesheets_scanned)
    }

    /// Run the usage pass against already known declarations, e.g. the
    /// snapshot of a live cache.
    pub fn analyze_with(
        &self,
        declarations: DeclarationMap,
        stylesheets_scanned: usize,
    ) -> Result<AnalysisResult> {
        let detector = self.detector()?;

        // 2. Gather candidate sources
        let sources = gather_files(&self.root, &self.settings.exclude_dirs, should_scan_file)
            .context("Failed to gather source files")?;

        info!(
            sources = sources.len(),
            declarations = declarations.len(),
            "analyzing sources"
        );

        // 3. Detect usages in parallel; unreadable files are skipped
        let mut files: Vec<FileReport> = if self.settings.enable && !declarations.is_empty() {
            sources
                .par_iter()
                .filter_map(|path| match fs::read_to_string(path).with_path(path) {
                    Ok(text) => Some(analyze_file(&detector, path, &text, &declarations)),
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable source");
                        None
                    }
                })
                .filter(|report| !report.usages.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(AnalysisResult {
            root: self.root.clone(),
            declarations,
            stylesheets_scanned,
            files_scanned: sources.len(),
            files,
        })
    }
}

/// Usages found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub category: Option<FileCategory>,
    pub usages: Vec<ClassUsage>,
}

/// Detects usages in a single document, choosing patterns by its path.
pub fn analyze_file(
    detector: &ClassDetector,
    path: &Path,
    text: &str,
    declarations: &DeclarationMap,
) -> FileReport {
    let category = file_category(path);
    FileReport {
        path: path.to_path_buf(),
        category,
        usages: detector.find_usages(text, declarations, category),
    }
}

/// Result of running a workspace analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// Every deprecated class found
    pub declarations: DeclarationMap,

    /// Number of stylesheets parsed
    pub stylesheets_scanned: usize,

    /// Number of source files considered
    pub files_scanned: usize,

    /// Files with at least one usage, sorted by path
    pub files: Vec<FileReport>,
}

impl AnalysisResult {
    pub fn has_usages(&self) -> bool {
        self.files.iter().any(|f| !f.usages.is_empty())
    }

    pub fn usage_count(&self) -> usize {
        self.files.iter().map(|f| f.usages.len()).sum()
    }

    /// Declarations ordered by class name.
    pub fn sorted_declarations(&self) -> Vec<&DeprecatedClass> {
        let mut declarations: Vec<&DeprecatedClass> = self.declarations.values().collect();
        declarations.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        declarations
    }

    /// `path` relative to the analyzed root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
