//! deprecss-core: detection engine for deprecated CSS classes
//!
//! Stylesheets mark classes as deprecated with a custom property:
//!
//! ```css
//! .old-button { --deprecated: "Use .btn-primary instead"; }
//! ```
//!
//! This library finds those declarations and every usage of the classes in
//! HTML, JSX/TSX, Vue, Angular, Svelte, Astro, server templates and
//! stylesheets (`@apply`).
//!
//! # Features
//!
//! - **Declaration parsing**: `--deprecated` rules, grouped selectors, SCSS `&.modifier`
//! - **Parallel scanning**: glob-filtered, pruned directory walks
//! - **Pluggable patterns**: an ordered registry of class-bearing syntaxes
//! - **Usage detection**: exact line/column spans with whole-word matching
//! - **Live cache**: per-file invalidation with update notifications
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use deprecss_core::prelude::*;
//!
//! let result = Deprecss::new("/path/to/project").analyze()?;
//! for file in &result.files {
//!     for usage in &file.usages {
//!         println!("{}:{} .{}", file.path.display(), usage.line + 1, usage.class_name);
//!     }
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`parse`]: `--deprecated` declaration parsing
//! - [`scan`]: stylesheet discovery and parallel parsing
//! - [`patterns`]: class pattern trait, built-ins and registry
//! - [`detect`]: usage detection
//! - [`cache`]: live declaration cache
//! - [`builder`]: fluent builder API for one-shot analysis
//! - [`config`]: deprecss.toml and settings validation
//! - [`error`]: typed error handling

pub mod builder;
pub mod cache;
pub mod category;
pub mod common;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod parse;
pub mod patterns;
pub mod prelude;
pub mod report;
pub mod root;
pub mod scan;
pub mod types;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeprecssError, DeprecssResult, IoResultExt};

// Domain types
pub use types::{ClassUsage, DeclarationMap, DeprecatedClass, FileChangeEvent, FileChangeKind};

// Builder API
pub use builder::{analyze_file, AnalysisResult, Deprecss, FileReport};

// Cache
pub use cache::{CacheUpdate, DeclarationCache, ListenerId};

// File categories
pub use category::{all_supported_extensions, file_category, is_css_file, should_scan_file, FileCategory};

// Configuration
pub use config::{load_config, DeprecssConfig, PatternConfig, Settings, Severity, CONFIG_FILE};

// Detection
pub use detect::ClassDetector;
pub use patterns::{builtin_patterns, ClassPattern, NgClassPattern, PatternMatch, PatternRegistry, RegexPattern};

// Logging
pub use logging::{init_logging, LogFormat};

// Parsing and scanning
pub use parse::{parse_css, CssParseResult};
pub use scan::{
    collect_declarations, gather_files, gather_stylesheets, parse_file, scan, ScanOptions, StylesheetMatcher,
    DEFAULT_IGNORE_DIRS, DEFAULT_PATTERNS,
};

// Reporting
pub use report::{print_declarations, print_json, print_plain, render_declarations, render_json, render_plain};

// Root detection
pub use root::find_project_root;

#[cfg(test)]
mod tests;
