//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use deprecss_core::prelude::*;
//! ```
//!
//! This provides the types most hosts need to scan declarations, detect
//! usages and keep a live cache, without the lower-level helpers.

// Core types
pub use crate::error::{DeprecssError, DeprecssResult};
pub use crate::types::{ClassUsage, DeclarationMap, DeprecatedClass, FileChangeEvent, FileChangeKind};

// Parsing and scanning
pub use crate::parse::{parse_css, CssParseResult};
pub use crate::scan::{scan, ScanOptions};

// Detection
pub use crate::category::{file_category, is_css_file, should_scan_file, FileCategory};
pub use crate::detect::ClassDetector;
pub use crate::patterns::{ClassPattern, PatternMatch, PatternRegistry, RegexPattern};

// Caching
pub use crate::cache::{CacheUpdate, DeclarationCache, ListenerId};

// Configuration
pub use crate::config::{load_config, DeprecssConfig, Settings, Severity};

// Root detection
pub use crate::root::find_project_root;

// Builder API
pub use crate::builder::{analyze_file, AnalysisResult, Deprecss, FileReport};
