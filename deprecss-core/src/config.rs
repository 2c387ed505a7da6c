//! Configuration loading from deprecss.toml and settings validation.
//!
//! The same shape is accepted from two places: a `deprecss.toml` at the
//! project root (snake_case keys) and the editor's `deprecss` settings object
//! (camelCase keys). Everything is optional; [`Settings::validate`] fills in
//! defaults and drops invalid entries instead of failing.
//!
//! ```toml
//! enable = true
//! css_glob = ["styles/**/*.css"]
//! exclude_dirs = ["node_modules", "vendor"]
//! severity = "error"
//! fallback_search = true
//!
//! [[patterns]]
//! id = "twig-attr"
//! regex = "attr=\\{ class: '([^']+)' \\}"
//! categories = ["template"]
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::category::FileCategory;
use crate::detect::ClassDetector;
use crate::error::{DeprecssError, DeprecssResult, IoResultExt};
use crate::patterns::{PatternRegistry, RegexPattern};
use crate::scan::{ScanOptions, DEFAULT_IGNORE_DIRS, DEFAULT_PATTERNS};

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "deprecss.toml";

/// Raw configuration as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeprecssConfig {
    /// Turns diagnostics on or off.
    pub enable: Option<bool>,
    /// Stylesheet globs, relative to the project root.
    #[serde(alias = "cssGlob")]
    pub css_glob: Option<Vec<String>>,
    /// Directory names pruned from every walk.
    #[serde(alias = "excludeDirs")]
    pub exclude_dirs: Option<Vec<String>>,
    /// "error", "warning", "information" or "hint".
    pub severity: Option<String>,
    /// Whether the detector's direct-search fallback runs.
    #[serde(alias = "fallbackSearch")]
    pub fallback_search: Option<bool>,
    /// Extra class patterns registered after the built-ins.
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

/// A user-defined regex class pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternConfig {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub regex: String,
    /// Capture group holding the class list (default 1).
    pub group: Option<usize>,
    /// Category names; empty applies everywhere.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl PatternConfig {
    /// Compiles the pattern, validating the regex, group and categories.
    pub fn build(&self) -> DeprecssResult<RegexPattern> {
        if self.id.trim().is_empty() {
            return Err(DeprecssError::pattern("", "pattern id must not be empty"));
        }

        let categories = self
            .categories
            .iter()
            .map(|c| c.parse::<FileCategory>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DeprecssError::pattern(&self.id, e))?;

        let pattern = RegexPattern::new(
            &self.id,
            self.name.as_deref().unwrap_or(&self.id),
            self.description.as_deref().unwrap_or_default(),
            &self.regex,
        )?
        .with_classes_group(self.group.unwrap_or(1))?;

        Ok(pattern.with_categories(categories))
    }
}

/// Diagnostic severity for reported usages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Information,
    Hint,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
            Severity::Hint => "hint",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "information" => Ok(Severity::Information),
            "hint" => Ok(Severity::Hint),
            other => Err(format!("unknown severity `{}`", other)),
        }
    }
}

/// Validated, complete settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub enable: bool,
    pub css_glob: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub severity: Severity,
    pub fallback_search: bool,
    pub patterns: Vec<PatternConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::validate(None)
    }
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|v| !v.trim().is_empty()).collect()
}

fn defaults(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Normalises a raw configuration.
    ///
    /// - missing `enable` / `fallback_search` → true
    /// - missing or empty `css_glob` → the scanner's default globs
    /// - missing `exclude_dirs` → the default ignore list (an explicit empty
    ///   list disables pruning)
    /// - unknown `severity` → warning
    ///
    /// Empty strings are dropped from both lists.
    pub fn validate(config: Option<DeprecssConfig>) -> Self {
        let config = config.unwrap_or_default();

        let css_glob = match config.css_glob.map(non_empty) {
            Some(globs) if !globs.is_empty() => globs,
            _ => defaults(DEFAULT_PATTERNS),
        };

        let exclude_dirs = config
            .exclude_dirs
            .map(non_empty)
            .unwrap_or_else(|| defaults(DEFAULT_IGNORE_DIRS));

        let severity = match config.severity.as_deref() {
            None => Severity::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(detail = %e, "falling back to warning severity");
                Severity::default()
            }),
        };

        Self {
            enable: config.enable.unwrap_or(true),
            css_glob,
            exclude_dirs,
            severity,
            fallback_search: config.fallback_search.unwrap_or(true),
            patterns: config.patterns,
        }
    }

    /// Scanner options derived from these settings.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_patterns(self.css_glob.iter().cloned())
            .with_ignore_dirs(self.exclude_dirs.iter().cloned())
    }

    /// Built-in patterns followed by the configured custom patterns.
    ///
    /// A custom pattern reusing a built-in id replaces it.
    pub fn build_registry(&self) -> DeprecssResult<PatternRegistry> {
        let mut registry = PatternRegistry::with_builtins();
        for config in &self.patterns {
            registry.register(config.build()?);
        }
        Ok(registry)
    }

    /// A detector using [`Self::build_registry`] and the fallback setting.
    pub fn detector(&self) -> DeprecssResult<ClassDetector> {
        Ok(ClassDetector::new(Arc::new(self.build_registry()?))
            .with_fallback_search(self.fallback_search))
    }
}

/// Loads configuration from deprecss.toml if it exists.
pub fn load_config(root: &Path) -> DeprecssResult<Option<DeprecssConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg = toml::from_str(&content)
        .map_err(|e| DeprecssError::config(&path, format!("invalid {}: {}", CONFIG_FILE, e)))?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert!(settings.enable);
        assert!(settings.fallback_search);
        assert_eq!(settings.severity, Severity::Warning);
        assert_eq!(settings.css_glob, vec!["**/*.css", "**/*.scss", "**/*.less"]);
        assert_eq!(settings.exclude_dirs, vec!["node_modules", "dist", "build", ".git"]);
        assert!(settings.patterns.is_empty());
        assert_eq!(settings.scan_options(), ScanOptions::default());
    }

    #[test]
    fn test_validate_normalises_values() {
        let settings = Settings::validate(Some(DeprecssConfig {
            enable: Some(false),
            css_glob: Some(vec!["".into(), "src/**/*.css".into()]),
            exclude_dirs: Some(vec!["vendor".into(), " ".into()]),
            severity: Some("error".into()),
            fallback_search: Some(false),
            patterns: Vec::new(),
        }));

        assert!(!settings.enable);
        assert!(!settings.fallback_search);
        assert_eq!(settings.css_glob, vec!["src/**/*.css"]);
        assert_eq!(settings.exclude_dirs, vec!["vendor"]);
        assert_eq!(settings.severity, Severity::Error);
    }

    #[test]
    fn test_validate_empty_lists_and_bad_severity() {
        let settings = Settings::validate(Some(DeprecssConfig {
            css_glob: Some(vec!["".into()]),
            exclude_dirs: Some(Vec::new()),
            severity: Some("fatal".into()),
            ..Default::default()
        }));

        assert_eq!(settings.css_glob, defaults(DEFAULT_PATTERNS));
        assert!(settings.exclude_dirs.is_empty());
        assert_eq!(settings.severity, Severity::Warning);
    }

    #[test]
    fn test_load_config_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_load_config_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
severity = "hint"
css_glob = ["styles/**/*.scss"]

[[patterns]]
id = "data-cls"
regex = 'data-cls="([^"]+)"'
categories = ["html", "vue"]
"#,
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap().unwrap();
        assert_eq!(cfg.severity.as_deref(), Some("hint"));
        assert_eq!(cfg.patterns.len(), 1);

        let settings = Settings::validate(Some(cfg));
        let registry = settings.build_registry().unwrap();
        let pattern = registry.get("data-cls").unwrap();
        assert!(pattern.applies_to(FileCategory::Vue));
        assert!(!pattern.applies_to(FileCategory::React));
        assert_eq!(registry.ids().last(), Some("data-cls"));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "severity = [").unwrap();

        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, DeprecssError::Config { .. }));
        assert_eq!(err.path(), Some(&dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_camel_case_json_settings() {
        let cfg: DeprecssConfig = serde_json::from_value(serde_json::json!({
            "enable": true,
            "cssGlob": ["a/**/*.css"],
            "excludeDirs": ["x"],
            "fallbackSearch": false
        }))
        .unwrap();

        assert_eq!(cfg.css_glob, Some(vec!["a/**/*.css".to_string()]));
        assert_eq!(cfg.exclude_dirs, Some(vec!["x".to_string()]));
        assert_eq!(cfg.fallback_search, Some(false));
    }

    #[test]
    fn test_bad_custom_patterns() {
        let bad_regex = PatternConfig {
            id: "bad".into(),
            regex: "(".into(),
            ..Default::default()
        };
        assert!(matches!(bad_regex.build(), Err(DeprecssError::Pattern { .. })));

        let bad_category = PatternConfig {
            id: "cat".into(),
            regex: "x=(.*)".into(),
            categories: vec!["cobol".into()],
            ..Default::default()
        };
        assert!(bad_category.build().is_err());

        let bad_group = PatternConfig {
            id: "grp".into(),
            regex: "x=(.*)".into(),
            group: Some(3),
            ..Default::default()
        };
        assert!(bad_group.build().is_err());

        let settings = Settings {
            patterns: vec![bad_regex],
            ..Settings::default()
        };
        assert!(settings.detector().is_err());
    }

    #[test]
    fn test_severity_round_trip() {
        for s in [Severity::Error, Severity::Warning, Severity::Information, Severity::Hint] {
            assert_eq!(s.as_str().parse::<Severity>(), Ok(s));
        }
    }
}
