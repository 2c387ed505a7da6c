//! Class-usage patterns.
//!
//! A pattern recognises one class-bearing syntax (`class="..."`,
//! `clsx("...")`, `@apply ...;`) within a single line. Patterns live in a
//! [`PatternRegistry`] keyed by id; new syntaxes are supported by registering
//! another [`ClassPattern`] implementation, the detector never changes.
//!
//! ```rust,ignore
//! let mut registry = PatternRegistry::with_builtins();
//! registry.register(RegexPattern::new(
//!     "twig-attr",
//!     "Twig attr",
//!     "attr={ class: '...' }",
//!     r#"class:\s*'([^']+)'"#,
//! )?.with_categories([FileCategory::Template]));
//! ```

mod builtin;
mod registry;

pub use builtin::{builtin_patterns, NgClassPattern};
pub use registry::PatternRegistry;

use regex::Regex;

use crate::category::FileCategory;
use crate::error::{DeprecssError, DeprecssResult};

/// One class-bearing region found in a line.
///
/// `classes_string` holds one or more whitespace-separated class tokens.
/// Its byte offset in the line is `match_index + classes_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    /// The whole matched region (e.g. `class="foo bar"`)
    pub full_match: &'a str,
    /// The class tokens (e.g. `foo bar`)
    pub classes_string: &'a str,
    /// Byte offset of `full_match` in the line
    pub match_index: usize,
    /// Byte offset of `classes_string` within `full_match`
    pub classes_offset: usize,
}

impl PatternMatch<'_> {
    /// Byte offset of `classes_string` in the line.
    #[inline]
    pub fn classes_start(&self) -> usize {
        self.match_index + self.classes_offset
    }
}

/// A reusable rule for locating class-bearing syntax in one line of source.
pub trait ClassPattern: Send + Sync {
    /// Unique identifier
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// What syntax this pattern matches
    fn description(&self) -> &str;

    /// Categories this pattern applies to; empty means every category.
    fn applicable_categories(&self) -> &[FileCategory] {
        &[]
    }

    /// Finds every class-bearing region in `line`.
    fn find_matches<'a>(&self, line: &'a str) -> Vec<PatternMatch<'a>>;

    /// Checks whether this pattern should run for `category`.
    fn applies_to(&self, category: FileCategory) -> bool {
        let categories = self.applicable_categories();
        categories.is_empty() || categories.contains(&category)
    }
}

/// Regex-backed [`ClassPattern`]: every match of `regex` whose capture group
/// `classes_group` is non-empty becomes a [`PatternMatch`].
#[derive(Debug, Clone)]
pub struct RegexPattern {
    id: String,
    name: String,
    description: String,
    regex: Regex,
    classes_group: usize,
    categories: Vec<FileCategory>,
}

impl RegexPattern {
    /// Compiles a pattern whose class tokens are in capture group 1.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        regex: &str,
    ) -> DeprecssResult<Self> {
        let id = id.into();
        let regex = Regex::new(regex).map_err(|e| DeprecssError::pattern(&id, e.to_string()))?;

        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            regex,
            classes_group: 1,
            categories: Vec::new(),
        })
    }

    /// Uses capture group `group` for the class tokens.
    ///
    /// Fails if the regex has no such group.
    pub fn with_classes_group(mut self, group: usize) -> DeprecssResult<Self> {
        if group == 0 || group >= self.regex.captures_len() {
            return Err(DeprecssError::pattern(
                &self.id,
                format!(
                    "capture group {} does not exist (regex has {})",
                    group,
                    self.regex.captures_len() - 1
                ),
            ));
        }
        self.classes_group = group;
        Ok(self)
    }

    /// Restricts the pattern to the given categories.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = FileCategory>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }
}

impl ClassPattern for RegexPattern {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn applicable_categories(&self) -> &[FileCategory] {
        &self.categories
    }

    fn find_matches<'a>(&self, line: &'a str) -> Vec<PatternMatch<'a>> {
        self.regex
            .captures_iter(line)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let classes = caps.get(self.classes_group)?;
                if classes.as_str().is_empty() {
                    return None;
                }
                Some(PatternMatch {
                    full_match: full.as_str(),
                    classes_string: classes.as_str(),
                    match_index: full.start(),
                    classes_offset: classes.start() - full.start(),
                })
            })
            .collect()
    }
}
