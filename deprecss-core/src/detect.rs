//! Deprecated class usage detection.
//!
//! Detection runs line by line in two phases:
//! 1. Pattern phase: every applicable class pattern extracts class-bearing
//!    regions; declared tokens inside them become usages.
//! 2. Fallback phase: each declared class is searched directly in the line
//!    and kept only when the text to its left is an open class context.
//!
//! Within one line, pattern hits come before fallback hits. A usage is never
//! reported twice for the same `(line, start, class_name)`.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::RegexSet;

use crate::category::FileCategory;
use crate::common::{find_whole_class, utf16_column, utf16_len};
use crate::patterns::{PatternMatch, PatternRegistry};
use crate::types::{ClassUsage, DeclarationMap, DeprecatedClass};

/// Prefixes that leave the cursor inside a class list.
fn class_contexts() -> &'static RegexSet {
    static CONTEXTS: OnceLock<RegexSet> = OnceLock::new();
    // SAFETY: These regex patterns are hardcoded and covered by tests.
    CONTEXTS.get_or_init(|| {
        RegexSet::new([
            r#"(?i)class\s*=\s*["'][^"']*$"#,
            r#"(?i)className\s*=\s*["'][^"']*$"#,
            r"(?i)className\s*=\s*\{`[^`]*$",
            r#"(?i):class\s*=\s*["'][^"']*$"#,
            r#"(?i)\[class\]\s*=\s*["'][^"']*$"#,
            r"(?i)@apply\s+[^;]*$",
            r#"(?i)(?:clsx|classNames|cn|twMerge|cva)\s*\([^)]*["'][^"']*$"#,
        ])
        .expect("Hardcoded regex pattern is valid")
    })
}

/// Checks whether the text before `byte` in `line` is an open class context.
fn is_in_class_context(line: &str, byte: usize) -> bool {
    class_contexts().is_match(&line[..byte])
}

/// Splits a class list into literal tokens.
///
/// Tokens still holding an interpolation (`${...}`, `{expr}`) cannot name a
/// class statically and are dropped.
fn split_classes(classes: &str) -> impl Iterator<Item = &str> {
    classes
        .split_whitespace()
        .filter(|token| !token.contains("${") && !token.contains('{'))
}

/// Finds usages of deprecated classes in source text.
///
/// The detector holds no per-document state; one instance can serve any
/// number of concurrent callers.
#[derive(Debug, Clone)]
pub struct ClassDetector {
    registry: Arc<PatternRegistry>,
    fallback_search: bool,
}

impl Default for ClassDetector {
    fn default() -> Self {
        Self::new(Arc::new(PatternRegistry::with_builtins()))
    }
}

impl ClassDetector {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self {
            registry,
            fallback_search: true,
        }
    }

    /// Enables or disables the direct-search fallback phase.
    pub fn with_fallback_search(mut self, enabled: bool) -> Self {
        self.fallback_search = enabled;
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn fallback_search(&self) -> bool {
        self.fallback_search
    }

    /// Finds every usage of a class in `declarations` within `text`.
    ///
    /// `category` restricts the pattern phase to patterns applicable to that
    /// category; `None` runs every registered pattern. Lines are 0-based and
    /// columns are UTF-16 code units.
    pub fn find_usages(
        &self,
        text: &str,
        declarations: &DeclarationMap,
        category: Option<FileCategory>,
    ) -> Vec<ClassUsage> {
        if declarations.is_empty() {
            return Vec::new();
        }

        let patterns = match category {
            Some(category) => self.registry.for_category(category),
            None => self.registry.all(),
        };

        let mut usages = Vec::new();
        let mut seen: HashSet<(usize, usize, &str)> = HashSet::new();

        for (line_no, line) in text.split('\n').enumerate() {
            let mut recorder = LineRecorder {
                line,
                line_no,
                usages: &mut usages,
                seen: &mut seen,
            };

            for pattern in &patterns {
                for m in pattern.find_matches(line) {
                    recorder.record_pattern_match(&m, declarations);
                }
            }

            if self.fallback_search {
                recorder.record_direct_matches(declarations);
            }
        }

        usages
    }
}

/// Usage bookkeeping for one line.
struct LineRecorder<'t, 'm, 'u> {
    line: &'t str,
    line_no: usize,
    usages: &'u mut Vec<ClassUsage>,
    seen: &'u mut HashSet<(usize, usize, &'m str)>,
}

impl<'t, 'm, 'u> LineRecorder<'t, 'm, 'u> {
    fn record_pattern_match(&mut self, m: &PatternMatch<'_>, declarations: &'m DeclarationMap) {
        for token in split_classes(m.classes_string) {
            let Some((name, info)) = declarations.get_key_value(token) else {
                continue;
            };

            for pos in find_whole_class(m.classes_string, name) {
                self.push(m.classes_start() + pos, name, info);
            }
        }
    }

    fn record_direct_matches(&mut self, declarations: &'m DeclarationMap) {
        let mut hits: Vec<(usize, &'m str, &'m DeprecatedClass)> = Vec::new();

        for (name, info) in declarations {
            for start in find_whole_class(self.line, name) {
                if self.seen.contains(&(self.line_no, start, name.as_str())) {
                    continue;
                }
                if !is_in_class_context(self.line, start) {
                    continue;
                }
                hits.push((start, name.as_str(), info));
            }
        }

        // Map iteration order is arbitrary; keep output stable.
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        for (start, name, info) in hits {
            self.push(start, name, info);
        }
    }

    fn push(&mut self, byte_start: usize, name: &'m str, info: &DeprecatedClass) {
        if !self.seen.insert((self.line_no, byte_start, name)) {
            return;
        }

        let start_char = utf16_column(self.line, byte_start);
        self.usages.push(ClassUsage {
            class_name: name.to_string(),
            line: self.line_no,
            start_char,
            end_char: start_char + utf16_len(name),
            deprecated_info: info.clone(),
        });
    }
}
