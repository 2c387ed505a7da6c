//! Stylesheet parsing for `--deprecated` declarations.
//!
//! This is a line/block regex scan, not a CSS grammar. Only one narrow
//! shape is recognised:
//!
//! ```css
//! .old-btn, .legacy-btn { --deprecated: "Use .btn instead"; }
//! .card { &.card--flat { --deprecated: 'Use .card-plain'; } }
//! ```
//!
//! Two independent sub-scans run over the raw text and their results are
//! concatenated:
//! - standard rule blocks (comma-separated `.class`/`#id` selectors followed
//!   by a body that may hold one level of nested braces)
//! - SCSS parent-selector shorthand `&.modifier { ... }`
//!
//! A property sitting inside a nested block therefore reports both the
//! enclosing class and the nested class. Duplicates are harmless: the cache
//! keeps one entry per class name.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::common::LineIndex;
use crate::types::DeprecatedClass;

/// Result of parsing one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssParseResult {
    /// Deprecated classes in discovery order
    pub classes: Vec<DeprecatedClass>,
    /// Non-fatal problems, one human-readable line each
    pub errors: Vec<String>,
}

/// Pre-compiled regex patterns for declaration scanning.
struct CssPatterns {
    rule_block: Regex,
    nested_parent: Regex,
    deprecated_value: Regex,
    deprecated_key: Regex,
    class_name: Regex,
}

fn patterns() -> &'static CssPatterns {
    static PATTERNS: OnceLock<CssPatterns> = OnceLock::new();
    // SAFETY: These regex patterns are hardcoded and covered by tests.
    PATTERNS.get_or_init(|| CssPatterns {
        rule_block: Regex::new(
            r"([.#][A-Za-z0-9_-]+(?:\s*,\s*[.#][A-Za-z0-9_-]+)*)\s*\{([^{}]*(?:\{[^{}]*\}[^{}]*)*)\}",
        )
        .expect("Hardcoded regex pattern is valid"),
        nested_parent: Regex::new(r"&(\.[A-Za-z0-9_-]+)\s*\{([^{}]*)\}")
            .expect("Hardcoded regex pattern is valid"),
        deprecated_value: Regex::new(r#"--deprecated\s*:\s*["']([^"']+)["']"#)
            .expect("Hardcoded regex pattern is valid"),
        deprecated_key: Regex::new(r"--deprecated\s*:").expect("Hardcoded regex pattern is valid"),
        class_name: Regex::new(r"\.([A-Za-z_][A-Za-z0-9_-]*)")
            .expect("Hardcoded regex pattern is valid"),
    })
}

/// Parses stylesheet text and extracts classes marked with `--deprecated`.
///
/// Never fails: malformed declarations end up in `errors` and simply
/// contribute no classes.
///
/// ```rust,ignore
/// let result = parse_css(".old-button { --deprecated: \"Use .btn-primary\"; }", "/f.css");
/// assert_eq!(result.classes[0].class_name, "old-button");
/// ```
pub fn parse_css(css: &str, source_file: impl AsRef<Path>) -> CssParseResult {
    let source_file = source_file.as_ref();
    let index = LineIndex::new(css);
    let mut result = CssParseResult::default();

    parse_standard_rule_blocks(css, source_file, &index, &mut result);
    parse_nested_parent_selectors(css, source_file, &index, &mut result);

    result
}

/// Standard rule blocks: `.a, #b, .c { ... }`.
fn parse_standard_rule_blocks(
    css: &str,
    source_file: &Path,
    index: &LineIndex,
    result: &mut CssParseResult,
) {
    let p = patterns();

    for caps in p.rule_block.captures_iter(css) {
        let (Some(selector), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        let Some(message) = deprecation_message(body.as_str(), source_file, index, body.start(), result)
        else {
            continue;
        };

        for class_caps in p.class_name.captures_iter(selector.as_str()) {
            let Some(name) = class_caps.get(1) else {
                continue;
            };
            let line = index.line_number(selector.start() + name.start());
            result.classes.push(
                DeprecatedClass::new(name.as_str(), message.clone(), source_file).at_line(line),
            );
        }
    }
}

/// SCSS parent-selector shorthand: `&.modifier { ... }`.
fn parse_nested_parent_selectors(
    css: &str,
    source_file: &Path,
    index: &LineIndex,
    result: &mut CssParseResult,
) {
    let p = patterns();

    for caps in p.nested_parent.captures_iter(css) {
        let (Some(selector), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        let Some(message) = deprecation_message(body.as_str(), source_file, index, body.start(), result)
        else {
            continue;
        };

        // Drop the leading dot.
        let class_name = &selector.as_str()[1..];
        let line = index.line_number(selector.start());
        result
            .classes
            .push(DeprecatedClass::new(class_name, message, source_file).at_line(line));
    }
}

/// Extracts the `--deprecated` message from a rule body.
///
/// A `--deprecated` key whose value is not a non-empty quoted string is
/// recorded as an error and yields `None`, as does a body without the key.
fn deprecation_message(
    body: &str,
    source_file: &Path,
    index: &LineIndex,
    body_offset: usize,
    result: &mut CssParseResult,
) -> Option<String> {
    let p = patterns();

    if let Some(caps) = p.deprecated_value.captures(body) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    if let Some(key) = p.deprecated_key.find(body) {
        let line = index.line_number(body_offset + key.start());
        let error = format!(
            "{}:{}: --deprecated value must be a quoted, non-empty string",
            source_file.display(),
            line
        );
        // A nested `&.x` body is visited by both sub-scans.
        if !result.errors.contains(&error) {
            result.errors.push(error);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn names(result: &CssParseResult) -> Vec<&str> {
        result.classes.iter().map(|c| c.class_name.as_str()).collect()
    }

    #[test]
    fn test_simple_rule() {
        let css = r#".old-button { --deprecated: "Use .btn-primary instead"; color: red; }"#;
        let result = parse_css(css, "/f.css");

        assert_eq!(
            result.classes,
            vec![DeprecatedClass {
                class_name: "old-button".to_string(),
                message: "Use .btn-primary instead".to_string(),
                source_file: PathBuf::from("/f.css"),
                line: Some(1),
            }]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_multiple_rules_keep_order() {
        let css = r#"
            .old-button {
              --deprecated: "Use .btn-primary instead";
              color: red;
            }

            .legacy-card {
              --deprecated: "Use .card-modern instead";
              padding: 10px;
            }
        "#;
        let result = parse_css(css, "/styles.css");

        assert_eq!(names(&result), vec!["old-button", "legacy-card"]);
        assert_eq!(result.classes[0].line, Some(2));
        assert_eq!(result.classes[1].line, Some(7));
    }

    #[test]
    fn test_grouped_selector_shares_message() {
        let css = r#".a, .b { --deprecated: "m"; }"#;
        let result = parse_css(css, "/g.css");

        assert_eq!(names(&result), vec!["a", "b"]);
        assert!(result.classes.iter().all(|c| c.message == "m"));
    }

    #[test]
    fn test_single_quoted_message() {
        let css = ".old-class { --deprecated: 'Use .new-class instead'; }";
        let result = parse_css(css, "/test.css");

        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].message, "Use .new-class instead");
    }

    #[test]
    fn test_blocks_without_property_are_ignored() {
        let css = r#"
            .normal-class { color: blue; }
            .deprecated-class { --deprecated: "This is deprecated"; color: red; }
        "#;
        let result = parse_css(css, "/test.css");

        assert_eq!(names(&result), vec!["deprecated-class"]);
    }

    #[test]
    fn test_id_selectors_are_skipped() {
        let result = parse_css(r#"#id { --deprecated: "x"; }"#, "/id.css");
        assert!(result.classes.is_empty());

        let result = parse_css(r#"#id, .c { --deprecated: "x"; }"#, "/id.css");
        assert_eq!(names(&result), vec!["c"]);
    }

    #[test]
    fn test_bare_nested_parent_selector() {
        let css = r#"&.old-variant { --deprecated: "Use .button-primary instead"; }"#;
        let result = parse_css(css, "/test.scss");

        // Both sub-scans see `.old-variant { ... }` at top level.
        assert_eq!(names(&result), vec!["old-variant", "old-variant"]);
    }

    #[test]
    fn test_nested_block_reports_outer_and_inner_class() {
        let css = r#"
            .button {
              &.old-variant {
                --deprecated: "Use .button-primary instead";
              }
            }
        "#;
        let result = parse_css(css, "/test.scss");

        assert_eq!(names(&result), vec!["button", "old-variant"]);
        assert_eq!(result.classes[1].line, Some(3));
    }

    #[test]
    fn test_hyphenated_and_numeric_class_names() {
        let css = r#".tw-badges-yellow-300 { --deprecated: "Use tw-badge-warning instead"; }"#;
        let result = parse_css(css, "/test.css");

        assert_eq!(names(&result), vec!["tw-badges-yellow-300"]);
    }

    #[test]
    fn test_empty_and_plain_css() {
        let result = parse_css("", "/empty.css");
        assert_eq!(result, CssParseResult::default());

        let result = parse_css(".normal { color: red; }\n.another { padding: 10px; }", "/p.css");
        assert!(result.classes.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_unquoted_value_is_an_error() {
        let css = ".legacy {\n  --deprecated: use-modern;\n}";
        let result = parse_css(css, "/bad.css");

        assert!(result.classes.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("/bad.css:2"));
    }

    #[test]
    fn test_nested_unquoted_value_reported_once() {
        let css = ".outer {\n  &.x {\n    --deprecated: unquoted;\n  }\n}";
        let result = parse_css(css, "/nested.css");

        assert!(result.classes.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("/nested.css:3"));
    }

    #[test]
    fn test_descendant_selector_only_takes_last_compound() {
        // The selector grammar has no combinators; the scan resynchronises
        // on the last class before the brace.
        let css = r#".card .title { --deprecated: "flatten"; }"#;
        let result = parse_css(css, "/d.css");

        assert_eq!(names(&result), vec!["title"]);
    }

    #[test]
    fn test_multiline_selector_list_lines() {
        let css = ".one,\n.two {\n  --deprecated: \"gone\";\n}";
        let result = parse_css(css, "/m.css");

        assert_eq!(names(&result), vec!["one", "two"]);
        assert_eq!(result.classes[0].line, Some(1));
        assert_eq!(result.classes[1].line, Some(2));
    }
}
