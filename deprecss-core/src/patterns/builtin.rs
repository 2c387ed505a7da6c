//! Built-in class patterns, in precedence order.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::{ClassPattern, PatternMatch, RegexPattern};
use crate::category::FileCategory;

fn regex_pattern(
    id: &str,
    name: &str,
    description: &str,
    regex: &str,
    categories: &[FileCategory],
) -> Arc<dyn ClassPattern> {
    // SAFETY: Built-in expressions are hardcoded and covered by tests.
    let pattern = RegexPattern::new(id, name, description, regex)
        .expect("Hardcoded regex pattern is valid")
        .with_categories(categories.iter().copied());
    Arc::new(pattern)
}

/// All built-in patterns in order of precedence.
pub fn builtin_patterns() -> Vec<Arc<dyn ClassPattern>> {
    use FileCategory::*;

    vec![
        regex_pattern(
            "html-class",
            "HTML class",
            r#"HTML class attribute: class="...""#,
            r#"(?i)class\s*=\s*["']([^"']+)["']"#,
            &[Html, Template, Dotnet, Vue, Svelte, Astro, Angular],
        ),
        regex_pattern(
            "react-classname",
            "React className",
            r#"React className attribute: className="...""#,
            r#"(?i)className\s*=\s*["']([^"']+)["']"#,
            &[React],
        ),
        regex_pattern(
            "react-template-literal",
            "React template literal",
            "React className with template literal: className={`...`}",
            r"(?i)className\s*=\s*\{`([^`]+)`\}",
            &[React],
        ),
        regex_pattern(
            "class-utils",
            "Class utilities",
            "Class utility functions: clsx(), classNames(), cn(), twMerge(), cva()",
            r#"(?i)(?:clsx|classNames|cn|twMerge|cva)\s*\(\s*["']([^"']+)["']"#,
            &[React],
        ),
        regex_pattern(
            "vue-class-binding",
            "Vue class binding",
            r#"Vue class binding: :class="...""#,
            r#"(?i):class\s*=\s*["']([^"']+)["']"#,
            &[Vue],
        ),
        regex_pattern(
            "angular-class-binding",
            "Angular class binding",
            r#"Angular class binding: [class]="...""#,
            r#"(?i)\[class\]\s*=\s*["']([^"']+)["']"#,
            &[Angular],
        ),
        Arc::new(NgClassPattern),
        regex_pattern(
            "angular-class-toggle",
            "Angular class toggle",
            r#"Angular single-class binding: [class.name]="...""#,
            r"\[class\.([A-Za-z0-9_-]+)\]",
            &[Angular],
        ),
        regex_pattern(
            "svelte-class-directive",
            "Svelte class directive",
            "Svelte class directive: class:name={...}",
            r"\bclass:([A-Za-z0-9_-]+)",
            &[Svelte],
        ),
        regex_pattern(
            "tailwind-apply",
            "Tailwind @apply",
            "Tailwind @apply directive: @apply foo bar;",
            r"(?i)@apply\s+([^;]+);",
            &[Css],
        ),
    ]
}

/// Angular `[ngClass]="{ 'a b': cond, c: other }"`.
///
/// Every object key is reported as its own match so the detector sees clean
/// class tokens instead of `'a':`-style fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NgClassPattern;

struct NgClassRegexes {
    attribute: Regex,
    key: Regex,
}

fn ng_class_regexes() -> &'static NgClassRegexes {
    static REGEXES: OnceLock<NgClassRegexes> = OnceLock::new();
    // SAFETY: These regex patterns are hardcoded and covered by tests.
    REGEXES.get_or_init(|| NgClassRegexes {
        attribute: Regex::new(r#"(?i)\[ngClass\]\s*=\s*["']\s*\{([^}]*)\}"#)
            .expect("Hardcoded regex pattern is valid"),
        key: Regex::new(
            r#"(?:^|,)\s*(?:'([^']*)'|"([^"]*)"|([A-Za-z_][A-Za-z0-9_-]*))\s*:"#,
        )
        .expect("Hardcoded regex pattern is valid"),
    })
}

impl ClassPattern for NgClassPattern {
    fn id(&self) -> &str {
        "angular-ngclass"
    }

    fn name(&self) -> &str {
        "Angular ngClass"
    }

    fn description(&self) -> &str {
        r#"Angular ngClass object keys: [ngClass]="{'a': cond}""#
    }

    fn applicable_categories(&self) -> &[FileCategory] {
        &[FileCategory::Angular]
    }

    fn find_matches<'a>(&self, line: &'a str) -> Vec<PatternMatch<'a>> {
        let regexes = ng_class_regexes();
        let mut matches = Vec::new();

        for caps in regexes.attribute.captures_iter(line) {
            let (Some(full), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            for key_caps in regexes.key.captures_iter(body.as_str()) {
                let Some(key) = key_caps.get(1).or_else(|| key_caps.get(2)).or_else(|| key_caps.get(3))
                else {
                    continue;
                };
                if key.as_str().trim().is_empty() {
                    continue;
                }
                matches.push(PatternMatch {
                    full_match: full.as_str(),
                    classes_string: key.as_str(),
                    match_index: full.start(),
                    classes_offset: body.start() + key.start() - full.start(),
                });
            }
        }

        matches
    }
}
