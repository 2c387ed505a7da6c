//! End-to-end scenario suite for deprecss-core.

use crate::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn declare(names: &[&str]) -> DeclarationMap {
    names
        .iter()
        .map(|n| (n.to_string(), DeprecatedClass::new(*n, "deprecated", "/styles.css")))
        .collect()
}

fn names(usages: &[ClassUsage]) -> Vec<&str> {
    usages.iter().map(|u| u.class_name.as_str()).collect()
}

// Scenario 1: Parsing a single rule
#[test]
fn test_parse_single_rule_scenario() {
    let result = parse_css(
        ".old-button { --deprecated: \"Use .btn-primary instead\"; color: red; }",
        "/f.css",
    );

    assert_eq!(result.classes.len(), 1);
    assert_eq!(result.classes[0].class_name, "old-button");
    assert_eq!(result.classes[0].message, "Use .btn-primary instead");
    assert_eq!(result.classes[0].source_file, Path::new("/f.css"));
    assert!(result.errors.is_empty());
}

// Scenario 2: Selector kinds and grouping
#[test]
fn test_selector_filter_and_grouping() {
    assert!(parse_css("#id { --deprecated: \"x\"; }", "/a.css").classes.is_empty());

    let mixed = parse_css("#id, .c { --deprecated: \"x\"; }", "/a.css");
    assert_eq!(mixed.classes.len(), 1);
    assert_eq!(mixed.classes[0].class_name, "c");

    let grouped = parse_css(".a, .b { --deprecated: \"m\"; }", "/a.css");
    let found: Vec<(&str, &str)> = grouped
        .classes
        .iter()
        .map(|c| (c.class_name.as_str(), c.message.as_str()))
        .collect();
    assert_eq!(found, vec![("a", "m"), ("b", "m")]);
}

// Scenario 3: Exact span of an HTML usage
#[test]
fn test_html_usage_span() {
    let usages = ClassDetector::default().find_usages(
        "<div class=\"old-button\">Hello</div>",
        &declare(&["old-button"]),
        None,
    );

    assert_eq!(usages.len(), 1);
    let u = &usages[0];
    assert_eq!((u.class_name.as_str(), u.line, u.start_char, u.end_char), ("old-button", 0, 12, 22));
}

// Scenario 4: @apply with declared and undeclared utilities
#[test]
fn test_apply_scenario() {
    let usages = ClassDetector::default().find_usages(
        "@apply old-button legacy-padding text-white;",
        &declare(&["old-button", "legacy-padding"]),
        None,
    );

    assert_eq!(names(&usages), vec!["old-button", "legacy-padding"]);
}

// Scenario 5: Whole-word matching for arbitrary suffixes
#[test]
fn test_whole_word_property() {
    let detector = ClassDetector::default();
    for class in ["a", "btn", "tw-badge", "x_1", "old-button"] {
        let decls = declare(&[class]);
        for suffix in ["-suffix", "-2", "_x", "large"] {
            let longer = format!("<p class=\"{}{}\">", class, suffix);
            assert!(
                detector.find_usages(&longer, &decls, None).is_empty(),
                "{} matched inside {}",
                class,
                longer
            );
        }
        let exact = format!("<p class=\"{}\">", class);
        assert_eq!(detector.find_usages(&exact, &decls, None).len(), 1);
    }
}

// Scenario 6: Empty declaration map short-circuits
#[test]
fn test_empty_declarations() {
    let detector = ClassDetector::default();
    for text in ["", "<div class=\"anything\">", "@apply a b c;"] {
        assert!(detector.find_usages(text, &DeclarationMap::new(), None).is_empty());
    }
}

// Scenario 7: Idempotent, duplicate-free detection over a mixed document
#[test]
fn test_detection_is_stable_and_unique() {
    let detector = ClassDetector::default();
    let decls = declare(&["old", "legacy", "gone-1"]);
    let text = [
        "<template>",
        "  <div :class=\"old legacy\" class=\"gone-1 old\"></div>",
        "  <span className={`legacy ${x}`}></span>",
        "</template>",
        "<style>.x { @apply old gone-1; }</style>",
    ]
    .join("\n");

    let first = detector.find_usages(&text, &decls, Some(FileCategory::Vue));
    let second = detector.find_usages(&text, &decls, Some(FileCategory::Vue));
    assert_eq!(first, second);

    let keys: HashSet<(usize, usize, &str)> = first
        .iter()
        .map(|u| (u.line, u.start_char, u.class_name.as_str()))
        .collect();
    assert_eq!(keys.len(), first.len());

    // Lines come out in order.
    assert!(first.windows(2).all(|w| w[0].line <= w[1].line));
}

// Scenario 8: Scan + cache + detector, the way an editor host wires them
#[test]
fn test_live_workspace_flow() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let sheet = root.join("styles/legacy.css");
    write_file(
        &sheet,
        ".x { --deprecated: \"x is gone\"; }\n.y { --deprecated: \"y is gone\"; }",
    );
    write_file(&root.join("node_modules/lib/lib.css"), ".z { --deprecated: \"vendor\"; }");

    let cache = Arc::new(DeclarationCache::new());
    cache.replace_all(scan(root, &ScanOptions::default()).into_values());
    assert!(cache.has("x") && cache.has("y"));
    assert!(!cache.has("z"));

    // Re-run detection on every update, like a server re-validating open documents.
    let detector = ClassDetector::default();
    let document = "<p class=\"x y\"></p>";
    let reports = Arc::new(Mutex::new(Vec::new()));
    {
        let (cache_ref, reports) = (Arc::clone(&cache), Arc::clone(&reports));
        cache.on_update(move |update| {
            let usages = detector.find_usages(document, &cache_ref.classes(), Some(FileCategory::Html));
            reports
                .lock()
                .unwrap()
                .push((update.modified_files.clone(), usages.len()));
        });
    }

    fs::write(&sheet, ".x { --deprecated: \"x is gone\"; }").unwrap();
    cache.handle_file_change(&FileChangeEvent::new(&sheet, FileChangeKind::Changed));

    assert!(cache.has("x"));
    assert!(!cache.has("y"));
    assert_eq!(*reports.lock().unwrap(), vec![(vec![sheet.clone()], 1)]);

    fs::remove_file(&sheet).unwrap();
    cache.handle_file_change(&FileChangeEvent::new(&sheet, FileChangeKind::Deleted));

    assert!(cache.is_empty());
    assert_eq!(reports.lock().unwrap().last(), Some(&(vec![sheet], 0)));
}

// Scenario 9: Config-driven analysis end to end
#[test]
fn test_config_driven_analysis() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_file(
        &root.join(CONFIG_FILE),
        r#"
css_glob = ["theme/**/*.scss"]
exclude_dirs = ["legacy"]
severity = "error"

[[patterns]]
id = "twig-attr"
regex = "attr=\\{ class: '([^']+)' \\}"
categories = ["template"]
"#,
    );
    write_file(&root.join("theme/buttons.scss"), ".btn { &.btn--ghost { --deprecated: 'Use .btn-outline'; } }");
    write_file(&root.join("other.css"), ".ignored { --deprecated: \"not in glob\"; }");
    write_file(&root.join("views/page.twig"), "{{ attr={ class: 'btn btn--ghost' } }}");
    write_file(&root.join("legacy/old.html"), "<p class=\"btn--ghost\"></p>");

    let settings = Settings::validate(load_config(root).unwrap());
    assert_eq!(settings.severity, Severity::Error);

    let result = Deprecss::new(root).with_settings(settings).analyze().unwrap();

    let mut declared: Vec<&str> = result.declarations.keys().map(String::as_str).collect();
    declared.sort();
    assert_eq!(declared, vec!["btn", "btn--ghost"]);

    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].path.ends_with("views/page.twig"));
    assert_eq!(names(&result.files[0].usages), vec!["btn", "btn--ghost"]);
}

// Scenario 10: Project root discovery feeds the scan
#[test]
fn test_root_discovery_then_scan() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("web");
    write_file(&project.join("package.json"), "{}");
    write_file(&project.join("src/styles/a.less"), ".old { --deprecated: \"new\"; }");
    fs::create_dir_all(project.join("src/components")).unwrap();

    let root = find_project_root(&project.join("src/components"));
    assert_eq!(root, project);

    let map = scan(&root, &ScanOptions::default());
    assert_eq!(map["old"].line, Some(1));
}
