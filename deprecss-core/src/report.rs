//! Output formatting - plaintext and JSON.
//!
//! Plain output uses the `path:line:col: message` shape editors and CI log
//! viewers turn into links. Lines and columns are 1-based here.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::builder::AnalysisResult;
use crate::types::{ClassUsage, DeclarationMap, DeprecatedClass};

fn usage_line(result: &AnalysisResult, path: &std::path::Path, usage: &ClassUsage) -> String {
    format!(
        "{}:{}:{}: deprecated class .{}: {}",
        result.relative(path).display(),
        usage.line + 1,
        usage.start_char + 1,
        usage.class_name,
        usage.deprecated_info.message
    )
}

fn declaration_line(class: &DeprecatedClass) -> String {
    match class.line {
        Some(line) => format!(
            ".{}: {} ({}:{})",
            class.class_name,
            class.message,
            class.source_file.display(),
            line
        ),
        None => format!(
            ".{}: {} ({})",
            class.class_name,
            class.message,
            class.source_file.display()
        ),
    }
}

/// Renders the analysis as plain text.
pub fn render_plain(result: &AnalysisResult) -> String {
    let mut out = String::new();

    for file in &result.files {
        for usage in &file.usages {
            let _ = writeln!(out, "{}", usage_line(result, &file.path, usage));
        }
    }

    if result.has_usages() {
        let _ = writeln!(
            out,
            "\nFound {} deprecated class usage(s) in {} file(s).",
            result.usage_count(),
            result.files.len()
        );
    } else {
        let _ = writeln!(out, "No deprecated class usages found.");
    }
    let _ = writeln!(
        out,
        "{} deprecated class(es) declared in {} stylesheet(s); {} source file(s) checked.",
        result.declarations.len(),
        result.stylesheets_scanned,
        result.files_scanned
    );

    out
}

/// Renders declarations only, ordered by class name.
pub fn render_declarations(declarations: &DeclarationMap) -> String {
    let mut classes: Vec<&DeprecatedClass> = declarations.values().collect();
    classes.sort_by(|a, b| a.class_name.cmp(&b.class_name));

    if classes.is_empty() {
        return "No deprecated classes declared.\n".to_string();
    }

    let mut out = format!("DEPRECATED CLASSES ({}):\n", classes.len());
    for class in classes {
        let _ = writeln!(out, "- {}", declaration_line(class));
    }
    out
}

/// Builds the JSON document printed by [`print_json`].
pub fn render_json(result: &AnalysisResult) -> Value {
    let files: Vec<Value> = result
        .files
        .iter()
        .map(|file| {
            json!({
                "path": result.relative(&file.path),
                "category": file.category,
                "usages": file.usages,
            })
        })
        .collect();

    json!({
        "root": result.root,
        "declarations": result.sorted_declarations(),
        "files": files,
        "summary": {
            "usages": result.usage_count(),
            "files": result.files.len(),
            "filesScanned": result.files_scanned,
            "stylesheetsScanned": result.stylesheets_scanned,
        },
    })
}

/// Prints the analysis in plain text format.
pub fn print_plain(result: &AnalysisResult) {
    print!("{}", render_plain(result));
}

/// Prints declarations in plain text format.
pub fn print_declarations(declarations: &DeclarationMap) {
    print!("{}", render_declarations(declarations));
}

/// Prints the analysis in JSON format.
///
/// Falls back to a minimal summary if serialization fails.
pub fn print_json(result: &AnalysisResult) {
    match serde_json::to_string_pretty(&render_json(result)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"usages\": {}}}", result.usage_count());
        }
    }
}
