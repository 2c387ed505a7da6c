//! File categories and the extension allow-list.
//!
//! A category selects which class patterns apply to a document and whether
//! a file is eligible for usage detection at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Coarse classification of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Html,
    React,
    Vue,
    Angular,
    Svelte,
    Astro,
    Template,
    Css,
    Dotnet,
}

impl FileCategory {
    pub const ALL: [FileCategory; 9] = [
        FileCategory::Html,
        FileCategory::React,
        FileCategory::Vue,
        FileCategory::Angular,
        FileCategory::Svelte,
        FileCategory::Astro,
        FileCategory::Template,
        FileCategory::Css,
        FileCategory::Dotnet,
    ];

    /// File name suffixes belonging to this category.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileCategory::Html => &[".html", ".htm"],
            FileCategory::React => &[".jsx", ".tsx", ".js", ".ts"],
            FileCategory::Vue => &[".vue"],
            FileCategory::Angular => &[".component.ts", ".component.html"],
            FileCategory::Svelte => &[".svelte"],
            FileCategory::Astro => &[".astro"],
            FileCategory::Template => &[".php", ".blade.php", ".erb", ".twig", ".mdx"],
            FileCategory::Css => &[".css", ".scss", ".less"],
            FileCategory::Dotnet => &[".cshtml", ".razor", ".aspx"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Html => "html",
            FileCategory::React => "react",
            FileCategory::Vue => "vue",
            FileCategory::Angular => "angular",
            FileCategory::Svelte => "svelte",
            FileCategory::Astro => "astro",
            FileCategory::Template => "template",
            FileCategory::Css => "css",
            FileCategory::Dotnet => "dotnet",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown file category `{}`", s))
    }
}

/// All supported file name suffixes as a flat list.
pub fn all_supported_extensions() -> Vec<&'static str> {
    FileCategory::ALL
        .iter()
        .flat_map(|c| c.extensions().iter().copied())
        .collect()
}

/// Gets the file category for a path.
///
/// The longest matching suffix wins, so `app.component.ts` is Angular rather
/// than React and `view.blade.php` is a template.
pub fn file_category(path: &Path) -> Option<FileCategory> {
    let name = path.file_name()?.to_str()?;

    FileCategory::ALL
        .iter()
        .flat_map(|c| c.extensions().iter().map(move |ext| (*c, *ext)))
        .filter(|(_, ext)| name.ends_with(ext))
        .max_by_key(|(_, ext)| ext.len())
        .map(|(c, _)| c)
}

/// Checks if a file should be scanned for usages based on its extension.
pub fn should_scan_file(path: &Path) -> bool {
    file_category(path).is_some()
}

/// Checks if a file is a stylesheet that may declare deprecations.
pub fn is_css_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| FileCategory::Css.extensions().iter().any(|ext| name.ends_with(ext)))
}
