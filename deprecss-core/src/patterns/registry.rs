//! Ordered collection of class patterns keyed by id.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{builtin_patterns, ClassPattern};
use crate::category::FileCategory;

/// Registry of [`ClassPattern`]s in registration order.
///
/// Registering an id that already exists replaces the pattern in place.
/// Registries are read-mostly: build one at startup, wrap it in an `Arc`
/// and share it without locking.
#[derive(Clone, Default)]
pub struct PatternRegistry {
    patterns: IndexMap<String, Arc<dyn ClassPattern>>,
}

impl PatternRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in patterns.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for pattern in builtin_patterns() {
            registry.register_arc(pattern);
        }
        registry
    }

    /// Registers a pattern, replacing any pattern with the same id.
    pub fn register<P: ClassPattern + 'static>(&mut self, pattern: P) {
        self.register_arc(Arc::new(pattern));
    }

    /// Registers an already shared pattern.
    pub fn register_arc(&mut self, pattern: Arc<dyn ClassPattern>) {
        self.patterns.insert(pattern.id().to_string(), pattern);
    }

    /// Removes a pattern by id. Returns true if it was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.patterns.shift_remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ClassPattern>> {
        self.patterns.get(id)
    }

    /// All patterns in registration order.
    pub fn all(&self) -> Vec<&dyn ClassPattern> {
        self.patterns.values().map(|p| p.as_ref()).collect()
    }

    /// Patterns that apply to `category` (including universal ones).
    pub fn for_category(&self, category: FileCategory) -> Vec<&dyn ClassPattern> {
        self.patterns
            .values()
            .filter(|p| p.applies_to(category))
            .map(|p| p.as_ref())
            .collect()
    }

    /// Registered ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl std::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("patterns", &self.patterns.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::RegexPattern;

    fn pattern(id: &str, description: &str) -> RegexPattern {
        RegexPattern::new(id, id, description, r#"x="([^"]+)""#).unwrap()
    }

    #[test]
    fn test_builtins_in_order() {
        let registry = PatternRegistry::with_builtins();
        let ids: Vec<&str> = registry.ids().collect();

        assert_eq!(
            ids,
            vec![
                "html-class",
                "react-classname",
                "react-template-literal",
                "class-utils",
                "vue-class-binding",
                "angular-class-binding",
                "angular-ngclass",
                "angular-class-toggle",
                "svelte-class-directive",
                "tailwind-apply",
            ]
        );
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = PatternRegistry::new();
        registry.register(pattern("a", "first"));
        registry.register(pattern("b", "second"));
        registry.register(pattern("a", "replaced"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description(), "replaced");
    }

    #[test]
    fn test_unregister() {
        let mut registry = PatternRegistry::with_builtins();
        let before = registry.len();

        assert!(registry.unregister("tailwind-apply"));
        assert!(!registry.unregister("tailwind-apply"));
        assert_eq!(registry.len(), before - 1);
        assert!(registry.get("tailwind-apply").is_none());
    }

    #[test]
    fn test_for_category_includes_universal_patterns() {
        let mut registry = PatternRegistry::new();
        registry.register(pattern("universal", ""));
        registry.register(pattern("css-only", "").with_categories([FileCategory::Css]));

        let css: Vec<&str> = registry.for_category(FileCategory::Css).iter().map(|p| p.id()).collect();
        let vue: Vec<&str> = registry.for_category(FileCategory::Vue).iter().map(|p| p.id()).collect();

        assert_eq!(css, vec!["universal", "css-only"]);
        assert_eq!(vue, vec!["universal"]);
        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn test_builtin_category_selection() {
        let registry = PatternRegistry::with_builtins();
        let react: Vec<&str> = registry
            .for_category(FileCategory::React)
            .iter()
            .map(|p| p.id())
            .collect();

        assert_eq!(react, vec!["react-classname", "react-template-literal", "class-utils"]);

        let css: Vec<&str> = registry.for_category(FileCategory::Css).iter().map(|p| p.id()).collect();
        assert_eq!(css, vec!["tailwind-apply"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = PatternRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.for_category(FileCategory::Html).is_empty());
    }
}
