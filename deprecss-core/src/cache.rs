//! Live cache of deprecated class declarations.
//!
//! Holds the current [`DeclarationMap`] plus a reverse index from stylesheet
//! to the class names it declares, so a changed file can be dropped and
//! re-read without rescanning the workspace.
//!
//! # Concurrency
//!
//! - Mutations are serialised by a writer mutex held for the whole
//!   operation, including listener notification.
//! - State sits behind an `RwLock` and the map itself is an `Arc` updated
//!   copy-on-write. Readers take a point-in-time snapshot and never observe
//!   the gap between the remove and the re-insert of `refresh_file`.
//! - Listeners run synchronously on the mutating thread, in mutation order.
//!   They may read the cache but must not mutate it (the writer mutex is not
//!   reentrant).

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::IndexSet;
use tracing::{debug, error};

use crate::scan::parse_file;
use crate::types::{DeclarationMap, DeprecatedClass, FileChangeEvent, FileChangeKind};

/// Notification emitted after a mutation changed the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    /// Number of classes in the cache after the mutation
    pub size: usize,
    /// Stylesheets whose declarations changed (empty for `clear`)
    pub modified_files: Vec<PathBuf>,
}

/// Handle returned by [`DeclarationCache::on_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&CacheUpdate) + Send + Sync>;

#[derive(Debug, Default)]
struct CacheState {
    classes: Arc<DeclarationMap>,
    by_file: HashMap<PathBuf, HashSet<String>>,
}

impl CacheState {
    /// Upserts `classes`; returns the distinct source files touched, in
    /// first-seen order.
    fn insert(&mut self, classes: impl IntoIterator<Item = DeprecatedClass>) -> IndexSet<PathBuf> {
        let mut touched = IndexSet::new();
        let map = Arc::make_mut(&mut self.classes);

        for class in classes {
            // A class declared again elsewhere leaves its previous file.
            if let Some(previous) = map.get(&class.class_name) {
                if previous.source_file != class.source_file {
                    if let Some(names) = self.by_file.get_mut(&previous.source_file) {
                        names.remove(&class.class_name);
                        if names.is_empty() {
                            self.by_file.remove(&previous.source_file);
                        }
                    }
                }
            }

            self.by_file
                .entry(class.source_file.clone())
                .or_default()
                .insert(class.class_name.clone());
            touched.insert(class.source_file.clone());
            map.insert(class.class_name.clone(), class);
        }

        touched
    }

    /// Drops every class declared by `path`; returns how many were removed.
    fn remove_file(&mut self, path: &Path) -> usize {
        let Some(names) = self.by_file.remove(path) else {
            return 0;
        };

        let map = Arc::make_mut(&mut self.classes);
        names
            .iter()
            .filter(|name| {
                let owned = map
                    .get(name.as_str())
                    .is_some_and(|class| class.source_file == path);
                owned && map.remove(name.as_str()).is_some()
            })
            .count()
    }
}

/// Thread-safe cache of deprecated class declarations.
///
/// ```rust,ignore
/// let cache = Arc::new(DeclarationCache::new());
/// cache.replace_all(scan(&root, &ScanOptions::default()).into_values());
/// let id = cache.on_update(|update| println!("{} classes", update.size));
/// cache.handle_file_change(&FileChangeEvent::new(path, FileChangeKind::Changed));
/// cache.unsubscribe(id);
/// ```
pub struct DeclarationCache {
    writer: Mutex<()>,
    state: RwLock<CacheState>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl Default for DeclarationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeclarationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclarationCache")
            .field("classes", &self.len())
            .field("files", &self.files().len())
            .finish()
    }
}

impl DeclarationCache {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(()),
            state: RwLock::new(CacheState::default()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    // Poisoning only means a panic happened elsewhere while a guard was held;
    // every mutation leaves the state consistent, so keep going.

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point-in-time snapshot of all declarations.
    pub fn classes(&self) -> Arc<DeclarationMap> {
        Arc::clone(&self.read_state().classes)
    }

    pub fn get(&self, class_name: &str) -> Option<DeprecatedClass> {
        self.read_state().classes.get(class_name).cloned()
    }

    pub fn has(&self, class_name: &str) -> bool {
        self.read_state().classes.contains_key(class_name)
    }

    pub fn len(&self) -> usize {
        self.read_state().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().classes.is_empty()
    }

    /// Stylesheets currently contributing declarations, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.read_state().by_file.keys().cloned().collect();
        files.sort();
        files
    }

    /// Upserts declarations (last write wins).
    ///
    /// Emits one notification listing every source file touched.
    pub fn add(&self, classes: impl IntoIterator<Item = DeprecatedClass>) {
        let _writer = self.lock_writer();

        let (size, touched) = {
            let mut state = self.write_state();
            let touched = state.insert(classes);
            (state.classes.len(), touched)
        };

        if !touched.is_empty() {
            self.notify(CacheUpdate {
                size,
                modified_files: touched.into_iter().collect(),
            });
        }
    }

    /// Removes every class declared by `path`.
    ///
    /// Returns the number of classes removed and notifies only if non-zero.
    pub fn remove_by_file(&self, path: &Path) -> usize {
        let _writer = self.lock_writer();

        let (size, removed) = {
            let mut state = self.write_state();
            let removed = state.remove_file(path);
            (state.classes.len(), removed)
        };

        if removed > 0 {
            self.notify(CacheUpdate {
                size,
                modified_files: vec![path.to_path_buf()],
            });
        }

        removed
    }

    /// Re-reads `path` and replaces its declarations.
    ///
    /// Read, remove and re-insert form one writer critical section, so
    /// concurrent refreshes of a file commit in the order they read it.
    /// Readers only wait for the final swap. An unreadable file simply loses
    /// its declarations. Returns the number of classes the file now declares.
    pub fn refresh_file(&self, path: &Path) -> usize {
        let _writer = self.lock_writer();

        let parsed = parse_file(path);
        let count = parsed.len();

        let (size, removed, touched) = {
            let mut state = self.write_state();
            let removed = state.remove_file(path);
            let touched = state.insert(parsed);
            (state.classes.len(), removed, touched)
        };

        debug!(file = %path.display(), removed, added = count, "refreshed stylesheet");

        if removed > 0 || !touched.is_empty() {
            let mut modified_files = vec![path.to_path_buf()];
            modified_files.extend(touched.into_iter().filter(|f| f != path));
            self.notify(CacheUpdate {
                size,
                modified_files,
            });
        }

        count
    }

    /// Applies a watcher event: deleted files are dropped, created or
    /// changed files are refreshed.
    pub fn handle_file_change(&self, event: &FileChangeEvent) {
        debug!(file = %event.path.display(), kind = ?event.kind, "handling file change");

        match event.kind {
            FileChangeKind::Deleted => {
                self.remove_by_file(&event.path);
            }
            FileChangeKind::Created | FileChangeKind::Changed => {
                self.refresh_file(&event.path);
            }
        }
    }

    /// Empties the cache; notifies `{ size: 0, modified_files: [] }` only if
    /// it held anything.
    pub fn clear(&self) {
        let _writer = self.lock_writer();

        let had_classes = {
            let mut state = self.write_state();
            let had = !state.classes.is_empty();
            *state = CacheState::default();
            had
        };

        if had_classes {
            self.notify(CacheUpdate {
                size: 0,
                modified_files: Vec::new(),
            });
        }
    }

    /// Replaces the whole content, as after a full rescan.
    ///
    /// Readers see either the old or the new content. One notification lists
    /// the files of the new content.
    pub fn replace_all(&self, classes: impl IntoIterator<Item = DeprecatedClass>) {
        let _writer = self.lock_writer();

        let (size, had_classes, touched) = {
            let mut fresh = CacheState::default();
            let touched = fresh.insert(classes);

            let mut state = self.write_state();
            let had = !state.classes.is_empty();
            *state = fresh;
            (state.classes.len(), had, touched)
        };

        if had_classes || !touched.is_empty() {
            self.notify(CacheUpdate {
                size,
                modified_files: touched.into_iter().collect(),
            });
        }
    }

    /// Registers a listener invoked after every notifying mutation.
    pub fn on_update<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CacheUpdate) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Calls every listener; a panicking listener is logged and skipped.
    fn notify(&self, update: CacheUpdate) {
        let listeners: Vec<(ListenerId, Listener)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&update))).is_err() {
                error!(listener = id.0, "cache update listener panicked");
            }
        }
    }
}
