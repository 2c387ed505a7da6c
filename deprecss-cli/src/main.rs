//! deprecss CLI - reports usages of deprecated CSS classes.
//!
//! Features:
//! - `--deprecated` declarations collected from every stylesheet in the project
//! - Usage detection across HTML, JSX/TSX, Vue, Angular, Svelte, Astro and templates
//! - Settings from `deprecss.toml`, overridable per run
//! - Plain `path:line:col` or JSON output
//! - Watch mode backed by the live declaration cache

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use deprecss_core::{
    init_logging, is_css_file, load_config, print_declarations, print_json, print_plain,
    should_scan_file, AnalysisResult, DeclarationCache, Deprecss, FileChangeEvent, FileChangeKind,
    LogFormat, Settings, StylesheetMatcher,
};

/// Quiet period that groups an editor's burst of writes into one re-run.
const DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(author, version, about = "Finds usages of deprecated CSS classes")]
pub struct Cli {
    /// Path to the root of the project
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Directory names to skip, in addition to the configured ones
    #[arg(long = "exclude-dir", value_name = "DIR")]
    exclude_dirs: Vec<String>,

    /// Stylesheet globs to scan, replacing the configured ones
    #[arg(long = "css-glob", value_name = "GLOB")]
    css_globs: Vec<String>,

    /// Only report classes found by the registered patterns
    #[arg(long)]
    no_fallback: bool,

    /// Print the deprecated declarations and exit
    #[arg(long)]
    list_declarations: bool,

    /// Exit with code 1 when any usage is found
    #[arg(long)]
    deny: bool,

    /// Keep running and re-report whenever stylesheets or sources change
    #[arg(long)]
    watch: bool,

    /// Emit logs as JSON lines instead of compact text
    #[arg(long)]
    log_json: bool,
}

/// Loads `deprecss.toml` from `root` and applies command-line overrides.
fn resolve_settings(cli: &Cli, root: &Path) -> Result<Settings> {
    let config = load_config(root).context("Failed to load deprecss.toml")?;
    let mut settings = Settings::validate(config);

    settings.exclude_dirs.extend(cli.exclude_dirs.iter().cloned());
    if !cli.css_globs.is_empty() {
        settings.css_glob = cli.css_globs.clone();
    }
    if cli.no_fallback {
        settings.fallback_search = false;
    }

    Ok(settings)
}

fn emit(cli: &Cli, result: &AnalysisResult) {
    if cli.json {
        print_json(result);
    } else {
        print_plain(result);
    }
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deprecss internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 101.");
    }));

    let cli = Cli::parse();

    // Logs go to stderr, stdout carries the report (respects RUST_LOG)
    init_logging(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    });

    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve project path: {}", cli.path.display()))?;
    let settings = resolve_settings(&cli, &root)?;
    let analysis = Deprecss::new(&root).with_settings(settings);

    if cli.list_declarations {
        let (declarations, stylesheets) = analysis.declarations()?;
        info!(stylesheets, declarations = declarations.len(), "declarations collected");

        if cli.json {
            let mut sorted: Vec<_> = declarations.values().collect();
            sorted.sort_by(|a, b| a.class_name.cmp(&b.class_name));
            println!("{}", serde_json::to_string_pretty(&sorted)?);
        } else {
            print_declarations(&declarations);
        }
        return Ok(());
    }

    if cli.watch {
        return watch(&cli, &analysis);
    }

    let result = analysis.analyze()?;
    emit(&cli, &result);

    if cli.deny && result.has_usages() {
        std::process::exit(1);
    }
    Ok(())
}

/// Maps a notify event kind onto a cache change; access and other
/// metadata-only events are ignored.
fn change_kind(kind: &EventKind) -> Option<FileChangeKind> {
    match kind {
        EventKind::Create(_) => Some(FileChangeKind::Created),
        EventKind::Modify(_) => Some(FileChangeKind::Changed),
        EventKind::Remove(_) => Some(FileChangeKind::Deleted),
        _ => None,
    }
}

/// True if any directory between `root` and `path` is excluded.
fn in_excluded_dir(root: &Path, path: &Path, exclude_dirs: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|name| exclude_dirs.iter().any(|d| d == name))
        })
}

/// Feeds one watcher event into the cache.
///
/// Returns true when a source document changed, which needs a re-run even
/// if no declaration did.
fn apply_event(
    cache: &DeclarationCache,
    matcher: &StylesheetMatcher,
    analysis: &Deprecss,
    event: &Event,
) -> bool {
    let Some(kind) = change_kind(&event.kind) else {
        debug!(kind = ?event.kind, "ignoring watcher event");
        return false;
    };

    let mut sources_changed = false;
    for path in &event.paths {
        if is_css_file(path) && matcher.matches(path) {
            cache.handle_file_change(&FileChangeEvent::new(path, kind));
        }
        if should_scan_file(path)
            && !in_excluded_dir(analysis.root(), path, &analysis.settings().exclude_dirs)
        {
            sources_changed = true;
        }
    }
    sources_changed
}

/// Runs until the watcher channel closes, re-reporting after every change.
fn watch(cli: &Cli, analysis: &Deprecss) -> Result<()> {
    let matcher = StylesheetMatcher::new(analysis.root(), &analysis.settings().scan_options())
        .context("Invalid stylesheet globs")?;

    let cache = DeclarationCache::new();
    let (declarations, _) = analysis.declarations()?;
    cache.replace_all(declarations.into_values());

    // Starts dirty so the first report prints before any change arrives.
    let dirty = Arc::new(AtomicBool::new(true));
    {
        let dirty = Arc::clone(&dirty);
        cache.on_update(move |update| {
            debug!(size = update.size, files = ?update.modified_files, "declarations changed");
            dirty.store(true, Ordering::SeqCst);
        });
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // Receiver gone means we are shutting down.
            let _ = tx.send(res);
        },
        Config::default(),
    )
    .context("Failed to create file watcher")?;
    watcher
        .watch(analysis.root(), RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", analysis.root().display()))?;

    eprintln!(
        "Watching {} for changes... (Ctrl+C to stop)",
        analysis.root().display()
    );

    loop {
        if dirty.swap(false, Ordering::SeqCst) {
            let result = analysis.analyze_with((*cache.classes()).clone(), cache.files().len())?;
            emit(cli, &result);
        }

        let Ok(first) = rx.recv() else {
            break;
        };
        let mut batch = vec![first];
        while let Ok(next) = rx.recv_timeout(DEBOUNCE) {
            batch.push(next);
        }

        for res in batch {
            match res {
                Ok(event) => {
                    if apply_event(&cache, &matcher, analysis, &event) {
                        dirty.store(true, Ordering::SeqCst);
                    }
                }
                Err(e) => warn!(error = %e, "watch error"),
            }
        }
    }

    Ok(())
}
