//! deprecss LSP Server - live diagnostics for deprecated CSS classes.
//!
//! Provides IDE integration with:
//! - Diagnostics on every open document, refreshed as you type
//! - Stylesheet watching: editing a `--deprecated` rule re-validates all open documents
//! - Settings from `deprecss.toml` or the client's `deprecss` configuration section
//!
//! Never panics on client input; failures are logged and the document is skipped.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, RwLock};
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info, warn};

use deprecss_core::{
    analyze_file, find_project_root, init_logging, is_css_file, load_config, scan,
    should_scan_file, ClassDetector, ClassUsage, DeclarationCache, DeprecssConfig,
    FileChangeEvent, FileChangeKind, LogFormat, Settings, Severity, StylesheetMatcher,
};

/// `source` of every published diagnostic.
const DIAGNOSTIC_SOURCE: &str = "deprecss";

/// Client configuration section holding our settings.
const SETTINGS_SECTION: &str = "deprecss";

const STYLESHEET_WATCHERS: &[&str] = &["**/*.css", "**/*.scss", "**/*.less"];

fn lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Converts one usage into a diagnostic spanning the class name.
fn to_diagnostic(usage: &ClassUsage, severity: Severity) -> Diagnostic {
    let info = &usage.deprecated_info;

    // Points at the declaring selector when the stylesheet line is known.
    let related_information = Url::from_file_path(&info.source_file).ok().map(|uri| {
        let line = info.line.map_or(0, |l| l.saturating_sub(1)) as u32;
        vec![DiagnosticRelatedInformation {
            location: Location {
                uri,
                range: Range::new(Position::new(line, 0), Position::new(line, 0)),
            },
            message: format!(".{} is declared deprecated here", usage.class_name),
        }]
    });

    Diagnostic {
        range: Range::new(
            Position::new(usage.line as u32, usage.start_char as u32),
            Position::new(usage.line as u32, usage.end_char as u32),
        ),
        severity: Some(lsp_severity(severity)),
        code: Some(NumberOrString::String(usage.class_name.clone())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: format!("Deprecated: {}", info.message),
        related_information,
        tags: Some(vec![DiagnosticTag::DEPRECATED]),
        data: Some(json!({
            "className": usage.class_name,
            "sourceFile": info.source_file,
        })),
    }
}

/// Reads our section out of a client settings payload.
///
/// Accepts `{ "deprecss": {...} }` or the bare section. Returns `None` when
/// the payload carries nothing usable.
fn config_from_json(value: &Value) -> Option<DeprecssConfig> {
    let section = value.get(SETTINGS_SECTION).unwrap_or(value);
    if !section.is_object() {
        return None;
    }

    match serde_json::from_value(section.clone()) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "ignoring malformed client settings");
            None
        }
    }
}

fn change_kind(kind: FileChangeType) -> FileChangeKind {
    if kind == FileChangeType::CREATED {
        FileChangeKind::Created
    } else if kind == FileChangeType::DELETED {
        FileChangeKind::Deleted
    } else {
        FileChangeKind::Changed
    }
}

/// Workspace folder first, then the legacy root URI.
#[allow(deprecated)]
fn initial_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok())
        .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()))
}

/// Shared server state, also owned by the revalidation task.
struct State {
    client: Client,
    cache: Arc<DeclarationCache>,
    /// Full text of every open document
    documents: RwLock<HashMap<Url, String>>,
    settings: RwLock<Settings>,
    detector: RwLock<ClassDetector>,
    root: RwLock<Option<PathBuf>>,
    /// Settings pushed by the client; take precedence over deprecss.toml
    client_config: RwLock<Option<DeprecssConfig>>,
}

impl State {
    /// Re-derives settings and detector from the client config or deprecss.toml.
    async fn reload_settings(&self) {
        let root = self.root.read().await.clone();

        let config = match self.client_config.read().await.clone() {
            Some(config) => Some(config),
            None => match root.as_deref().map(load_config).transpose() {
                Ok(config) => config.flatten(),
                Err(e) => {
                    warn!(error = %e, "failed to load deprecss.toml, using defaults");
                    None
                }
            },
        };

        let settings = Settings::validate(config);
        let detector = match settings.detector() {
            Ok(detector) => detector,
            Err(e) => {
                error!(error = %e, "invalid custom pattern, using built-in patterns");
                ClassDetector::default().with_fallback_search(settings.fallback_search)
            }
        };

        *self.detector.write().await = detector;
        *self.settings.write().await = settings;
    }

    /// Full stylesheet scan on a blocking worker, then swaps the cache content.
    async fn rescan(&self) {
        let Some(root) = self.root.read().await.clone() else {
            warn!("no workspace root, cannot scan stylesheets");
            return;
        };
        let options = self.settings.read().await.scan_options();

        info!(root = %root.display(), "scanning stylesheets");
        match tokio::task::spawn_blocking(move || scan(&root, &options)).await {
            Ok(classes) => {
                self.cache.replace_all(classes.into_values());
                self.client
                    .log_message(
                        MessageType::INFO,
                        format!("deprecss: {} deprecated classes", self.cache.len()),
                    )
                    .await;
            }
            Err(e) => error!(error = %e, "stylesheet scan task failed"),
        }
    }

    async fn validate(&self, uri: &Url, text: &str) {
        let (enable, severity) = {
            let settings = self.settings.read().await;
            (settings.enable, settings.severity)
        };

        if !enable {
            self.client.publish_diagnostics(uri.clone(), Vec::new(), None).await;
            return;
        }

        let Ok(path) = uri.to_file_path() else {
            debug!(%uri, "skipping non-file document");
            return;
        };
        if !should_scan_file(&path) {
            return;
        }

        let detector = self.detector.read().await.clone();
        let report = analyze_file(&detector, &path, text, &self.cache.classes());
        let diagnostics = report
            .usages
            .iter()
            .map(|usage| to_diagnostic(usage, severity))
            .collect();

        self.client.publish_diagnostics(uri.clone(), diagnostics, None).await;
    }

    async fn revalidate_all(&self) {
        let documents: Vec<(Url, String)> = self
            .documents
            .read()
            .await
            .iter()
            .map(|(uri, text)| (uri.clone(), text.clone()))
            .collect();

        for (uri, text) in documents {
            self.validate(&uri, &text).await;
        }
    }

    /// Applies client watcher events to the cache on a blocking worker.
    async fn apply_file_changes(&self, changes: Vec<FileEvent>) {
        let Some(root) = self.root.read().await.clone() else {
            return;
        };
        let matcher = match StylesheetMatcher::new(&root, &self.settings.read().await.scan_options()) {
            Ok(matcher) => matcher,
            Err(e) => {
                error!(error = %e, "invalid stylesheet globs");
                return;
            }
        };

        let events: Vec<FileChangeEvent> = changes
            .into_iter()
            .filter_map(|change| {
                let path = change.uri.to_file_path().ok()?;
                (is_css_file(&path) && matcher.matches(&path))
                    .then(|| FileChangeEvent::new(path, change_kind(change.typ)))
            })
            .collect();
        if events.is_empty() {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let applied = tokio::task::spawn_blocking(move || {
            for event in &events {
                cache.handle_file_change(event);
            }
        })
        .await;

        match applied {
            Ok(()) => info!(size = self.cache.len(), "cache updated"),
            Err(e) => error!(error = %e, "file change task failed"),
        }
    }
}

/// deprecss Language Server.
struct Backend {
    state: Arc<State>,
}

impl Backend {
    fn new(client: Client) -> Self {
        let cache = Arc::new(DeclarationCache::new());
        let state = Arc::new(State {
            client,
            cache: Arc::clone(&cache),
            documents: RwLock::new(HashMap::new()),
            settings: RwLock::new(Settings::default()),
            detector: RwLock::new(ClassDetector::default()),
            root: RwLock::new(None),
            client_config: RwLock::new(None),
        });

        // Cache listeners are synchronous; hand updates to an async task
        // that re-validates every open document.
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        cache.on_update(move |update| {
            debug!(size = update.size, files = update.modified_files.len(), "declarations changed");
            let _ = tx.send(());
        });

        let task_state = Arc::clone(&state);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Coalesce a burst of updates into one pass.
                while rx.try_recv().is_ok() {}
                task_state.revalidate_all().await;
            }
        });

        Self { state }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let initial = initial_root(&params);
        let root = initial.as_deref().map(find_project_root);
        info!(
            initial = ?initial,
            resolved = ?root,
            "initializing"
        );
        *self.state.root.write().await = root;

        if let Some(config) = params.initialization_options.as_ref().and_then(config_from_json) {
            *self.state.client_config.write().await = Some(config);
        }
        self.state.reload_settings().await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        ..Default::default()
                    },
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "deprecss-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let watchers = STYLESHEET_WATCHERS
            .iter()
            .map(|glob| FileSystemWatcher {
                glob_pattern: GlobPattern::String(glob.to_string()),
                kind: None,
            })
            .collect();
        let registration = Registration {
            id: "deprecss-stylesheets".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(DidChangeWatchedFilesRegistrationOptions {
                watchers,
            })
            .ok(),
        };
        if let Err(e) = self.state.client.register_capability(vec![registration]).await {
            warn!(error = %e, "client refused stylesheet watchers");
        }

        self.state.rescan().await;
        self.state.revalidate_all().await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        info!("shutdown requested");
        self.state.cache.clear();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        self.state.documents.write().await.insert(uri.clone(), text.clone());
        self.state.validate(&uri, &text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let uri = params.text_document.uri;
        self.state
            .documents
            .write()
            .await
            .insert(uri.clone(), change.text.clone());
        self.state.validate(&uri, &change.text).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state.documents.write().await.remove(&uri);
        self.state.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(config) = config_from_json(&params.settings) else {
            return;
        };

        let before = self.state.settings.read().await.scan_options();
        *self.state.client_config.write().await = Some(config);
        self.state.reload_settings().await;
        info!("configuration updated");

        if self.state.settings.read().await.scan_options() != before {
            self.state.rescan().await;
        }
        self.state.revalidate_all().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        self.state.apply_file_changes(params.changes).await;
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook for graceful error handling
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deprecss-lsp internal error: {}", info);
    }));

    // stdout is the LSP transport; logs go to stderr
    init_logging(LogFormat::Json);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
