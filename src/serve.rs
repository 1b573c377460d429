//! Dev server and source watcher.
//!
//! [`run`] serves `<root>/out` over HTTP with tower-http's `ServeDir` and
//! keeps a [`SiteWatcher`] alive for as long as the server runs. The
//! watcher observes the source root recursively and rebuilds each changed
//! file on its own, through the same classification the full build uses.
//!
//! ```text
//! notify callback ──► std channel ──► rebuild thread
//!                                        │ coalesce per path (debounce_ms)
//!                                        └─► build::rebuild(site, entry)
//! ```
//!
//! Rebuilds run on one dedicated thread, so they never overlap. A failing
//! rebuild is logged and the watcher keeps going.

use crate::build::{self, BuildError, Rebuilt};
use crate::scan::Site;
use crate::types::FileEntry;
use axum::Router;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
    #[error("cannot watch source tree: {0}")]
    Watch(#[from] notify::Error),
    #[error("cannot start rebuild thread: {0}")]
    Spawn(std::io::Error),
}

/// Router serving the output tree. Directories resolve to `index.html`,
/// unknown paths are 404.
pub fn router(out_dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(out_dir))
        .layer(TraceLayer::new_for_http())
}

/// Serve the site and rebuild on change until Ctrl-C.
pub async fn run(site: Arc<Site>) -> Result<(), ServeError> {
    let server = &site.config().server;
    let addr = format!("{}:{}", server.host, server.port);

    let _watcher = SiteWatcher::start(Arc::clone(&site))?;

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(address = %addr, root = %site.output().root().display(), "serving");

    axum::serve(listener, router(site.output().root()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Serve)?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

// =========================================================================
// Watcher
// =========================================================================

enum Message {
    Fs(notify::Result<Event>),
    Stop,
}

/// Watches the source root and rebuilds changed files.
///
/// Dropping the watcher stops observation and joins the rebuild thread.
pub struct SiteWatcher {
    watcher: Option<RecommendedWatcher>,
    control: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl SiteWatcher {
    pub fn start(site: Arc<Site>) -> Result<Self, ServeError> {
        Self::start_with(site, |_, _| {})
    }

    /// Start watching, calling `on_rebuild` after every rebuild attempt.
    pub fn start_with<F>(site: Arc<Site>, on_rebuild: F) -> Result<Self, ServeError>
    where
        F: FnMut(&FileEntry, &Result<Rebuilt, BuildError>) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = events.send(Message::Fs(res));
        })?;
        watcher.watch(site.root(), RecursiveMode::Recursive)?;

        let window = Duration::from_millis(site.config().server.debounce_ms);
        let worker = thread::Builder::new()
            .name("mdsite-rebuild".to_string())
            .spawn(move || rebuild_loop(&site, &rx, window, on_rebuild))
            .map_err(ServeError::Spawn)?;

        tracing::debug!(debounce_ms = window.as_millis() as u64, "watching source tree");
        Ok(Self {
            watcher: Some(watcher),
            control: tx,
            worker: Some(worker),
        })
    }
}

impl Drop for SiteWatcher {
    fn drop(&mut self) {
        self.watcher.take();
        let _ = self.control.send(Message::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn rebuild_loop<F>(site: &Site, rx: &mpsc::Receiver<Message>, window: Duration, mut on_rebuild: F)
where
    F: FnMut(&FileEntry, &Result<Rebuilt, BuildError>),
{
    let mut pending = Pending::new(window);
    loop {
        let message = match pending.next_deadline() {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match message {
            Ok(Message::Fs(Ok(event))) => {
                let now = Instant::now();
                for path in changed_paths(&event) {
                    pending.record(path.clone(), now);
                }
            }
            Ok(Message::Fs(Err(err))) => tracing::warn!(%err, "watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => break,
        }

        for path in pending.drain_ready(Instant::now()) {
            let Some(entry) = site.entry_for(&path) else {
                tracing::debug!(path = %path.display(), "ignoring change");
                continue;
            };
            tracing::info!(path = %entry.path.display(), "rebuilding");
            let result = build::rebuild(site, &entry);
            match &result {
                Ok(rebuilt) => tracing::debug!(outputs = rebuilt.outputs.len(), "rebuilt"),
                Err(err) => tracing::error!(
                    path = %entry.path.display(),
                    category = err.category(),
                    %err,
                    "rebuild failed"
                ),
            }
            on_rebuild(&entry, &result);
        }
    }
    tracing::debug!("rebuild thread stopped");
}

/// Paths a notify event asks us to rebuild. Only creations and
/// modifications count; removals and access events rebuild nothing.
pub fn changed_paths(event: &Event) -> &[PathBuf] {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => event.paths.as_slice(),
        _ => &[],
    }
}

/// Per-path coalescing: each new event for a path pushes its deadline out
/// by one window; a path is released once its deadline passes.
struct Pending {
    window: Duration,
    deadlines: BTreeMap<PathBuf, Instant>,
}

impl Pending {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: BTreeMap::new(),
        }
    }

    fn record(&mut self, path: PathBuf, now: Instant) {
        self.deadlines.insert(path, now + self.window);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    fn drain_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let ready: Vec<PathBuf> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.deadlines.remove(path);
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind};
    use tower::ServiceExt;

    #[test]
    fn changed_paths_by_event_kind() {
        let path = PathBuf::from("/site/index.md");
        let modify = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.clone());
        let create = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path.clone());
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(path.clone());

        assert_eq!(changed_paths(&modify), &[path.clone()]);
        assert_eq!(changed_paths(&create), &[path]);
        assert!(changed_paths(&remove).is_empty());
        assert!(changed_paths(&access).is_empty());
    }

    #[test]
    fn repeated_events_coalesce_into_one() {
        let mut pending = Pending::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let path = PathBuf::from("/site/index.md");

        pending.record(path.clone(), t0);
        pending.record(path.clone(), t0 + Duration::from_millis(50));

        assert!(pending.drain_ready(t0 + Duration::from_millis(120)).is_empty());
        assert_eq!(
            pending.drain_ready(t0 + Duration::from_millis(150)),
            vec![path]
        );
        assert!(pending.drain_ready(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(pending.next_deadline(), None);
    }

    #[test]
    fn paths_released_independently() {
        let mut pending = Pending::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let a = PathBuf::from("/site/a.md");
        let b = PathBuf::from("/site/b.md");

        pending.record(a.clone(), t0);
        pending.record(b.clone(), t0 + Duration::from_millis(80));

        assert_eq!(pending.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert_eq!(pending.drain_ready(t0 + Duration::from_millis(100)), vec![a]);
        assert_eq!(pending.drain_ready(t0 + Duration::from_millis(180)), vec![b]);
    }

    #[test]
    fn zero_window_releases_immediately() {
        let mut pending = Pending::new(Duration::ZERO);
        let now = Instant::now();
        pending.record(PathBuf::from("/site/x.md"), now);
        assert_eq!(pending.drain_ready(now).len(), 1);
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn serves_output_tree() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_file(tmp.path(), "out/index.html", "<p>home</p>");
        write_file(tmp.path(), "out/docs/index.html", "<p>docs</p>");
        write_file(tmp.path(), "out/style.css", "body{}");
        let out = tmp.path().join("out");

        assert_eq!(get(router(&out), "/").await, (StatusCode::OK, "<p>home</p>".into()));
        assert_eq!(
            get(router(&out), "/docs/").await,
            (StatusCode::OK, "<p>docs</p>".into())
        );
        assert_eq!(get(router(&out), "/style.css").await.1, "body{}");
        assert_eq!(get(router(&out), "/missing.html").await.0, StatusCode::NOT_FOUND);
    }
}
