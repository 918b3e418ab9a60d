//! Suggestion daemon
//!
//! Keeps vocabularies loaded in memory and answers prefix queries over a Unix
//! socket. Loaded tries are never modified; a reload builds a new engine and
//! swaps it in.

use crate::index::types::{CorpusMode, VOCAB_FILE};
use crate::query::SuggestionEngine;
use crate::server::protocol::{
    Request, Response, StatusResponse, SuggestResponse, read_message, write_message,
};
use crate::server::{get_pid_path, get_socket_path};
use crate::utils::{AppConfig, get_vocab_dir, normalize_prefix, vocab_dir_in};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use lru::LruCache;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a detached daemon reports a failed start
const ERROR_LOG: &str = "/tmp/oggled-error.log";

type VocabKey = (PathBuf, CorpusMode);

/// Loaded engine with its per-prefix result cache
struct CachedEngine {
    engine: SuggestionEngine,
    /// Normalized prefix -> full (max_suggestions) result
    cache: Mutex<LruCache<String, Vec<String>>>,
}

impl CachedEngine {
    fn new(engine: SuggestionEngine, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            engine,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The suggestion daemon
pub struct SuggestServer {
    /// Loaded engines by canonical corpus root and mode
    engines: RwLock<HashMap<VocabKey, CachedEngine>>,
    stats: ServerStats,
    shutdown: AtomicBool,
    config: AppConfig,
    socket_path: PathBuf,
    pid_path: PathBuf,
    /// Vocabularies root; the app data directory when unset
    vocab_root: Option<PathBuf>,
}

impl SuggestServer {
    /// Create a server on the default socket, wrapped in Arc
    pub fn new(config: AppConfig) -> Arc<Self> {
        Self::with_paths(config, get_socket_path(), get_pid_path())
    }

    pub fn with_paths(config: AppConfig, socket_path: PathBuf, pid_path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            engines: RwLock::new(HashMap::new()),
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
            config,
            socket_path,
            pid_path,
            vocab_root: None,
        })
    }

    /// Server that looks for vocabularies under `vocab_root`
    pub fn with_vocab_root(
        config: AppConfig,
        socket_path: PathBuf,
        pid_path: PathBuf,
        vocab_root: PathBuf,
    ) -> Arc<Self> {
        let mut server = Self::with_paths(config, socket_path, pid_path);
        if let Some(server) = Arc::get_mut(&mut server) {
            server.vocab_root = Some(vocab_root);
        }
        server
    }

    /// Install an already built engine for a corpus
    pub fn preload(&self, root_path: &Path, mode: CorpusMode, engine: SuggestionEngine) -> Result<()> {
        let root = root_path.canonicalize().context("Invalid corpus path")?;
        let mut engines = self
            .engines
            .write()
            .map_err(|_| anyhow::anyhow!("engine table poisoned"))?;
        engines.insert(
            (root, mode),
            CachedEngine::new(engine, self.config.suggestion_cache_size),
        );
        Ok(())
    }

    /// Start the server (blocking)
    pub fn run(self: &Arc<Self>) -> Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Remove stale socket file
        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path)?;
        }

        fs::write(&self.pid_path, format!("{}", std::process::id()))?;

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind to {}", self.socket_path.display()))?;

        // Set socket permissions (user only)
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.socket_path, fs::Permissions::from_mode(0o600))?;
        }

        info!("listening on {}", self.socket_path.display());

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
                    let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

                    let server = Arc::clone(self);
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            warn!("connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }

        let _ = fs::remove_file(&self.socket_path);
        let _ = fs::remove_file(&self.pid_path);
        info!("stopped");

        Ok(())
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            let request: Request = match read_message(&mut reader) {
                Ok(req) => req,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Client disconnected
                    break;
                }
                Err(e) => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                // Wake the accept loop so it notices the flag
                let _ = UnixStream::connect(&self.socket_path);
                break;
            }
        }

        Ok(())
    }

    fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Suggest {
                prefix,
                root_path,
                mode,
                limit,
            } => self.handle_suggest(&prefix, &root_path, mode, limit),

            Request::Status => self.handle_status(),

            Request::Reload { root_path, mode } => self.handle_reload(&root_path, mode),

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }

            Request::Ping => Response::Pong,
        }
    }

    fn handle_suggest(&self, prefix: &str, root_path: &Path, mode: CorpusMode, limit: usize) -> Response {
        let start = Instant::now();

        let root = match root_path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                return Response::Error {
                    message: format!("Invalid path: {}", e),
                }
            }
        };

        self.stats.queries_served.fetch_add(1, Ordering::Relaxed);

        let empty = |start: Instant| {
            Response::Suggest(SuggestResponse {
                suggestions: Vec::new(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                cached: false,
            })
        };

        if limit == 0 {
            return empty(start);
        }

        match self.ensure_loaded(&root, mode) {
            Ok(true) => {}
            // Not indexed yet; nothing is cached so a later build is picked up
            Ok(false) => return empty(start),
            Err(e) => {
                return Response::Error {
                    message: format!("Failed to load vocabulary: {}", e),
                };
            }
        }

        let Ok(engines) = self.engines.read() else {
            return Response::Error {
                message: "engine table poisoned".to_string(),
            };
        };
        let Some(cached) = engines.get(&(root, mode)) else {
            return Response::Error {
                message: "Vocabulary not found after loading".to_string(),
            };
        };

        let max = cached.engine.max_suggestions();
        let limit = limit.min(max);

        // A prefix with non-letters cannot match anything
        let Some(normalized) = normalize_prefix(prefix) else {
            return empty(start);
        };

        let hit = cached
            .cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&normalized).cloned());
        if let Some(mut suggestions) = hit {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            suggestions.truncate(limit);
            return Response::Suggest(SuggestResponse {
                suggestions,
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                cached: true,
            });
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        // Cache the full bound; smaller limits are prefixes of it
        let full = cached.engine.suggest_n(&normalized, max);
        let mut suggestions = full.clone();
        suggestions.truncate(limit);

        if let Ok(mut cache) = cached.cache.lock() {
            cache.put(normalized, full);
        }

        Response::Suggest(SuggestResponse {
            suggestions,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            cached: false,
        })
    }

    fn handle_status(&self) -> Response {
        let Ok(engines) = self.engines.read() else {
            return Response::Error {
                message: "engine table poisoned".to_string(),
            };
        };

        let total_words = engines.values().map(|c| c.engine.word_count()).sum();
        let memory_bytes = engines
            .values()
            .map(|c| c.engine.trie().memory_bytes() as u64)
            .sum();
        let mut loaded_roots: Vec<(PathBuf, CorpusMode)> = engines.keys().cloned().collect();
        loaded_roots.sort();

        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            vocabularies_loaded: engines.len(),
            total_words,
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            memory_bytes,
            loaded_roots,
        })
    }

    fn handle_reload(&self, root_path: &Path, mode: CorpusMode) -> Response {
        let root = match root_path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                return Response::Reloaded {
                    success: false,
                    message: format!("Invalid path: {}", e),
                }
            }
        };

        // Build the replacement before taking the write lock
        let engine = match self.load_engine(&root, mode) {
            Ok(engine) => engine,
            Err(e) => {
                return Response::Reloaded {
                    success: false,
                    message: format!("Failed to reload: {}", e),
                }
            }
        };

        match self.engines.write() {
            Ok(mut engines) => match engine {
                Some(engine) => {
                    let words = engine.word_count();
                    engines.insert(
                        (root.clone(), mode),
                        CachedEngine::new(engine, self.config.suggestion_cache_size),
                    );
                    info!("reloaded {} words for {} ({})", words, root.display(), mode);
                    Response::Reloaded {
                        success: true,
                        message: format!("Reloaded {} words", words),
                    }
                }
                None => {
                    engines.remove(&(root.clone(), mode));
                    info!("unloaded {} ({}): no vocabulary", root.display(), mode);
                    Response::Reloaded {
                        success: true,
                        message: "No vocabulary on disk; unloaded".to_string(),
                    }
                }
            },
            Err(_) => Response::Reloaded {
                success: false,
                message: "engine table poisoned".to_string(),
            },
        }
    }

    fn vocab_dir(&self, root: &Path, mode: CorpusMode) -> Result<PathBuf> {
        match &self.vocab_root {
            Some(base) => Ok(vocab_dir_in(base, root, mode)),
            None => get_vocab_dir(root, mode),
        }
    }

    /// Engine for a corpus, or None while it has no vocabulary on disk
    fn load_engine(&self, root: &Path, mode: CorpusMode) -> Result<Option<SuggestionEngine>> {
        let vocab_dir = self.vocab_dir(root, mode)?;
        if !vocab_dir.join(VOCAB_FILE).exists() {
            return Ok(None);
        }
        Ok(Some(SuggestionEngine::from_dir(&vocab_dir, &self.config)))
    }

    /// Ensure the vocabulary for a corpus is loaded.
    ///
    /// Returns false when the corpus has not been indexed yet.
    fn ensure_loaded(&self, root: &Path, mode: CorpusMode) -> Result<bool> {
        let key = (root.to_path_buf(), mode);
        {
            let engines = self
                .engines
                .read()
                .map_err(|_| anyhow::anyhow!("engine table poisoned"))?;
            if engines.contains_key(&key) {
                return Ok(true);
            }
        }

        // Load without holding the lock so other vocabularies keep answering
        info!("loading {} vocabulary for {}", mode, root.display());
        let Some(engine) = self.load_engine(root, mode)? else {
            debug!("no {} vocabulary for {} yet", mode, root.display());
            return Ok(false);
        };
        info!("loaded {} words for {}", engine.word_count(), root.display());

        let mut engines = self
            .engines
            .write()
            .map_err(|_| anyhow::anyhow!("engine table poisoned"))?;

        // Another connection may have loaded it meanwhile
        engines
            .entry(key)
            .or_insert_with(|| CachedEngine::new(engine, self.config.suggestion_cache_size));
        Ok(true)
    }
}

/// Daemonize the current process
pub fn daemonize(config: AppConfig) -> Result<()> {
    // Fork using double-fork technique for proper daemonization
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            // Second fork to prevent acquiring a controlling terminal
            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    unsafe {
                        libc::close(0);
                        libc::close(1);
                        libc::close(2);

                        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
                        if null != -1 {
                            libc::dup2(null, 0);
                            libc::dup2(null, 1);
                            libc::dup2(null, 2);
                            if null > 2 {
                                libc::close(null);
                            }
                        }
                    }

                    // Change to root directory to avoid holding mounts
                    let _ = std::env::set_current_dir("/");

                    let server = SuggestServer::new(config);
                    if let Err(e) = server.run() {
                        // stderr is closed at this point
                        let _ = fs::write(ERROR_LOG, format!("{:#}", e));
                    }
                    std::process::exit(0);
                }
                _ => {
                    // First child exits immediately
                    std::process::exit(0);
                }
            }
        }
        _ => {
            // Parent process - wait for first child then exit
            unsafe {
                let mut status: libc::c_int = 0;
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

/// Run the daemon in the foreground (for debugging)
pub fn run_foreground(config: AppConfig) -> Result<()> {
    let server = SuggestServer::new(config);
    server.run()
}

/// Stop the running daemon
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();

    if !pid_path.exists() {
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&pid_path)?;
    let pid: i32 = pid_str.trim().parse()?;

    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 {
            thread::sleep(Duration::from_millis(500));

            if libc::kill(pid, 0) == 0 {
                thread::sleep(Duration::from_secs(1));
                if libc::kill(pid, 0) == 0 {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }

    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build::build_vocabulary_into;
    use crate::index::trie::Trie;
    use crate::index::types::IndexConfig;
    use crate::server::SuggestClient;

    fn connect(socket: &Path) -> SuggestClient {
        for _ in 0..100 {
            if let Some(client) = SuggestClient::connect_to(socket) {
                return client;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("daemon did not come up on {}", socket.display());
    }

    #[test]
    fn test_serves_suggestions_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir(&corpus).unwrap();
        let socket = dir.path().join("oggle.sock");
        let pid = dir.path().join("oggle.pid");

        let server = SuggestServer::with_paths(AppConfig::default(), socket.clone(), pid.clone());
        let trie: Trie = ["search", "series", "setup", "other"].into_iter().collect();
        server
            .preload(&corpus, CorpusMode::Html, SuggestionEngine::new(trie, 10))
            .unwrap();

        let handle = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run())
        };

        let mut client = connect(&socket);
        client.ping().unwrap();

        let first = client.suggest("SE", &corpus, CorpusMode::Html, 2).unwrap();
        assert_eq!(first.suggestions, vec!["search", "series"]);
        assert!(!first.cached);

        let second = client.suggest("se", &corpus, CorpusMode::Html, 10).unwrap();
        assert_eq!(second.suggestions, vec!["search", "series", "setup"]);
        assert!(second.cached);

        let zero = client.suggest("se", &corpus, CorpusMode::Html, 0).unwrap();
        assert!(zero.suggestions.is_empty());
        assert!(!zero.cached);

        let none = client.suggest("s e", &corpus, CorpusMode::Html, 5).unwrap();
        assert!(none.suggestions.is_empty());

        let status = client.status().unwrap();
        assert_eq!(status.vocabularies_loaded, 1);
        assert_eq!(status.total_words, 4);
        assert_eq!(status.queries_served, 4);
        assert!(status.cache_hit_rate > 0.0);

        client.shutdown().unwrap();
        handle.join().unwrap().unwrap();
        assert!(!socket.exists());
        assert!(!pid.exists());
    }

    #[test]
    fn test_invalid_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let server = SuggestServer::with_paths(
            AppConfig::default(),
            dir.path().join("s.sock"),
            dir.path().join("s.pid"),
        );
        let response = server.handle_request(Request::Suggest {
            prefix: "se".to_string(),
            root_path: dir.path().join("does-not-exist"),
            mode: CorpusMode::Html,
            limit: 10,
        });
        assert!(matches!(response, Response::Error { .. }));
    }

    fn suggestions(server: &SuggestServer, prefix: &str, root: &Path, limit: usize) -> Vec<String> {
        match server.handle_request(Request::Suggest {
            prefix: prefix.to_string(),
            root_path: root.to_path_buf(),
            mode: CorpusMode::Html,
            limit,
        }) {
            Response::Suggest(response) => response.suggestions,
            other => panic!("unexpected response: {:?}", other),
        }
    }

    fn loaded(server: &SuggestServer) -> usize {
        match server.handle_request(Request::Status) {
            Response::Status(status) => status.vocabularies_loaded,
            other => panic!("unexpected response: {:?}", other),
        }
    }

    /// Corpus with one page, a server over a private vocabularies root, and
    /// the directory its HTML vocabulary goes to
    fn indexed_setup() -> (tempfile::TempDir, PathBuf, Arc<SuggestServer>, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir(&corpus).unwrap();
        fs::write(corpus.join("volcano.html"), "<p>Volcano</p>").unwrap();

        let vocab_root = dir.path().join("vocabularies");
        let server = SuggestServer::with_vocab_root(
            AppConfig::default(),
            dir.path().join("s.sock"),
            dir.path().join("s.pid"),
            vocab_root.clone(),
        );
        let vocab_dir = vocab_dir_in(&vocab_root, &corpus, CorpusMode::Html);
        (dir, corpus, server, vocab_dir)
    }

    fn build(corpus: &Path, vocab_dir: &Path) {
        build_vocabulary_into(corpus, vocab_dir, CorpusMode::Html, &IndexConfig::default(), true)
            .unwrap();
    }

    #[test]
    fn test_zero_limit_matches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let server = SuggestServer::with_paths(
            AppConfig::default(),
            dir.path().join("s.sock"),
            dir.path().join("s.pid"),
        );
        let engine = SuggestionEngine::new(["search", "series", "setup"].into_iter().collect(), 10);
        server
            .preload(dir.path(), CorpusMode::Html, engine.clone())
            .unwrap();

        assert_eq!(suggestions(&server, "se", dir.path(), 0), engine.suggest_n("se", 0));
        assert!(suggestions(&server, "se", dir.path(), 0).is_empty());
        assert_eq!(suggestions(&server, "se", dir.path(), 2), engine.suggest_n("se", 2));
    }

    #[test]
    fn test_vocabulary_built_after_first_query() {
        let (_dir, corpus, server, vocab_dir) = indexed_setup();

        assert!(suggestions(&server, "volc", &corpus, 10).is_empty());
        assert_eq!(loaded(&server), 0);

        build(&corpus, &vocab_dir);
        assert_eq!(suggestions(&server, "volc", &corpus, 10), vec!["volcano"]);
        assert_eq!(loaded(&server), 1);
    }

    #[test]
    fn test_reload_follows_vocabulary_on_disk() {
        let (_dir, corpus, server, vocab_dir) = indexed_setup();
        build(&corpus, &vocab_dir);
        assert_eq!(suggestions(&server, "volc", &corpus, 10), vec!["volcano"]);

        fs::write(corpus.join("volcanic.html"), "<p>Volcanic</p>").unwrap();
        build(&corpus, &vocab_dir);
        let reload = server.handle_request(Request::Reload {
            root_path: corpus.clone(),
            mode: CorpusMode::Html,
        });
        assert!(matches!(reload, Response::Reloaded { success: true, .. }));
        assert_eq!(suggestions(&server, "volc", &corpus, 10), vec!["volcanic", "volcano"]);

        fs::remove_dir_all(&vocab_dir).unwrap();
        let reload = server.handle_request(Request::Reload {
            root_path: corpus.clone(),
            mode: CorpusMode::Html,
        });
        assert!(matches!(reload, Response::Reloaded { success: true, .. }));
        assert_eq!(loaded(&server), 0);
        assert!(suggestions(&server, "volc", &corpus, 10).is_empty());
    }
}
