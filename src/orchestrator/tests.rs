use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use super::*;
use crate::compiler::{
    CompilationProblem, CompilationResult, Compiler, CompilerSettings, CopyCompiler,
    ProblemHandler, ProblemSink,
};
use crate::resolver::{ReloadingResolver, Resolve, ResolveError};
use crate::store::{MemoryStore, ResourceReader, ResourceStore};
use crate::utils::name::qualified_to_resource;
use crate::utils::path::normalize_path;
use crate::watch::{ChangeEvent, ChangeKind, EntryKind, Listener, Monitor, Observer};

const ROOT: &str = "/work/src";

/// Writes `<stem>.out` and `<stem>$Inner.out` for every source, and reports an
/// error for sources whose content contains "error".
struct Scripted;

impl Compiler for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn source_extension(&self) -> &str {
        "src"
    }

    fn target_extension(&self) -> &str {
        "out"
    }

    fn compile_with(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        settings: &CompilerSettings,
        handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult {
        let mut sink = ProblemSink::new(settings, handler);
        for name in sources {
            let content = reader.get_bytes(name).unwrap_or_default();
            let output = self.output_name(name);
            store.write(&output, &content);
            store.write(&output.replace(".out", "$Inner.out"), b"inner");
            if String::from_utf8_lossy(&content).contains("error")
                && !sink.report(CompilationProblem::error(name.as_str(), "scripted failure").at(1, 1))
            {
                break;
            }
        }
        sink.finish()
    }
}

struct Exploding;

impl Compiler for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn source_extension(&self) -> &str {
        "src"
    }

    fn target_extension(&self) -> &str {
        "out"
    }

    fn compile_with(
        &self,
        sources: &[String],
        _reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        _settings: &CompilerSettings,
        _handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult {
        store.write(&self.output_name(&sources[0]), b"partial");
        panic!("backend bug");
    }
}

/// Records every batch handed to the wrapped backend.
struct Counting {
    inner: Arc<dyn Compiler>,
    batches: parking_lot::Mutex<Vec<Vec<String>>>,
}

impl Counting {
    fn new(inner: Arc<dyn Compiler>) -> Self {
        Self {
            inner,
            batches: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

impl Compiler for Counting {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn source_extension(&self) -> &str {
        self.inner.source_extension()
    }

    fn target_extension(&self) -> &str {
        self.inner.target_extension()
    }

    fn compile_with(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        settings: &CompilerSettings,
        handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult {
        self.batches.lock().push(sources.to_vec());
        self.inner.compile_with(sources, reader, store, settings, handler)
    }
}

#[derive(Default)]
struct Reloads(AtomicUsize);

impl Reloads {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ReloadListener for Reloads {
    fn handle_reload(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    listener: CompilingListener,
    sources: Arc<MemoryStore>,
    output: Arc<MemoryStore>,
    reloads: Arc<Reloads>,
}

fn harness(compiler: Arc<dyn Compiler>) -> Harness {
    let sources = Arc::new(MemoryStore::new());
    let output = Arc::new(MemoryStore::new());
    let reloads = Arc::new(Reloads::default());
    let listener =
        CompilingListener::new(ROOT, compiler, output.clone()).with_reader(sources.clone());
    listener.add_reload_listener(reloads.clone());
    Harness {
        listener,
        sources,
        output,
        reloads,
    }
}

impl Harness {
    /// Feed one synthetic pass.
    fn pass(&self, events: &[(ChangeKind, &str)]) {
        let root = Path::new(ROOT);
        self.listener.on_start(root);
        for (kind, name) in events {
            let path: PathBuf = name.split('/').fold(root.to_path_buf(), |p, s| p.join(s));
            self.listener
                .on_event(&ChangeEvent::new(*kind, EntryKind::File, path));
        }
        self.listener.on_stop(root);
    }
}

use ChangeKind::{Changed, Created, Deleted};

// ============================================================================
// batches
// ============================================================================

#[test]
fn test_successful_batch_publishes() {
    let h = harness(Arc::new(Scripted));
    h.sources.write("a/One.src", b"one");
    h.sources.write("a/Two.src", b"two");

    h.pass(&[(Created, "a/One.src"), (Created, "a/Two.src")]);

    assert_eq!(h.output.read("a/One.out").as_deref(), Some(&b"one"[..]));
    assert_eq!(h.output.read("a/Two.out").as_deref(), Some(&b"two"[..]));
    assert_eq!(h.reloads.count(), 1);
    assert!(h.listener.last_result().unwrap().is_clean());
    assert!(!h.listener.store().in_transaction());
}

#[test]
fn test_failed_batch_rolls_back_every_output() {
    let h = harness(Arc::new(Scripted));
    h.sources.write("a/Good.src", b"fine");
    h.sources.write("a/Bad.src", b"error here");

    h.pass(&[(Created, "a/Good.src"), (Created, "a/Bad.src")]);

    assert!(h.output.is_empty(), "left behind: {:?}", h.output.names());
    assert_eq!(h.reloads.count(), 1);
    let result = h.listener.last_result().unwrap();
    assert_eq!(result.failed_files(), vec!["a/Bad.src"]);
}

#[test]
fn test_rollback_spares_unrelated_outputs() {
    let h = harness(Arc::new(Scripted));
    h.output.write("a/Old.out", b"published");
    h.sources.write("a/Bad.src", b"error");

    h.pass(&[(Changed, "a/Bad.src")]);

    assert_eq!(h.output.names(), vec!["a/Old.out".to_string()]);
}

#[test]
fn test_batch_order_and_dedup() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let log = seen.clone();
    let handler: Arc<dyn ProblemHandler> = Arc::new(move |p: &CompilationProblem| {
        log.lock().push(p.file.clone());
        true
    });

    let sources = Arc::new(MemoryStore::with_entries([
        ("b.src", "error"),
        ("a.src", "error"),
    ]));
    let listener = CompilingListener::new(ROOT, Arc::new(Scripted), Arc::new(MemoryStore::new()))
        .with_reader(sources)
        .with_problem_handler(handler);

    let root = Path::new(ROOT);
    listener.on_start(root);
    for (kind, name) in [(Changed, "a.src"), (Created, "b.src"), (Changed, "b.src")] {
        listener.on_event(&ChangeEvent::new(kind, EntryKind::File, root.join(name)));
    }
    listener.on_stop(root);

    // Created before changed, each name once.
    assert_eq!(*seen.lock(), vec!["b.src".to_string(), "a.src".to_string()]);
}

#[test]
fn test_max_errors_stops_batch_early() {
    let h = harness(Arc::new(Scripted));
    let listener = CompilingListener::new(ROOT, Arc::new(Scripted), h.output.clone())
        .with_reader(h.sources.clone())
        .with_settings(CompilerSettings::default().with_max_errors(1));
    h.sources.write("a.src", b"error");
    h.sources.write("b.src", b"error");

    let root = Path::new(ROOT);
    listener.on_start(root);
    listener.on_event(&ChangeEvent::new(Created, EntryKind::File, root.join("a.src")));
    listener.on_event(&ChangeEvent::new(Created, EntryKind::File, root.join("b.src")));
    listener.on_stop(root);

    assert_eq!(listener.last_result().unwrap().errors.len(), 1);
    assert!(h.output.is_empty());
}

#[test]
fn test_backend_panic_becomes_error() {
    let h = harness(Arc::new(Exploding));
    h.sources.write("a/X.src", b"x");

    h.pass(&[(Created, "a/X.src")]);

    let result = h.listener.last_result().unwrap();
    assert!(result.has_errors());
    assert!(result.errors[0].message.contains("panicked"));
    assert!(h.output.is_empty());
    assert_eq!(h.reloads.count(), 1);
    assert!(!h.listener.store().in_transaction());
}

// ============================================================================
// deletions and passes without work
// ============================================================================

#[test]
fn test_delete_removes_output_and_reloads() {
    let h = harness(Arc::new(Scripted));
    h.output.write("a/Gone.out", b"stale");
    h.output.write("a/Kept.out", b"kept");

    h.pass(&[(Deleted, "a/Gone.src")]);

    assert_eq!(h.output.names(), vec!["a/Kept.out".to_string()]);
    assert_eq!(h.reloads.count(), 1);
    assert!(h.listener.last_result().is_none());
}

#[test]
fn test_quiet_pass_does_not_reload() {
    let h = harness(Arc::new(Scripted));
    h.pass(&[]);
    h.pass(&[(Created, "notes.txt"), (Deleted, "README")]);
    assert_eq!(h.reloads.count(), 0);
    assert!(h.output.is_empty());
}

#[test]
fn test_directory_events_ignored() {
    let h = harness(Arc::new(Scripted));
    let root = Path::new(ROOT);
    h.listener.on_start(root);
    h.listener
        .on_event(&ChangeEvent::new(Deleted, EntryKind::Directory, root.join("a.src")));
    h.listener.on_stop(root);
    assert_eq!(h.reloads.count(), 0);
}

// ============================================================================
// mirroring
// ============================================================================

#[test]
fn test_mirror_resources() {
    let sources = Arc::new(MemoryStore::with_entries([("img/logo.png", "png")]));
    let output = Arc::new(MemoryStore::new());
    let reloads = Arc::new(Reloads::default());
    let listener = CompilingListener::new(ROOT, Arc::new(Scripted), output.clone())
        .with_reader(sources.clone())
        .with_mirror_resources(true);
    listener.add_reload_listener(reloads.clone());
    let root = Path::new(ROOT);
    let logo = root.join("img").join("logo.png");

    listener.on_start(root);
    listener.on_event(&ChangeEvent::new(Created, EntryKind::File, logo.clone()));
    listener.on_stop(root);
    assert_eq!(output.read("img/logo.png").as_deref(), Some(&b"png"[..]));
    assert_eq!(reloads.count(), 1);

    listener.on_start(root);
    listener.on_event(&ChangeEvent::new(Deleted, EntryKind::File, logo));
    listener.on_stop(root);
    assert!(output.is_empty());
    assert_eq!(reloads.count(), 2);
}

// ============================================================================
// reload listeners
// ============================================================================

struct PanickyReload;

impl ReloadListener for PanickyReload {
    fn handle_reload(&self) {
        panic!("reload failure");
    }
}

#[test]
fn test_reload_listener_panic_contained() {
    let h = harness(Arc::new(Scripted));
    let panicky: Arc<dyn ReloadListener> = Arc::new(PanickyReload);
    h.listener.add_reload_listener(panicky.clone());
    let late = Arc::new(Reloads::default());
    h.listener.add_reload_listener(late.clone());

    h.pass(&[(Deleted, "a.src")]);
    assert_eq!(late.count(), 1);

    assert!(h.listener.remove_reload_listener(&panicky));
    assert!(!h.listener.remove_reload_listener(&panicky));
}

// ============================================================================
// end to end: observer → orchestrator → resolver
// ============================================================================

#[test]
fn test_watch_compile_resolve_scenario() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path()).join("src");
    fs::create_dir_all(root.join("a")).unwrap();
    fs::write(root.join("a/Simple.src"), "class Simple").unwrap();
    fs::write(root.join("a/Extended.src"), "class Extended extends Simple").unwrap();

    let output: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
    let resolver = Arc::new(ReloadingResolver::new());
    resolver.add_store(output.clone());

    let compiler = Arc::new(Counting::new(Arc::new(CopyCompiler::new("src", "class"))));
    let compiling = Arc::new(CompilingListener::new(
        root.clone(),
        compiler.clone(),
        output.clone(),
    ));
    let reloads = Arc::new(Reloads::default());
    compiling.add_reload_listener(resolver.clone());
    compiling.add_reload_listener(reloads.clone());

    let observer = Observer::new(root.clone());
    observer.add_listener(compiling.clone());

    let simple = qualified_to_resource("a.Simple", "class");
    let extended = qualified_to_resource("a.Extended", "class");

    // One batch of two.
    observer.check();
    assert_eq!(
        compiler.batches(),
        vec![vec!["a/Extended.src".to_string(), "a/Simple.src".to_string()]]
    );
    assert_eq!(reloads.count(), 1);
    assert!(compiling.last_result().unwrap().is_clean());
    assert_eq!(&*resolver.resolve(&simple).unwrap(), b"class Simple");
    assert!(resolver.resolve(&extended).is_ok());

    fs::remove_file(root.join("a/Extended.src")).unwrap();
    observer.check();
    assert_eq!(reloads.count(), 2);
    assert_eq!(
        resolver.resolve(&extended),
        Err(ResolveError::NotFound(extended.clone()))
    );
    assert!(resolver.resolve(&simple).is_ok());

    fs::remove_dir_all(root.join("a")).unwrap();
    observer.check();
    assert!(resolver.resolve(&simple).is_err());
    assert!(resolver.resolve(&extended).is_err());
}

#[test]
fn test_non_canonical_root_compiles() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("proj")).unwrap();
    fs::create_dir_all(temp.path().join("shared/src/a")).unwrap();
    fs::write(temp.path().join("shared/src/a/Simple.src"), "class Simple").unwrap();
    let root = temp.path().join("proj/../shared/src");

    let output = Arc::new(MemoryStore::new());
    let compiling = Arc::new(CompilingListener::new(
        root.clone(),
        Arc::new(CopyCompiler::new("src", "class")),
        output.clone(),
    ));
    let monitor = Monitor::new();
    monitor.add_listener(&root, compiling.clone());

    monitor.check_now();

    assert_eq!(output.names(), vec!["a/Simple.class".to_string()]);
    assert!(compiling.last_result().unwrap().is_clean());
    assert_eq!(compiling.root(), normalize_path(&root).as_path());
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_compiles() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("real/a")).unwrap();
    fs::write(temp.path().join("real/a/Simple.src"), "class Simple").unwrap();
    let link = temp.path().join("link");
    std::os::unix::fs::symlink(temp.path().join("real"), &link).unwrap();

    let output = Arc::new(MemoryStore::new());
    let compiling = Arc::new(CompilingListener::new(
        link.clone(),
        Arc::new(CopyCompiler::new("src", "class")),
        output.clone(),
    ));
    let observer = Observer::new(link);
    observer.add_listener(compiling.clone());

    observer.check();

    assert_eq!(output.names(), vec!["a/Simple.class".to_string()]);
}
