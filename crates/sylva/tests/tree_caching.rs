//! Tests for tree retrieval through the cache.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use rstest::rstest;
use sylva::cache::{CacheStore, FileCacheStore, MemoryCacheStore};
use sylva::parser::{ParseOptions, ParseOutput, RustParser, SourceParser};
use sylva::{CacheError, CacheKey, Fingerprint, Mode, SourceFile, SyntaxError, SyntaxTree, TreeProvider};
use tempfile::TempDir;

/// Wraps a parser and counts how often it runs.
struct Counting<P> {
    inner: P,
    calls: AtomicUsize,
}

impl<P> Counting<P> {
    fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<P: SourceParser> SourceParser for Counting<P> {
    fn parse(&self, text: &str, options: &ParseOptions) -> ParseOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(text, options)
    }
}

/// Reports a fixed set of errors and no tree.
struct Rejecting(Vec<SyntaxError>);

impl SourceParser for Rejecting {
    fn parse(&self, _: &str, _: &ParseOptions) -> ParseOutput {
        ParseOutput::failed(self.0.clone())
    }
}

/// A store whose every operation fails.
struct OfflineStore;

impl CacheStore for OfflineStore {
    fn load(&self, _: &CacheKey, _: Fingerprint) -> Result<Option<SyntaxTree>, CacheError> {
        Err(CacheError::Unavailable("offline".to_string()))
    }

    fn save(&self, _: &CacheKey, _: Fingerprint, _: &SyntaxTree) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("offline".to_string()))
    }

    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        Err(CacheError::Unavailable("offline".to_string()))
    }

    fn record_good_run(&self, _: DateTime<Utc>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("offline".to_string()))
    }
}

fn rust_parser() -> Counting<RustParser> {
    Counting::new(RustParser::new().expect("tree-sitter-rust grammar should load"))
}

fn file_store(dir: &TempDir) -> FileCacheStore {
    FileCacheStore::new(dir.path().join("cache"))
}

const SOURCE: &str = "fn a() {}\nfn b() {}\n";

// === Reuse ===

#[test]
fn unchanged_file_is_parsed_once() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));
    let file = SourceFile::new("src/lib.rs", SOURCE);

    let first = provider.get_tree(&file, Mode::Batch).expect("clean source parses");
    let second = provider.get_tree(&file, Mode::Batch).expect("cached tree");

    assert_eq!(first, second);
    assert_eq!(provider.parser().calls(), 1);
}

#[test]
fn cache_survives_a_new_process() {
    let dir = TempDir::new().expect("create temp dir");
    let file = SourceFile::new("src/lib.rs", SOURCE);
    let mode = Mode::interactive();

    let first = TreeProvider::new(rust_parser(), file_store(&dir))
        .get_tree(&file, mode)
        .expect("clean source parses");

    let restarted = TreeProvider::new(rust_parser(), file_store(&dir));
    let second = restarted.get_tree(&file, mode).expect("cached tree");

    assert_eq!(first, second);
    assert_eq!(restarted.parser().calls(), 0, "served from disk");
}

#[test]
fn edited_file_is_reparsed() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));

    provider
        .get_tree(&SourceFile::new("src/lib.rs", SOURCE), Mode::Batch)
        .expect("clean source parses");
    let tree = provider
        .get_tree(&SourceFile::new("src/lib.rs", "fn a() {}\n"), Mode::Batch)
        .expect("clean source parses");

    assert_eq!(tree.roots().len(), 1);
    assert_eq!(provider.parser().calls(), 2);
}

#[test]
fn batch_and_interactive_records_coexist() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));
    let file = SourceFile::new("src/lib.rs", SOURCE);
    let interactive = Mode::interactive();

    provider.get_tree(&file, Mode::Batch).expect("batch tree");
    provider.get_tree(&file, interactive).expect("interactive tree");

    let store = provider.store();
    let key = file.cache_key();
    let batch_fp = file.fingerprint(Mode::Batch);
    let interactive_fp = file.fingerprint(interactive);
    assert_ne!(batch_fp, interactive_fp);

    let batch_tree = store.load(&key, batch_fp).expect("load").expect("batch record");
    let interactive_tree = store
        .load(&key, interactive_fp)
        .expect("load")
        .expect("interactive record");
    assert!(!batch_tree.is_augmented());
    assert!(interactive_tree.is_augmented());
}

// === Failures ===

#[test]
fn parse_failure_carries_every_error_and_writes_nothing() {
    let dir = TempDir::new().expect("create temp dir");
    let errors = vec![
        SyntaxError::new("unexpected `}`", 1, 0, 1),
        SyntaxError::new("missing `;`", 2, 5, 5),
    ];
    let store = file_store(&dir);
    let provider = TreeProvider::new(Rejecting(errors), &store);
    let file = SourceFile::new("src/bad.rs", "}\nlet x\n");

    let err = provider
        .get_tree(&file, Mode::Batch)
        .expect_err("no tree means failure");

    assert_eq!(err.errors.len(), 2);
    assert_eq!(err.primary().map(|e| e.line), Some(1));
    assert_eq!(err.path, PathBuf::from("src/bad.rs"));
    assert!(!store.record_path(&file.cache_key(), file.fingerprint(Mode::Batch)).exists());
}

#[test]
fn unparseable_rust_is_a_parse_error() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));

    let err = provider
        .get_tree(&SourceFile::new("src/bad.rs", "}}}"), Mode::Batch)
        .expect_err("garbage has no usable statements");

    assert!(!err.errors.is_empty());
    assert!(err.to_string().contains("src/bad.rs"));
}

#[test]
fn recoverable_errors_still_return_a_tree() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));

    let tree = provider
        .get_tree(
            &SourceFile::new("src/partial.rs", "fn a() {}\nfn b( {}\n"),
            Mode::Batch,
        )
        .expect("first item survives");

    assert!(!tree.is_empty());
}

#[test]
fn broken_store_does_not_break_retrieval() {
    let provider = TreeProvider::new(rust_parser(), OfflineStore);
    let file = SourceFile::new("src/lib.rs", SOURCE);

    let tree = provider.get_tree(&file, Mode::Batch).expect("parsed despite store");
    provider.get_tree(&file, Mode::Batch).expect("parsed again");

    assert_eq!(tree.roots().len(), 2);
    assert_eq!(provider.parser().calls(), 2);
}

#[test]
fn corrupt_record_is_reparsed_and_replaced() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));
    let file = SourceFile::new("src/lib.rs", SOURCE);
    let path = provider
        .store()
        .record_path(&file.cache_key(), file.fingerprint(Mode::Batch));
    std::fs::create_dir_all(path.parent().expect("record has a parent")).expect("create dir");
    std::fs::write(&path, "{\"format_version\": 1, \"tr").expect("write garbage");

    let tree = provider.get_tree(&file, Mode::Batch).expect("parsed");

    assert_eq!(provider.parser().calls(), 1);
    let stored = provider
        .store()
        .load(&file.cache_key(), file.fingerprint(Mode::Batch))
        .expect("record is readable again");
    assert_eq!(stored, Some(tree));
}

// === Boundaries ===

#[test]
fn empty_file_is_an_empty_tree() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));

    let tree = provider
        .get_tree(&SourceFile::new("src/empty.rs", ""), Mode::interactive())
        .expect("empty file is fine");

    assert!(tree.is_empty());
}

#[test]
fn comment_only_file_is_an_empty_tree() {
    let provider = TreeProvider::new(rust_parser(), MemoryCacheStore::new());

    let tree = provider
        .get_tree(&SourceFile::new("src/doc.rs", "// nothing here\n"), Mode::Batch)
        .expect("comments alone are fine");

    assert!(tree.is_empty());
}

#[test]
fn same_text_at_two_paths_gets_two_keys() {
    let provider = TreeProvider::new(rust_parser(), MemoryCacheStore::new());

    provider
        .get_tree(&SourceFile::new(Path::new("a.rs"), SOURCE), Mode::Batch)
        .expect("parsed");
    provider
        .get_tree(&SourceFile::new(Path::new("b.rs"), SOURCE), Mode::Batch)
        .expect("parsed");

    assert_eq!(provider.store().len(), 2);
}

#[rstest]
#[case::batch(Mode::Batch)]
#[case::interactive(Mode::interactive())]
fn deeply_nested_expression_parses(#[case] mode: Mode) {
    const TERMS: usize = 20_000;
    let dir = TempDir::new().expect("create temp dir");
    let provider = TreeProvider::new(rust_parser(), file_store(&dir));
    let text = format!("const X: u32 = 1{};\n", " + 1".repeat(TERMS));
    let file = SourceFile::new("src/generated.rs", text.as_str());

    let tree = provider.get_tree(&file, mode).expect("valid Rust parses");
    let cached = provider.get_tree(&file, mode).expect("cached tree");

    assert_eq!(tree.len(), 2 * TERMS + 4);
    assert!(tree.validate().is_ok());
    assert_eq!(tree, cached);
    assert_eq!(provider.parser().calls(), 1);
}

#[test]
fn deep_file_does_not_sink_its_batch() {
    let provider = TreeProvider::new(rust_parser(), MemoryCacheStore::new());
    let deep = format!("const X: u32 = 1{};\n", " + 1".repeat(20_000));
    let files = vec![
        SourceFile::new("deep.rs", deep.as_str()),
        SourceFile::new("small.rs", SOURCE),
    ];

    let report = provider.get_trees(&files, Mode::interactive());

    assert!(report.is_success());
    assert_eq!(report.parsed.len(), 2);
}

// === Batches ===

#[test]
fn batch_reports_failures_separately() {
    let provider = TreeProvider::new(rust_parser(), MemoryCacheStore::new());
    let files = vec![
        SourceFile::new("good.rs", SOURCE),
        SourceFile::new("bad.rs", "}}}"),
        SourceFile::new("also_good.rs", "struct S;\n"),
    ];

    let report = provider.get_trees(&files, Mode::Batch);

    assert!(!report.is_success());
    assert_eq!(report.parsed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, PathBuf::from("bad.rs"));
    let paths: Vec<_> = report.parsed.iter().map(|(path, _)| path.clone()).collect();
    assert_eq!(paths, vec![PathBuf::from("good.rs"), PathBuf::from("also_good.rs")]);
}
