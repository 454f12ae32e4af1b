use dupfind::duplicates::{BucketTable, FinderError, MatchEngine, PipelineConfig, ScanPipeline};
use dupfind::progress::ProgressCallback;
use dupfind::scanner::{EntryKind, FileDescriptor, HashError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_missing_files_never_match() {
    let mut table = BucketTable::new();
    let mut engine = MatchEngine::new(true);

    let ghost_a = Arc::new(FileDescriptor::new(
        PathBuf::from("nonexistent_1.txt"),
        100,
        EntryKind::File,
    ));
    let ghost_b = Arc::new(FileDescriptor::new(
        PathBuf::from("nonexistent_2.txt"),
        100,
        EntryKind::File,
    ));

    assert!(engine.offer(Arc::clone(&ghost_a), &mut table).unwrap().is_none());
    assert!(engine.offer(Arc::clone(&ghost_b), &mut table).unwrap().is_none());

    assert_eq!(engine.stats().read_failures, 1);
    assert_eq!(table.len(), 2);
    assert!(matches!(ghost_a.prefix(), Err(HashError::NotFound(_))));
}

#[test]
fn test_file_vanishing_after_walk_is_isolated() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, "hello").unwrap();
    fs::write(&b, "hello").unwrap();
    fs::write(&c, "hello").unwrap();

    let desc = |p: &PathBuf| Arc::new(FileDescriptor::new(p.clone(), 5, EntryKind::File));
    let (da, db, dc) = (desc(&a), desc(&b), desc(&c));

    let mut table = BucketTable::new();
    let mut engine = MatchEngine::new(true);
    engine.offer(Arc::clone(&da), &mut table).unwrap();

    // b disappears before it is compared
    fs::remove_file(&b).unwrap();
    assert!(engine.offer(db, &mut table).unwrap().is_none());

    // c still matches a
    let original = engine.offer(dc, &mut table).unwrap().unwrap();
    assert!(Arc::ptr_eq(&original, &da));
}

#[cfg(unix)]
fn is_readable(path: &std::path::Path) -> bool {
    if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        fs::File::open(path).is_ok()
    }
}

/// Removes one file the moment the pipeline reports it, before it is compared.
struct RemoveOnVisit {
    target: PathBuf,
}

impl ProgressCallback for RemoveOnVisit {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, path: &str) {
        if Path::new(path) == self.target {
            fs::remove_file(&self.target).unwrap();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_unreadable_file_excluded_scan_completes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "hello").unwrap();
    let target = dir.path().join("b.txt");

    let handle = ScanPipeline::new(dir.path(), PipelineConfig::default())
        .with_progress_callback(Arc::new(RemoveOnVisit {
            target: target.clone(),
        }))
        .spawn()
        .unwrap();
    let pairs: Vec<_> = handle.receiver().iter().collect();
    let summary = handle.join().unwrap();

    assert!(!target.exists());
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].duplicate.path().file_name().unwrap(), "c.txt");
    assert_eq!(pairs[0].original.path().file_name().unwrap(), "a.txt");
    assert_eq!(summary.engine.read_failures, 1);
    assert!(summary.has_errors());
}

#[test]
#[cfg(unix)]
fn test_permission_denied_file_never_matches() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    let locked = dir.path().join("b.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if is_readable(&locked) {
        // Running with CAP_DAC_OVERRIDE (e.g. as root); permissions are not enforced.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let handle = ScanPipeline::new(dir.path(), PipelineConfig::default())
        .spawn()
        .unwrap();
    let pairs: Vec<_> = handle.receiver().iter().collect();
    let summary = handle.join().unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(pairs.is_empty());
    assert_eq!(summary.engine.read_failures, 1);
}

#[test]
#[cfg(unix)]
fn test_unreadable_directory_recorded_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), "data").unwrap();
    fs::write(dir.path().join("x.txt"), "data").unwrap();
    fs::write(dir.path().join("y.txt"), "data").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if is_readable(&locked) {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let handle = ScanPipeline::new(dir.path(), PipelineConfig::default())
        .spawn()
        .unwrap();
    let pairs: Vec<_> = handle.receiver().iter().collect();
    let summary = handle.join().unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].path(), locked.as_path());
}

#[test]
fn test_root_errors_are_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let handle = ScanPipeline::new(&missing, PipelineConfig::default())
        .spawn()
        .unwrap();
    assert!(handle.receiver().recv().is_err());
    assert!(matches!(handle.join(), Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_consumer_gone_stops_walk() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("{i:02}.txt")), "same").unwrap();
    }

    let config = PipelineConfig::default().with_channel_capacity(1);
    let handle = ScanPipeline::new(dir.path(), config).spawn().unwrap();
    let _first = handle.receiver().recv().unwrap();

    // Dropping the receiver inside join unblocks the producer
    assert!(matches!(
        handle.join(),
        Err(FinderError::ConsumerDisconnected)
    ));
}
