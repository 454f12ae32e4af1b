use dupfind::duplicates::{
    BucketTable, DuplicatePair, MatchEngine, PipelineConfig, ScanPipeline, ScanSummary,
};
use dupfind::scanner::{EntryKind, FileDescriptor, SkipReason, PREFIX_SIZE};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn scan(root: &Path, config: PipelineConfig) -> (Vec<DuplicatePair>, ScanSummary) {
    let handle = ScanPipeline::new(root, config).spawn().unwrap();
    let pairs: Vec<_> = handle.receiver().iter().collect();
    let summary = handle.join().unwrap();
    (pairs, summary)
}

fn names(pairs: &[DuplicatePair], root: &Path) -> Vec<(String, String)> {
    let rel = |p: &Path| {
        p.strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/")
    };
    pairs
        .iter()
        .map(|pair| (rel(pair.duplicate.path()), rel(pair.original.path())))
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (pairs, summary) = scan(dir.path(), PipelineConfig::default());

    assert!(pairs.is_empty());
    assert_eq!(summary.candidates, 0);
    assert_eq!(summary.visited, 1);
}

#[test]
fn test_scan_reports_later_file_against_first() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let (pairs, summary) = scan(dir.path(), PipelineConfig::default());

    assert_eq!(
        names(&pairs, dir.path()),
        vec![("b.txt".to_string(), "a.txt".to_string())]
    );
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.duplicate_bytes, 5);
    assert!(!summary.has_errors());
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();

    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"duplicate content")
        .unwrap();
    File::create(sub.join("b.txt"))
        .unwrap()
        .write_all(b"duplicate content")
        .unwrap();

    let (pairs, summary) = scan(dir.path(), PipelineConfig::default());

    assert_eq!(
        names(&pairs, dir.path()),
        vec![("subdir/b.txt".to_string(), "a.txt".to_string())]
    );
    assert_eq!(summary.skip_counts.directories, 2);
}

#[test]
fn test_scan_extension_toggle() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "same text").unwrap();
    fs::write(dir.path().join("notes.txt"), "same text").unwrap();

    let (pairs, _) = scan(dir.path(), PipelineConfig::default());
    assert!(pairs.is_empty());

    let config = PipelineConfig::default().with_extension_sensitive(false);
    let (pairs, _) = scan(dir.path(), config);
    assert_eq!(
        names(&pairs, dir.path()),
        vec![("notes.txt".to_string(), "notes.md".to_string())]
    );
}

#[test]
fn test_scan_min_size_threshold() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), [1u8; 100]).unwrap();
    fs::write(dir.path().join("b.bin"), [1u8; 100]).unwrap();
    fs::write(dir.path().join("c.bin"), [1u8; 99]).unwrap();
    fs::write(dir.path().join("d.bin"), [1u8; 99]).unwrap();

    let (pairs, summary) = scan(
        dir.path(),
        PipelineConfig::default()
            .with_min_size(100)
            .with_skip_recording(true),
    );

    assert_eq!(
        names(&pairs, dir.path()),
        vec![("b.bin".to_string(), "a.bin".to_string())]
    );
    assert_eq!(summary.skip_counts.below_min_size, 2);
    assert_eq!(
        summary.skip_reason(&dir.path().join("c.bin")),
        Some(SkipReason::BelowMinSize { size: 99, min: 100 })
    );
}

#[test]
fn test_scan_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("a.empty")).unwrap();
    File::create(dir.path().join("b.empty")).unwrap();

    let (pairs, summary) = scan(dir.path(), PipelineConfig::default());

    assert_eq!(pairs.len(), 1);
    assert_eq!(summary.duplicate_bytes, 0);
}

#[test]
fn test_scan_excluded_directory() {
    let dir = tempdir().unwrap();
    let appdata = dir.path().join("Application Data");
    fs::create_dir(&appdata).unwrap();
    fs::write(dir.path().join("a.cfg"), "x=1").unwrap();
    fs::write(appdata.join("a.cfg"), "x=1").unwrap();

    let (pairs, summary) = scan(dir.path(), PipelineConfig::default());
    assert!(pairs.is_empty());
    assert_eq!(summary.skip_counts.excluded, 1);

    // An empty exclusion list scans everything
    let config = PipelineConfig::default().with_excluded_substrings(Vec::new());
    let (pairs, _) = scan(dir.path(), config);
    assert_eq!(
        names(&pairs, dir.path()),
        vec![("a.cfg".to_string(), "Application Data/a.cfg".to_string())]
    );
}

#[test]
fn test_scan_is_deterministic() {
    let dir = tempdir().unwrap();
    for d in ["x", "y", "z"] {
        let sub = dir.path().join(d);
        fs::create_dir(&sub).unwrap();
        for (i, content) in ["one", "two", "one", "three", "two"].iter().enumerate() {
            fs::write(sub.join(format!("{i}.txt")), content).unwrap();
        }
    }

    let (first, _) = scan(dir.path(), PipelineConfig::default());
    for _ in 0..3 {
        let (again, _) = scan(dir.path(), PipelineConfig::default());
        assert_eq!(names(&again, dir.path()), names(&first, dir.path()));
    }
    // 15 files, 3 distinct contents
    assert_eq!(first.len(), 12);
}

#[test]
fn test_prefix_mismatch_skips_checksums() {
    let dir = tempdir().unwrap();
    let mut content = vec![b'a'; PREFIX_SIZE * 8];
    fs::write(dir.path().join("a.dat"), &content).unwrap();
    content[10] = b'b';
    fs::write(dir.path().join("b.dat"), &content).unwrap();

    let file = |name: &str| {
        let path = dir.path().join(name);
        let meta = fs::symlink_metadata(&path).unwrap();
        Arc::new(FileDescriptor::from_metadata(path, &meta))
    };
    let a = file("a.dat");
    let b = file("b.dat");

    let mut table = BucketTable::new();
    let mut engine = MatchEngine::new(true);
    assert!(engine.offer(Arc::clone(&a), &mut table).unwrap().is_none());
    assert!(engine.offer(Arc::clone(&b), &mut table).unwrap().is_none());

    assert_eq!(a.read_counts().prefix, 1);
    assert_eq!(b.read_counts().prefix, 1);
    assert_eq!(a.read_counts().checksum, 0);
    assert_eq!(b.read_counts().checksum, 0);
    assert_eq!(engine.stats().prefix_rejections, 1);
}

#[test]
fn test_representative_read_once_across_comparisons() {
    let dir = tempdir().unwrap();
    let mut table = BucketTable::new();
    let mut engine = MatchEngine::new(true);

    let original = {
        let path = dir.path().join("0.txt");
        fs::write(&path, "payload").unwrap();
        Arc::new(FileDescriptor::new(path, 7, EntryKind::File))
    };
    engine.offer(Arc::clone(&original), &mut table).unwrap();

    for i in 1..5 {
        let path = dir.path().join(format!("{i}.txt"));
        fs::write(&path, "payload").unwrap();
        let copy = Arc::new(FileDescriptor::new(path, 7, EntryKind::File));
        assert!(engine.offer(copy, &mut table).unwrap().is_some());
    }

    assert_eq!(original.read_counts().prefix, 1);
    assert_eq!(original.read_counts().checksum, 1);
}

#[test]
fn test_small_channel_still_delivers_everything() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        fs::write(dir.path().join(format!("{i:02}.txt")), "dup").unwrap();
    }

    let config = PipelineConfig::default().with_channel_capacity(1);
    let handle = ScanPipeline::new(dir.path(), config).spawn().unwrap();

    let mut received = 0;
    for _pair in handle.receiver() {
        received += 1;
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    let summary = handle.join().unwrap();

    assert_eq!(received, 49);
    assert_eq!(summary.duplicates, 49);
}
