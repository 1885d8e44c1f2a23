//! Archive sources produce the same table as the unpacked directory

mod common;

use common::{corpus_dir, corpus_tar, corpus_tar_bz2, corpus_tar_gz, corpus_zip, ingest, locator, rows};
use corpus_ingest::{Error, ErrorPolicy, IngestConfig, WarningKind};

fn recursive() -> IngestConfig {
    IngestConfig {
        recursive: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_zip_equals_directory() {
    let dir = corpus_dir();
    let expected = rows(&ingest(recursive(), &locator(dir.path())).await.unwrap());
    assert_eq!(expected.len(), 3);

    let archives = tempfile::tempdir().unwrap();
    let zip_path = archives.path().join("corpus.zip");
    corpus_zip(&zip_path);

    // archives are always traversed fully, recursive or not
    let outcome = ingest(IngestConfig::default(), &locator(&zip_path)).await.unwrap();
    assert_eq!(rows(&outcome), expected);
}

#[tokio::test]
async fn test_tar_gz_equals_directory() {
    let dir = corpus_dir();
    let expected = rows(&ingest(recursive(), &locator(dir.path())).await.unwrap());

    let archives = tempfile::tempdir().unwrap();
    let tar_path = archives.path().join("corpus.tar.gz");
    corpus_tar_gz(&tar_path);

    let outcome = ingest(IngestConfig::default(), &locator(&tar_path)).await.unwrap();
    assert_eq!(rows(&outcome), expected);
}

#[tokio::test]
async fn test_tar_and_tar_bz2_equal_directory() {
    let dir = corpus_dir();
    let expected = rows(&ingest(recursive(), &locator(dir.path())).await.unwrap());

    let archives = tempfile::tempdir().unwrap();
    let tar_path = archives.path().join("corpus.tar");
    corpus_tar(&tar_path);
    let bz2_path = archives.path().join("corpus.tar.bz2");
    corpus_tar_bz2(&bz2_path);
    let tbz2_path = archives.path().join("corpus.tbz2");
    corpus_tar_bz2(&tbz2_path);

    for path in [&tar_path, &bz2_path, &tbz2_path] {
        let outcome = ingest(IngestConfig::default(), &locator(path)).await.unwrap();
        assert_eq!(rows(&outcome), expected, "{}", path.display());
    }
}

#[tokio::test]
async fn test_archive_inside_directory() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "a_loose.txt", "loose file");
    corpus_zip(&dir.path().join("b_bundle.zip"));

    let outcome = ingest(IngestConfig::default(), &locator(dir.path())).await.unwrap();
    let ids: Vec<&str> = outcome.table.rows.iter().map(|r| r.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["a_loose.txt", "a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn test_corrupt_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "broken.tar.gz", b"\x1f\x8b not really gzip");

    let err = ingest(IngestConfig::default(), &locator(&path)).await.unwrap_err();
    assert!(matches!(err, Error::SourceResolution { .. }));
}

#[tokio::test]
async fn test_corrupt_archive_in_directory_under_collect() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "a.txt", "first");
    common::write(dir.path(), "b.zip", "not a zip archive");
    common::write(dir.path(), "c.txt", "third");

    let err = ingest(IngestConfig::default(), &locator(dir.path())).await.unwrap_err();
    assert!(matches!(err, Error::SourceResolution { .. }));

    let config = IngestConfig {
        on_error: ErrorPolicy::Collect,
        ..Default::default()
    };
    let outcome = ingest(config, &locator(dir.path())).await.unwrap();

    let ids: Vec<&str> = outcome.table.rows.iter().map(|r| r.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["a.txt", "c.txt"]);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].source_id.ends_with("b.zip"));
    assert!(matches!(outcome.warnings[0].kind, WarningKind::SourceFailed { .. }));
}
