#[path = "../src/backup.rs"]
mod backup;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

// Stand-in for the store parser: every record needs a string ID.
fn require_ids(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let records: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)?;
    for (key, record) in &records {
        if !record.get("ID").is_some_and(|v| v.is_string()) {
            anyhow::bail!("record {key} has no ID");
        }
    }
    Ok(())
}

const BOOK: &str = r#"{
    "S1": {
        "ID": "S1",
        "Name": "Ann",
        "Class": "10A",
        "Grades": [
            90.0,
            80.0
        ]
    }
}"#;

#[test]
fn zip_export_and_import_roundtrip() {
    let src = temp_dir("gradebook-backup-src");
    let dst = temp_dir("gradebook-backup-dst");
    let out_dir = temp_dir("gradebook-backup-out");

    let data_src = src.join("gradebook.json");
    std::fs::write(&data_src, BOOK).expect("write source gradebook");

    let bundle_path = out_dir.join("gradebook.bundle.zip");
    let export = backup::export_gradebook_bundle(&data_src, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains("exportedAt"));
    archive
        .by_name("data/gradebook.json")
        .expect("gradebook entry in bundle");

    let data_dst = dst.join("gradebook.json");
    std::fs::write(&data_dst, "{}").expect("write stale gradebook");
    let import = backup::import_gradebook_bundle(&bundle_path, &data_dst, require_ids).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);

    let restored = std::fs::read_to_string(&data_dst).expect("read restored gradebook");
    assert_eq!(restored, BOOK);
    assert!(!dst.join("gradebook.json.importing").exists());

    let _ = std::fs::remove_dir_all(src);
    let _ = std::fs::remove_dir_all(dst);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn export_requires_existing_gradebook() {
    let dir = temp_dir("gradebook-backup-missing");
    let res = backup::export_gradebook_bundle(&dir.join("absent.json"), &dir.join("out.zip"));
    assert!(res.is_err());
    assert!(!dir.join("out.zip").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn bare_json_imports_as_legacy() {
    let dir = temp_dir("gradebook-backup-legacy");
    let legacy = dir.join("old-export.json");
    std::fs::write(&legacy, BOOK).expect("write legacy export");

    let data_file = dir.join("live").join("gradebook.json");
    let import = backup::import_gradebook_bundle(&legacy, &data_file, require_ids).expect("import legacy");
    assert_eq!(import.bundle_format_detected, backup::LEGACY_JSON_FORMAT);
    assert_eq!(
        std::fs::read_to_string(&data_file).expect("read restored"),
        BOOK
    );
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_inputs_leave_gradebook_untouched() {
    let dir = temp_dir("gradebook-backup-invalid");
    let data_file = dir.join("gradebook.json");
    std::fs::write(&data_file, BOOK).expect("write live gradebook");

    let garbage = dir.join("garbage.json");
    std::fs::write(&garbage, "[1, 2, 3]").expect("write non-object json");
    assert!(backup::import_gradebook_bundle(&garbage, &data_file, require_ids).is_err());

    let no_ids = dir.join("no-ids.json");
    std::fs::write(&no_ids, r#"{"S9": {"Name": "x"}}"#).expect("write record without ID");
    assert!(backup::import_gradebook_bundle(&no_ids, &data_file, require_ids).is_err());

    let foreign = dir.join("foreign.zip");
    {
        let mut zip = zip::ZipWriter::new(File::create(&foreign).expect("create zip"));
        zip.start_file("manifest.json", zip::write::FileOptions::default())
            .expect("start manifest");
        zip.write_all(br#"{"format":"photo-archive-v3"}"#)
            .expect("write manifest");
        zip.finish().expect("finish zip");
    }
    let err = backup::import_gradebook_bundle(&foreign, &data_file, require_ids).expect_err("foreign bundle");
    assert!(err.to_string().contains("unsupported bundle format"));

    assert_eq!(
        std::fs::read_to_string(&data_file).expect("read live"),
        BOOK
    );
    assert!(!dir.join("gradebook.json.importing").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn rejected_validation_keeps_existing_gradebook() {
    let dir = temp_dir("gradebook-backup-rejected");
    let data_file = dir.join("gradebook.json");
    std::fs::write(&data_file, BOOK).expect("write live gradebook");

    let src = dir.join("src.json");
    std::fs::write(&src, BOOK).expect("write source");
    let bundle_path = dir.join("bundle.zip");
    backup::export_gradebook_bundle(&src, &bundle_path).expect("export bundle");
    std::fs::write(&data_file, "{}").expect("write newer live gradebook");

    let err = backup::import_gradebook_bundle(&bundle_path, &data_file, |_| {
        Err(anyhow::anyhow!("store refused restored file"))
    })
    .expect_err("validator rejects");
    assert!(err.to_string().contains("store refused"));
    assert_eq!(
        std::fs::read_to_string(&data_file).expect("read live"),
        "{}"
    );
    assert!(!dir.join("gradebook.json.importing").exists());
    let _ = std::fs::remove_dir_all(dir);
}
