use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATA_ENTRY: &str = "data/gradebook.json";
pub const BUNDLE_FORMAT_V1: &str = "gradebook-bundle-v1";
pub const LEGACY_JSON_FORMAT: &str = "legacy-json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

pub fn export_gradebook_bundle(data_file: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if !data_file.is_file() {
        return Err(anyhow!(
            "gradebook file not found: {}",
            data_file.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "sourceFile": data_file.to_string_lossy(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DATA_ENTRY, opts)
        .context("failed to start gradebook entry")?;
    let mut data = File::open(data_file)
        .with_context(|| format!("failed to open gradebook {}", data_file.to_string_lossy()))?;
    std::io::copy(&mut data, &mut zip).context("failed to write gradebook entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
    })
}

/// Restores `data_file` from a bundle, or from a bare gradebook JSON file.
/// The incoming document must be a JSON object and pass `validate` before
/// anything is replaced.
pub fn import_gradebook_bundle<F>(
    in_path: &Path,
    data_file: &Path,
    validate: F,
) -> anyhow::Result<ImportSummary>
where
    F: FnOnce(&Path) -> anyhow::Result<()>,
{
    if let Some(parent) = data_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let tmp_dst = importing_path(data_file);
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let detected = if !is_zip_file(in_path)? {
        std::fs::copy(in_path, &tmp_dst).with_context(|| {
            format!(
                "failed to copy legacy gradebook from {}",
                in_path.to_string_lossy()
            )
        })?;
        LEGACY_JSON_FORMAT
    } else {
        extract_bundle(in_path, &tmp_dst)?;
        BUNDLE_FORMAT_V1
    };

    if let Err(e) = validate_gradebook_json(&tmp_dst).and_then(|()| validate(&tmp_dst)) {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(e);
    }

    std::fs::rename(&tmp_dst, data_file).with_context(|| {
        format!(
            "failed to move restored gradebook to {}",
            data_file.to_string_lossy()
        )
    })?;

    Ok(ImportSummary {
        bundle_format_detected: detected.to_string(),
    })
}

fn extract_bundle(in_path: &Path, dst: &Path) -> anyhow::Result<()> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut out = File::create(dst)
        .with_context(|| format!("failed to create temp file {}", dst.to_string_lossy()))?;
    {
        let mut entry = archive
            .by_name(DATA_ENTRY)
            .context("bundle missing data/gradebook.json")?;
        std::io::copy(&mut entry, &mut out).context("failed to extract gradebook entry")?;
    }
    out.flush().context("failed to flush extracted gradebook")?;
    Ok(())
}

fn validate_gradebook_json(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).context("restored gradebook is invalid JSON")?;
    if !value.is_object() {
        return Err(anyhow!("restored gradebook must be a JSON object"));
    }
    Ok(())
}

fn importing_path(data_file: &Path) -> PathBuf {
    let mut name = data_file.as_os_str().to_owned();
    name.push(".importing");
    PathBuf::from(name)
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
