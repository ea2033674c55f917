use crate::backup;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{gradebook, gradebook_mut, str_param};
use crate::ipc::types::{AppState, Request};
use crate::store::GradeBook;
use serde_json::json;
use std::path::PathBuf;

fn path_param(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    let raw = str_param(req, key)?.trim();
    if raw.is_empty() {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{key} must not be empty"),
            None,
        ));
    }
    Ok(PathBuf::from(raw))
}

fn handle_gradebook_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match path_param(req, "outPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match gb.export(&out_path) {
        Ok(()) => ok(
            &req.id,
            json!({
                "outPath": out_path.to_string_lossy(),
                "studentCount": gb.len(),
            }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_backup_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match path_param(req, "outPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match backup::export_gradebook_bundle(gb.path(), &out_path) {
        Ok(summary) => {
            log::info!("exported bundle to {}", out_path.to_string_lossy());
            ok(
                &req.id,
                json!({
                    "outPath": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                }),
            )
        }
        Err(e) => err(&req.id, "backup_export_failed", format!("{e:?}"), None),
    }
}

fn handle_backup_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match path_param(req, "inPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook_mut(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Parse with the store itself so a restore can't leave an unloadable file.
    let summary = match backup::import_gradebook_bundle(&in_path, gb.path(), |restored| {
        GradeBook::open(restored)
            .map(|_| ())
            .map_err(anyhow::Error::from)
    }) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "backup_import_failed", format!("{e:?}"), None),
    };
    if let Err(e) = gb.reload() {
        return store_err(&req.id, &e);
    }
    log::info!(
        "restored {} students from {}",
        gb.len(),
        in_path.to_string_lossy()
    );
    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "studentCount": gb.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gradebook.export" => Some(handle_gradebook_export(state, req)),
        "backup.exportBundle" => Some(handle_backup_export_bundle(state, req)),
        "backup.importBundle" => Some(handle_backup_import_bundle(state, req)),
        _ => None,
    }
}
