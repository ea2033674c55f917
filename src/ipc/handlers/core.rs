use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::str_param;
use crate::ipc::types::{AppState, Request};
use crate::store::GradeBook;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataFile": state.gradebook.as_ref().map(|gb| gb.path().to_string_lossy().to_string()),
            "authenticated": state.authenticated,
        }),
    )
}

fn handle_gradebook_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match str_param(req, "path") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    if path.is_empty() {
        return err(&req.id, "bad_params", "path must not be empty", None);
    }

    match GradeBook::open(path) {
        Ok(gb) => {
            let gb = gb.with_authenticator(state.config.authenticator());
            let student_count = gb.len();
            log::info!("switched to gradebook {path}");
            state.gradebook = Some(gb);
            ok(
                &req.id,
                json!({ "dataFile": path, "studentCount": student_count }),
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "gradebook.open" => Some(handle_gradebook_open(state, req)),
        _ => None,
    }
}
