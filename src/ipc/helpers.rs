use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::GradeBook;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn student_id_param(req: &Request) -> Result<String, serde_json::Value> {
    let id = str_param(req, "studentId")?.trim();
    if id.is_empty() {
        return Err(err(&req.id, "bad_params", "studentId must not be empty", None));
    }
    Ok(id.to_string())
}

/// Grade entry as typed by a user: a JSON number or numeric text.
pub fn grade_param(req: &Request) -> Result<f64, serde_json::Value> {
    let invalid = || {
        err(
            &req.id,
            "bad_params",
            "invalid grade, enter a numeric value",
            None,
        )
    };
    let grade = match req.params.get("grade") {
        Some(serde_json::Value::Number(n)) => n.as_f64().ok_or_else(invalid)?,
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
        None => return Err(err(&req.id, "bad_params", "missing grade", None)),
    };
    if !grade.is_finite() {
        return Err(invalid());
    }
    Ok(grade)
}

pub fn gradebook<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a GradeBook, serde_json::Value> {
    state
        .gradebook
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_gradebook", "open a gradebook first", None))
}

pub fn gradebook_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut GradeBook, serde_json::Value> {
    state
        .gradebook
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_gradebook", "open a gradebook first", None))
}
