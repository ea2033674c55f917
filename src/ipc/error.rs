use crate::error::GradeBookError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn store_err(id: &str, e: &GradeBookError) -> serde_json::Value {
    let details = match e {
        GradeBookError::NotFound(student_id) | GradeBookError::AlreadyExists(student_id) => {
            Some(json!({ "studentId": student_id }))
        }
        GradeBookError::GradeNotFound { id: student_id, grade } => {
            Some(json!({ "studentId": student_id, "grade": grade }))
        }
        GradeBookError::Storage { path, .. } | GradeBookError::Malformed { path, .. } => {
            Some(json!({ "path": path.to_string_lossy() }))
        }
        GradeBookError::MissingId | GradeBookError::InvalidRecord(_) => None,
    };
    err(id, e.code(), e.to_string(), details)
}
