use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{gradebook, gradebook_mut, student_id_param};
use crate::ipc::types::{AppState, Request};
use crate::store::StudentRecord;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students: Vec<StudentRecord> = gb.list_all().into_values().collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match gb.find_student(&student_id) {
        Some(student) => ok(&req.id, json!({ "student": student })),
        None => err(
            &req.id,
            "not_found",
            format!("no student found with ID: {student_id}"),
            Some(json!({ "studentId": student_id })),
        ),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("student").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "missing student", None);
    };
    let mut record = match StudentRecord::from_value(raw.clone()) {
        Ok(r) => r,
        Err(e) => return store_err(&req.id, &e),
    };
    // Stored under the same trimmed key that `studentId` lookups use.
    record.id = record.id.trim().to_string();
    if record.id.is_empty() {
        return err(&req.id, "bad_params", "ID must not be empty", None);
    }

    let gb = match gradebook_mut(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = record.id.clone();
    match gb.add_student(record) {
        Ok(()) => ok(&req.id, json!({ "studentId": student_id })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook_mut(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match gb.delete_student(&student_id) {
        Ok(()) => ok(&req.id, json!({ "studentId": student_id })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
