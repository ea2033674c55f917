use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{grade_param, gradebook, gradebook_mut, student_id_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_grades_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match gb.get_grades(&student_id) {
        Ok(grades) => ok(
            &req.id,
            json!({ "studentId": student_id, "grades": grades }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_grades_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let grade = match grade_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook_mut(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = gb.add_grade(&student_id, grade) {
        return store_err(&req.id, &e);
    }
    grades_result(gb.get_grades(&student_id), req, &student_id)
}

fn handle_grades_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let grade = match grade_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook_mut(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = gb.delete_grade(&student_id, grade) {
        return store_err(&req.id, &e);
    }
    grades_result(gb.get_grades(&student_id), req, &student_id)
}

fn handle_grades_final(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gb = match gradebook(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let final_grade = match gb.calculate_final_grade(&student_id) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };
    let grade_count = gb.get_grades(&student_id).map(|g| g.len()).unwrap_or(0);
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "finalGrade": final_grade,
            "gradeCount": grade_count,
        }),
    )
}

fn grades_result(
    grades: Result<Vec<f64>, crate::error::GradeBookError>,
    req: &Request,
    student_id: &str,
) -> serde_json::Value {
    match grades {
        Ok(grades) => ok(
            &req.id,
            json!({ "studentId": student_id, "grades": grades }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.get" => Some(handle_grades_get(state, req)),
        "grades.add" => Some(handle_grades_add(state, req)),
        "grades.delete" => Some(handle_grades_delete(state, req)),
        "grades.final" => Some(handle_grades_final(state, req)),
        _ => None,
    }
}
