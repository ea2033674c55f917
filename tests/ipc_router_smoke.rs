use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
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

fn spawn_sidecar(workspace: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .current_dir(workspace)
        .env("GRADEBOOKD_DATA_FILE", workspace.join("gradebook.json"))
        .env_remove("GRADEBOOKD_CONFIG_FILE")
        .env_remove("GRADEBOOKD_REQUIRE_LOGIN")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
        assert_ne!(code, "unauthorized", "session lost before {}", method);
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("gradebook-router-smoke");
    let export_out = workspace.join("exports").join("smoke-export.json");
    let bundle_out = workspace.join("smoke-backup.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "username": "admin", "password": "password" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "student": { "ID": "S1", "Name": "Smoke", "Class": "10A" } }),
    );
    let _ = request(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.get",
        json!({ "studentId": "S1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "grades.add",
        json!({ "studentId": "S1", "grade": 75 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "grades.get",
        json!({ "studentId": "S1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "grades.final",
        json!({ "studentId": "S1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "grades.delete",
        json!({ "studentId": "S1", "grade": 75 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "gradebook.export",
        json!({ "outPath": export_out.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "backup.exportBundle",
        json!({ "outPath": bundle_out.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "backup.importBundle",
        json!({ "inPath": bundle_out.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "students.delete",
        json!({ "studentId": "S1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "gradebook.open",
        json!({ "path": workspace.join("other.json").to_string_lossy() }),
    );
    let _ = request(&mut stdin, &mut reader, "15", "session.logout", json!({}));

    let unknown = json!({ "id": "16", "method": "health.deep", "params": {} });
    writeln!(stdin, "{}", unknown).expect("write unknown");
    stdin.flush().expect("flush unknown");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read unknown response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["ok"], json!(false));
    assert_eq!(value["error"]["code"], json!("unauthorized"));

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["error"]["code"], json!("bad_json"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
