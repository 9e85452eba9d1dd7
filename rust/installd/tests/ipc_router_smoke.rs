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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_with_seed(None)
}

fn spawn_with_seed(seed: Option<&Path>) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_installd");
    let mut command = Command::new(exe);
    match seed {
        Some(path) => command.env("INSTALLD_SEED", path),
        None => command.env_remove("INSTALLD_SEED"),
    };
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn installd");
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
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error object")
}

#[test]
fn health_reports_the_embedded_seed() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["employeeCount"], json!(4));
    assert_eq!(health["grantedLoanCount"], json!(4));
    assert_eq!(health["installmentCount"], json!(4));
    assert!(health["seedPath"].is_null());
    assert!(health["version"].as_str().is_some());
}

#[test]
fn reference_lists_carry_select_options() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let employees = request_ok(&mut stdin, &mut reader, "1", "reference.employees", json!({}));
    assert_eq!(
        employees.pointer("/options/0"),
        Some(&json!({ "value": "emp-1001", "label": "Rahim Uddin (EMP-0101)" }))
    );
    assert_eq!(
        employees.pointer("/employees/0/employeeCode"),
        Some(&json!("EMP-0101"))
    );

    let loans = request_ok(&mut stdin, &mut reader, "2", "reference.grantedLoans", json!({}));
    assert_eq!(
        loans.pointer("/options/3"),
        Some(&json!({ "value": "gl-2004", "label": "LN-2024-004" }))
    );
    assert_eq!(
        loans.pointer("/grantedLoans/1/installmentPeriod"),
        Some(&json!(6))
    );
}

#[test]
fn unknown_methods_and_bad_lines_get_error_replies() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let error = request_err(&mut stdin, &mut reader, "1", "grid.get", json!({}));
    assert_eq!(error["code"], json!("not_implemented"));

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let reply: serde_json::Value = serde_json::from_str(line.trim()).expect("reply json");
    assert_eq!(reply["ok"], json!(false));
    assert_eq!(reply.pointer("/error/code"), Some(&json!("bad_json")));
    assert!(reply.get("id").is_none());

    // The loop keeps serving after a malformed line.
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["installmentCount"], json!(4));
}

#[test]
fn seed_load_failure_keeps_the_current_data() {
    let dir = temp_dir("installd-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let missing = dir.join("absent.json");
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "seed.load",
        json!({ "path": missing.to_string_lossy() }),
    );
    assert_eq!(error["code"], json!("seed_load_failed"));

    let broken = dir.join("broken.json");
    std::fs::write(&broken, "{\"employees\": [").expect("write broken seed");
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "seed.load",
        json!({ "path": broken.to_string_lossy() }),
    );
    assert_eq!(error["code"], json!("seed_load_failed"));

    let error = request_err(&mut stdin, &mut reader, "3", "seed.load", json!({}));
    assert_eq!(error["code"], json!("bad_params"));

    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health["installmentCount"], json!(4));
}

#[test]
fn seed_env_var_selects_the_startup_data() {
    let dir = temp_dir("installd-env-seed");
    let seed = dir.join("seed.json");
    std::fs::write(
        &seed,
        json!({
            "employees": [
                { "id": "E1", "firstName": "Ann", "lastName": "Lee", "employeeCode": "E100" }
            ],
            "grantedLoans": [
                { "id": "L1", "loanNo": "GL-1", "repaymentTotal": 1200, "installmentPeriod": 12 }
            ]
        })
        .to_string(),
    )
    .expect("write seed");

    let (_child, mut stdin, mut reader) = spawn_with_seed(Some(&seed));
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["employeeCount"], json!(1));
    assert_eq!(health["grantedLoanCount"], json!(1));
    assert_eq!(health["installmentCount"], json!(0));
    assert_eq!(health["seedPath"], json!(seed.to_string_lossy()));

    let table = request_ok(&mut stdin, &mut reader, "2", "table.get", json!({}));
    assert_eq!(table.pointer("/view/rows"), Some(&json!([])));
    assert_eq!(table.pointer("/view/pageCount"), Some(&json!(0)));
}
