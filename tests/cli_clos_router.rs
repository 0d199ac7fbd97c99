use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "clos-router-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn run_router(routes: &Path, json: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clos_router"))
        .arg(routes)
        .arg("--json")
        .arg(json)
        .args(["--progress-secs", "0", "--quiet"])
        .args(extra)
        .output()
        .expect("run clos_router")
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path).expect("read snapshot");
    serde_json::from_str(&raw).expect("parse snapshot")
}

#[test]
fn routes_file_produces_snapshot() {
    let dir = unique_temp_dir("basic");
    let routes = write_file(&dir, "routes.txt", "# demo\n1.1.2\n3.3.4\n!1\n2.1.2\n");
    let out = dir.join("state.json");

    let output = run_router(&routes, &out, &["--size", "2"]);
    assert!(
        output.status.success(),
        "clos_router failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("resolves=4"), "stdout={stdout}");
    assert!(stdout.contains("Wrote "), "stdout={stdout}");

    let v = read_json(&out);
    assert_eq!(v["N"], 2);
    assert_eq!(v["MAX_PORTS"], 4);
    assert_eq!(v["repack_count"], 4);
    assert_eq!(v["s3_port_owner"], serde_json::json!([0, 2, 2, 3, 3]));
    assert_eq!(v["desired_owner"], serde_json::json!([0, 2, 2, 3, 3]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn repeated_runs_write_identical_json() {
    let dir = unique_temp_dir("determinism");
    let routes = write_file(
        &dir,
        "routes.txt",
        "1.1.11.21.31\n12.2.12, 13.3.13\n45.44.45.46\n!12\n22.2.12.22\n",
    );
    let a = dir.join("a.json");
    let b = dir.join("b.json");

    assert!(run_router(&routes, &a, &[]).status.success());
    assert!(run_router(&routes, &b, &[]).status.success());
    assert_eq!(
        fs::read(&a).expect("read a"),
        fs::read(&b).expect("read b")
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn incremental_mode_uses_repair() {
    let dir = unique_temp_dir("incremental");
    let routes = write_file(&dir, "routes.txt", "1.1.4\n5.2.7\n!1\n9.1\n");
    let out = dir.join("state.json");

    let output = run_router(&routes, &out, &["--size", "3", "--incremental"]);
    assert!(output.status.success());

    let v = read_json(&out);
    assert!(v["repair_count"].as_u64().expect("repair_count") > 0);
    assert_eq!(
        v["repair_count"].as_u64().unwrap() + v["repack_count"].as_u64().unwrap(),
        4
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn conflict_halts_unless_skipped() {
    let dir = unique_temp_dir("conflict");
    let routes = write_file(&dir, "routes.txt", "1.1\n2.1\n3.3\n");
    let out = dir.join("state.json");

    let output = run_router(&routes, &out, &["--size", "2"]);
    assert_eq!(output.status.code(), Some(1));
    let v = read_json(&out);
    assert_eq!(v["desired_owner"], serde_json::json!([0, 1, 0, 0, 0]));

    let output = run_router(&routes, &out, &["--size", "2", "--continue-on-conflict"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rejected=1"), "stdout={stdout}");
    let v = read_json(&out);
    assert_eq!(v["desired_owner"], serde_json::json!([0, 1, 0, 3, 0]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn infeasible_route_exits_with_state_intact() {
    let dir = unique_temp_dir("infeasible");
    let routes = write_file(&dir, "routes.txt", "1.1\n2.4\n3.7\n5.3\n6.6\n4.2.5.8\n");
    let out = dir.join("state.json");

    let output = run_router(&routes, &out, &["--size", "3"]);
    assert_eq!(output.status.code(), Some(2));

    let v = read_json(&out);
    let desired = v["desired_owner"].as_array().expect("desired_owner");
    assert!(desired.iter().all(|o| o != 4));
    assert_eq!(v["repack_count"], 5);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn summary_prints_reports() {
    let dir = unique_temp_dir("summary");
    let routes = write_file(&dir, "routes.txt", "3.3\n1.1.4\n2.2\n");
    let out = dir.join("state.json");

    let output = run_router(&routes, &out, &["--size", "2", "--summary"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SPINE-TO-EGRESS UTILIZATION HEATMAP"));
    assert!(stdout.contains("Out   4 -> Input   1 via Spine  1 (EgrBlock  2)"), "stdout={stdout}");
    assert!(stdout.contains("Most loaded egress block: 2/2 inputs (block 1)"), "stdout={stdout}");

    let _ = fs::remove_dir_all(&dir);
}
