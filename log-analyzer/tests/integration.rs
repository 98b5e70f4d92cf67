use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Output, Stdio},
};

const SAMPLE: &str = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326
192.168.1.1 - - [10/Oct/2023:13:56:12 +0000] "POST /login HTTP/1.1" 200 512
10.0.0.1 - - [10/Oct/2023:13:57:01 +0000] "GET /admin HTTP/1.1" 403 128
127.0.0.1 - - [10/Oct/2023:13:58:44 +0000] "GET /index.html HTTP/1.1" 200 2326
"#;

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_log-analyzer"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start log-analyzer");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("log-analyzer exits")
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "log-analyzer-it-{}-{name}",
        std::process::id()
    ));
    fs::write(&path, contents).expect("Failed to write scratch file");
    path
}

#[test]
fn analyze_stdin_prints_report() {
    let output = run_with_stdin(&["analyze"], &format!("{SAMPLE}not a log line\n"));
    assert!(output.status.success());

    let report = String::from_utf8(output.stdout).expect("report is utf-8");
    assert!(report.starts_with("Total requests: 4\n"));
    assert!(report.contains("  200: 3 (75.0%)\n  403: 1 (25.0%)\n"));
    assert!(report.contains("Top 10 source addresses:\n  127.0.0.1: 2\n"));

    let logs = String::from_utf8_lossy(&output.stderr);
    assert!(logs.contains("suspicious source"), "stderr: {logs}");
}

#[test]
fn analyze_empty_input() {
    let output = run_with_stdin(&["analyze", "-"], "");
    assert!(output.status.success());
    let report = String::from_utf8(output.stdout).expect("report is utf-8");
    assert!(report.starts_with("Total requests: 0\n"));
    assert!(!report.contains('%'));
}

#[test]
fn analyze_files_merges_shards_into_json() {
    let first = scratch_file("first.log", SAMPLE);
    let second = scratch_file("second.log", SAMPLE);
    let output = run_with_stdin(
        &[
            "analyze",
            "--output-format",
            "json",
            "--top",
            "1",
            first.to_str().expect("utf-8 temp path"),
            second.to_str().expect("utf-8 temp path"),
        ],
        "",
    );
    let _ = fs::remove_file(&first);
    let _ = fs::remove_file(&second);
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["total"], 8);
    assert_eq!(summary["unparsed"], 0);
    assert_eq!(summary["top_sources"][0]["value"], "127.0.0.1");
    assert_eq!(summary["top_sources"][0]["count"], 4);
    assert_eq!(summary["top_paths"].as_array().map(Vec::len), Some(1));
}

#[test]
fn analyze_writes_report_file_with_config() {
    let config = scratch_file("config.toml", "grammar = \"common\"\ntop_n = 2\n");
    let input = scratch_file("input.log", SAMPLE);
    let report_path = std::env::temp_dir().join(format!(
        "log-analyzer-it-{}-report.txt",
        std::process::id()
    ));
    let output = run_with_stdin(
        &[
            "analyze",
            "--config",
            config.to_str().expect("utf-8 temp path"),
            "--output",
            report_path.to_str().expect("utf-8 temp path"),
            input.to_str().expect("utf-8 temp path"),
        ],
        "",
    );
    assert!(output.status.success());
    let report = fs::read_to_string(&report_path).expect("report was written");
    let _ = fs::remove_file(&config);
    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&report_path);

    assert!(report.contains("Top 2 requested paths:\n  /index.html: 2\n  /login: 1\n"));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_input_fails() {
    let output = run_with_stdin(&["analyze", "/no/such/access.log"], "");
    assert!(!output.status.success());
}

#[test]
fn repeated_stdin_fails() {
    let output = run_with_stdin(&["analyze", "-", "-"], "");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_threshold_fails() {
    let output = run_with_stdin(&["analyze", "--threshold", "2"], "");
    assert!(!output.status.success());
}

#[test]
fn validate_subcommand() {
    let ok = run_with_stdin(&["validate", "email", "user@example.com"], "");
    assert!(ok.status.success());
    assert_eq!(String::from_utf8_lossy(&ok.stdout), "Valid\n");

    let bad = run_with_stdin(&["validate", "email", "invalid-email"], "");
    assert!(!bad.status.success());

    let unknown = run_with_stdin(&["validate", "shoe_size", "42"], "");
    assert!(!unknown.status.success());
    assert_eq!(String::from_utf8_lossy(&unknown.stdout), "unknown field type\n");
}

#[test]
fn extract_subcommand() {
    let output = run_with_stdin(
        &["extract", "ip_address", "from 10.0.0.1 via 10.0.0.254"],
        "",
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "10.0.0.1\n10.0.0.254\n");
}
