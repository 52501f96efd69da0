//! Integration tests for the dom-audit CLI

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const CLEAN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Clean</title></head>
<body><p><a href="/">Home</a></p></body>
</html>"#;

const LEGACY_PAGE: &str = r#"<html>
<body>
  <center><font>Legacy</font></center>
  <a href="javascript:go()">Go</a>
</body>
</html>"#;

fn dom_audit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dom-audit"))
        .current_dir(dir)
        .args(args)
        .arg("--no-color")
        .output()
        .expect("Failed to run command")
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_clean_file_exits_zero() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "index.html", CLEAN_PAGE);

    let output = dom_audit(temp.path(), &[&file]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("No issues found"));
}

#[test]
fn test_issues_exit_one() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "legacy.html", LEGACY_PAGE);

    let output = dom_audit(temp.path(), &[&file]);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("[missing-doctype]"));
    assert!(text.contains("[deprecated-element]"));
    assert!(text.contains("[javascript-link]"));
    assert!(text.contains("file://"));
}

#[test]
fn test_json_output() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "legacy.html", LEGACY_PAGE);

    let output = dom_audit(
        temp.path(),
        &["--format", "json", "--url", "https://example.com/", &file],
    );
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(value["url"], "https://example.com/");
    let issues = value["issues"].as_array().unwrap();
    assert_eq!(value["summary"]["total"], issues.len());
    assert!(issues.iter().all(|i| i["ruleId"].is_string() && i["id"].is_string()));
    assert_eq!(value["summary"]["bySeverity"].as_object().unwrap().len(), 4);
    assert_eq!(value["summary"]["byCategory"].as_object().unwrap().len(), 8);
}

#[test]
fn test_stdin_input() {
    let temp = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_dom-audit"))
        .current_dir(temp.path())
        .args(["--format", "json", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn process");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(br#"<div id="a"></div><div id="a"></div>"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(value["url"], "about:blank");
    let duplicates = value["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["ruleId"] == "duplicate-id")
        .count();
    assert_eq!(duplicates, 1);
}

#[test]
fn test_stdin_non_utf8_input() {
    let temp = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_dom-audit"))
        .current_dir(temp.path())
        .args(["--format", "json", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn process");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"<html><body><p>caf\xe9</p><center>x</center></body></html>")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(output.status.code(), Some(1));
    let rules: Vec<&str> = value["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["ruleId"].as_str())
        .collect();
    assert!(rules.contains(&"missing-charset"));
    assert!(rules.contains(&"deprecated-element"));
}

#[test]
fn test_directory_scan() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "site/a.html", CLEAN_PAGE);
    write(temp.path(), "site/nested/b.htm", LEGACY_PAGE);
    write(temp.path(), "site/notes.txt", "<html>not scanned</html>");

    let output = dom_audit(temp.path(), &["--format", "json", "site"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn test_min_severity_filter() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "page.html",
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"></head>
           <body><a href="javascript:go()">Go</a></body></html>"#,
    );

    let output = dom_audit(temp.path(), &["--min-severity", "moderate", &file]);
    assert_eq!(output.status.code(), Some(0));

    let output = dom_audit(temp.path(), &[&file]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_disable_and_config_file() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "legacy.html", LEGACY_PAGE);
    write(
        temp.path(),
        ".domauditrc.yaml",
        "rules:\n  disabled: [doctype, charset, lang]\noutput:\n  format: json\n",
    );

    let output = dom_audit(temp.path(), &["--disable", "deprecated-elements", &file]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let rules: Vec<&str> = value["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["ruleId"].as_str())
        .collect();

    assert_eq!(rules, vec!["javascript-link"]);
}

#[test]
fn test_unknown_disabled_rule_is_error() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "index.html", CLEAN_PAGE);

    let output = dom_audit(temp.path(), &["--disable", "no-such-check", &file]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no-such-check"));
}

#[test]
fn test_missing_file_is_error() {
    let temp = TempDir::new().unwrap();
    let output = dom_audit(temp.path(), &["does-not-exist.html"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_window_and_script_inputs() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "app.html",
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"></head>
           <body><script src="/static/app.js"></script></body></html>"#,
    );
    let window = write(temp.path(), "window.json", r#"{"globals": {"jQuery": "3.4.1"}}"#);
    let script = write(
        temp.path(),
        "app.js",
        "window.addEventListener('load', function () { Notification.requestPermission(); });",
    );

    let output = dom_audit(
        temp.path(),
        &["--format", "json", "--window", &window, "--script", &script, &file],
    );
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let rules: Vec<&str> = value["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["ruleId"].as_str())
        .collect();

    assert_eq!(rules, vec!["notification-on-load", "vulnerable-library"]);
}

#[test]
fn test_invalid_window_snapshot_is_error() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "index.html", CLEAN_PAGE);
    let window = write(temp.path(), "window.json", "{not json");

    let output = dom_audit(temp.path(), &["--window", &window, &file]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_list_rules() {
    let temp = TempDir::new().unwrap();
    let output = dom_audit(temp.path(), &["--list-rules"]);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(0));
    assert!(text.contains("missing-doctype"));
    assert!(text.contains("vulnerable-libraries"));
    assert_eq!(text.lines().count(), 22);
}
