use assert_cmd::Command;
use predicates::str::contains;
use std::path::{Path, PathBuf};

fn replayflow() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("replayflow"))
}

fn write_workflow(dir: &Path) -> PathBuf {
    let path = dir.join("recorded_workflow.json");
    std::fs::write(
        &path,
        r##"{
    "name": "Recorded Workflow",
    "description": "Recorded on 2025/7/26",
    "steps": [
        {"type": "navigation", "url": "https://www.baidu.com/", "timestamp": 1},
        {"type": "navigation", "url": "https://www.baidu.com/", "timestamp": 2},
        {"type": "click", "cssSelector": "#kw", "elementText": "", "timestamp": 3},
        {"type": "input", "xpath": "id(\"kw\")", "value": "playwright", "timestamp": 4},
        {"type": "key_press", "key": "Enter", "cssSelector": "#kw", "timestamp": 5},
        {"type": "scroll", "scrollX": 0, "scrollY": 200, "timestamp": 6}
    ]
}"##,
    )
    .unwrap();
    path
}

#[test]
fn test_cli_help() {
    replayflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("ReplayFlow"));
}

#[test]
fn test_cli_version() {
    replayflow().arg("--version").assert().success();
}

#[test]
fn test_generate_writes_spec_and_runner() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = write_workflow(dir.path());
    let test_path = dir.path().join("tests/workflow-automation.spec.js");
    let runner_path = dir.path().join("generated/workflow-runner.mjs");

    replayflow()
        .arg("generate")
        .arg(&workflow)
        .arg("--test-path")
        .arg(&test_path)
        .arg("--runner-path")
        .arg(&runner_path)
        .assert()
        .success()
        .stdout(contains("Generated:"));

    let spec = std::fs::read_to_string(&test_path).unwrap();
    // Repeat navigation to the same URL collapses to one goto.
    assert_eq!(spec.matches("await page.goto(").count(), 1);
    // XPath id lookup sanitized to a CSS id selector.
    assert!(spec.contains("await page.fill('#kw', 'playwright');"));
    assert!(spec.contains("await page.keyboard.press('Enter');"));
    assert!(spec.contains("await page.mouse.wheel(0, 200);"));

    let runner = std::fs::read_to_string(&runner_path).unwrap();
    assert!(runner.contains("import { chromium } from 'playwright';"));
    assert!(runner.contains("await browser.close();"));
}

#[test]
fn test_generate_json_format_reports_paths() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = write_workflow(dir.path());
    let test_path = dir.path().join("spec.js");
    let runner_path = dir.path().join("runner.mjs");

    let output = replayflow()
        .arg("--format")
        .arg("json")
        .arg("generate")
        .arg(&workflow)
        .arg("--test-path")
        .arg(&test_path)
        .arg("--runner-path")
        .arg(&runner_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["workflow"], "Recorded Workflow");
    assert_eq!(report["steps"], 6);
    assert_eq!(report["test_path"], test_path.to_str().unwrap());
    assert_eq!(report["runner_path"], runner_path.to_str().unwrap());
    assert!(test_path.exists());
    assert!(runner_path.exists());
}

#[test]
fn test_generate_missing_workflow_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    replayflow()
        .arg("generate")
        .arg(dir.path().join("does-not-exist.json"))
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn test_generate_rejects_document_without_steps() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = dir.path().join("broken.json");
    std::fs::write(&workflow, r#"{"name": "broken", "description": ""}"#).unwrap();
    let test_path = dir.path().join("spec.js");
    let runner_path = dir.path().join("runner.mjs");

    replayflow()
        .arg("generate")
        .arg(&workflow)
        .arg("--test-path")
        .arg(&test_path)
        .arg("--runner-path")
        .arg(&runner_path)
        .assert()
        .failure()
        .stderr(contains("Error:"));

    // No partial output on a load failure.
    assert!(!test_path.exists());
    assert!(!runner_path.exists());
}

#[test]
fn test_generate_empty_workflow_produces_complete_spec() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = dir.path().join("empty.json");
    std::fs::write(
        &workflow,
        r#"{"name": "empty", "description": "", "steps": []}"#,
    )
    .unwrap();
    let test_path = dir.path().join("spec.js");
    let runner_path = dir.path().join("runner.mjs");

    replayflow()
        .arg("generate")
        .arg(&workflow)
        .arg("--test-path")
        .arg(&test_path)
        .arg("--runner-path")
        .arg(&runner_path)
        .assert()
        .success();

    let spec = std::fs::read_to_string(&test_path).unwrap();
    assert!(spec.contains("test.describe("));
    assert_eq!(spec.matches('{').count(), spec.matches('}').count());
}
