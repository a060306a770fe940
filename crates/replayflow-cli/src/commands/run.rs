use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::json;

use crate::cli::{OutputFormat, RunArgs};
use crate::config::CliConfig;
use crate::output::print_json;
use replayflow_browser::{RunOptions, WorkflowRunner};
use replayflow_core::workflow::Workflow;

pub async fn run(
    runner: &dyn WorkflowRunner,
    args: RunArgs,
    config: &CliConfig,
    format: OutputFormat,
) -> Result<()> {
    let workflow_path = args.workflow.unwrap_or_else(|| config.workflow_path());
    let workflow = Workflow::load(&workflow_path)
        .with_context(|| format!("loading workflow file {}", workflow_path.display()))?;

    let options = RunOptions {
        headless: !args.headed,
        slow_mo_ms: config.run.slow_mo_ms.unwrap_or(0),
        timeout_secs: args.timeout,
        artifacts_dir: config.artifacts_dir(),
        ..Default::default()
    };

    if !format.is_json() {
        println!("Replaying workflow: {}", workflow.name.bold());
    }
    let report = runner.run_workflow(&workflow, &options).await?;

    if format.is_json() {
        if !report.success() {
            bail!("workflow replay failed: {}", report.failed_message());
        }
        return print_json(&json!({
            "workflow": workflow.name,
            "steps_completed": report.steps_completed(),
            "duration_ms": report.duration_ms,
            "final_url": report.final_url(),
            "screenshots": report.screenshots(),
        }));
    }

    if !report.stdout.is_empty() {
        println!("{}", report.stdout);
    }

    if !report.success() {
        bail!("workflow replay failed: {}", report.failed_message());
    }

    println!(
        "{} {} steps in {} ms, final url: {}",
        "Done:".green().bold(),
        report.steps_completed(),
        report.duration_ms,
        report.final_url().unwrap_or("unknown")
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use replayflow_browser::{QuickSearch, RunReport, RuntimeProbe};
    use serde_json::Value;
    use std::path::{Path, PathBuf};

    struct FixedReportRunner {
        payload: Value,
    }

    #[async_trait]
    impl WorkflowRunner for FixedReportRunner {
        async fn probe_runtime(&self) -> Result<RuntimeProbe> {
            bail!("not exercised here")
        }

        async fn run_workflow(
            &self,
            _workflow: &Workflow,
            _options: &RunOptions,
        ) -> Result<RunReport> {
            Ok(RunReport {
                exit_code: 0,
                duration_ms: 1200,
                stdout: String::new(),
                stderr: String::new(),
                payload: Some(self.payload.clone()),
            })
        }

        async fn run_quick_search(
            &self,
            _search: &QuickSearch,
            _options: &RunOptions,
        ) -> Result<RunReport> {
            bail!("not exercised here")
        }
    }

    fn write_workflow(dir: &Path) -> PathBuf {
        let path = dir.join("recorded_workflow.json");
        std::fs::write(
            &path,
            r#"{"name": "wf", "description": "", "steps": [
                {"type": "navigation", "url": "https://www.baidu.com/", "timestamp": 1}
            ]}"#,
        )
        .unwrap();
        path
    }

    fn run_args(workflow: PathBuf) -> RunArgs {
        RunArgs {
            workflow: Some(workflow),
            headed: false,
            timeout: 120,
        }
    }

    #[tokio::test]
    async fn json_format_reports_successful_replay() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = write_workflow(dir.path());
        let runner = FixedReportRunner {
            payload: json!({
                "success": true,
                "stepsCompleted": 1,
                "finalUrl": "https://www.baidu.com/",
            }),
        };

        let result = run(
            &runner,
            run_args(workflow),
            &CliConfig::default(),
            OutputFormat::Json,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn json_format_fails_on_failed_replay() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = write_workflow(dir.path());
        let runner = FixedReportRunner {
            payload: json!({"success": false, "error": "selector not found"}),
        };

        let err = run(
            &runner,
            run_args(workflow),
            &CliConfig::default(),
            OutputFormat::Json,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("selector not found"));
    }
}
