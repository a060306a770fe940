use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde_json::json;
use std::path::Path;

use crate::cli::{GenerateArgs, OutputFormat};
use crate::config::CliConfig;
use crate::output::print_json;
use replayflow_core::codegen::{generate_runner_script, generate_test_spec};
use replayflow_core::workflow::Workflow;

pub fn run(args: GenerateArgs, config: &CliConfig, format: OutputFormat) -> Result<()> {
    let workflow_path = args.workflow.unwrap_or_else(|| config.workflow_path());
    let workflow = Workflow::load(&workflow_path)
        .with_context(|| format!("loading workflow file {}", workflow_path.display()))?;

    let generated_at = Utc::now();
    let test_path = args.test_path.unwrap_or_else(|| config.test_path());
    let runner_path = args.runner_path.unwrap_or_else(|| config.runner_path());

    write_generated(&test_path, generate_test_spec(&workflow, generated_at))?;
    write_generated(&runner_path, generate_runner_script(&workflow, generated_at))?;

    if format.is_json() {
        return print_json(&json!({
            "workflow": workflow.name,
            "steps": workflow.steps.len(),
            "test_path": test_path,
            "runner_path": runner_path,
        }));
    }

    println!("{} {}", "Generated:".green().bold(), test_path.display());
    println!("{} {}", "Generated:".green().bold(), runner_path.display());
    println!();
    println!(
        "Run the test spec with: npx playwright test {}",
        test_path.display()
    );
    println!(
        "Run the standalone runner with: node {}",
        runner_path.display()
    );

    Ok(())
}

fn write_generated(path: &Path, content: String) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("writing generated file {}", path.display()))?;
    Ok(())
}
