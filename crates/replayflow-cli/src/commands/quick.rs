use anyhow::{Result, bail};
use colored::Colorize;
use serde_json::json;

use crate::cli::{OutputFormat, QuickArgs};
use crate::config::CliConfig;
use crate::output::print_json;
use replayflow_browser::{QuickSearch, RunOptions, WorkflowRunner};

pub async fn run(
    runner: &dyn WorkflowRunner,
    args: QuickArgs,
    config: &CliConfig,
    format: OutputFormat,
) -> Result<()> {
    let search = QuickSearch::web_search(&args.query, &args.fallback_url);
    let options = RunOptions {
        headless: !args.headed,
        slow_mo_ms: config.run.slow_mo_ms.unwrap_or(0),
        timeout_secs: args.timeout,
        artifacts_dir: config.artifacts_dir(),
        ..Default::default()
    };

    let report = runner.run_quick_search(&search, &options).await?;

    if !report.success() {
        bail!("quick run failed: {}", report.failed_message());
    }

    if format.is_json() {
        return print_json(&json!({
            "matched_strategy": report.matched_strategy(),
            "fallback_used": report.fallback_used(),
            "final_url": report.final_url(),
            "screenshots": report.screenshots(),
            "duration_ms": report.duration_ms,
        }));
    }

    if !report.stdout.is_empty() {
        println!("{}", report.stdout);
    }

    match report.matched_strategy() {
        Some(strategy) => println!(
            "{} link found via strategy `{strategy}`",
            "Done:".green().bold()
        ),
        None if report.fallback_used() => println!(
            "{} no link strategy matched; opened fallback {}",
            "Note:".yellow().bold(),
            args.fallback_url
        ),
        None => {}
    }
    println!("Final url: {}", report.final_url().unwrap_or("unknown"));
    for screenshot in report.screenshots() {
        println!("Screenshot: {screenshot}");
    }

    Ok(())
}
