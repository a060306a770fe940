use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output::print_json;
use replayflow_browser::WorkflowRunner;

pub async fn run(runner: &dyn WorkflowRunner, format: OutputFormat) -> Result<()> {
    let probe = runner.probe_runtime().await?;

    if format.is_json() {
        return print_json(&probe);
    }

    println!("ReplayFlow Runtime");
    println!(
        "Node.js: {}",
        probe.node_version.as_deref().unwrap_or("not found")
    );
    println!(
        "Playwright package: {}",
        if probe.playwright_package_available {
            "available"
        } else {
            "missing"
        }
    );
    println!(
        "Chromium cache: {}",
        if probe.chromium_cache_detected {
            "detected"
        } else {
            "not detected"
        }
    );
    println!("Ready: {}", if probe.ready { "yes" } else { "no" });
    for note in &probe.notes {
        println!("Note: {note}");
    }

    Ok(())
}
