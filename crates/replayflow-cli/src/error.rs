use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("node.js") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Install Node.js 20+ and make sure `node` is on your PATH.");
    }

    if msg.contains("playwright") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Install the Playwright package and browser:");
        eprintln!("  {} npm i -D playwright", "$".dimmed());
        eprintln!("  {} npx playwright install chromium", "$".dimmed());
    }

    if msg.contains("workflow file") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Pass the recording path explicitly:");
        eprintln!("  {} replayflow generate path/to/recorded_workflow.json", "$".dimmed());
    }

    std::process::exit(1);
}
