use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "replayflow")]
#[command(version, about = "ReplayFlow - recorded browser workflow codegen and replay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a Playwright test spec and standalone runner from a recording
    Generate(GenerateArgs),

    /// Replay a recorded workflow through Playwright
    Run(RunArgs),

    /// Run the built-in search workflow with the link fallback chain
    Quick(QuickArgs),

    /// Check the local Node.js / Playwright runtime
    Probe,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the recorded workflow JSON (defaults to the configured path)
    pub workflow: Option<PathBuf>,

    /// Where to write the generated test spec
    #[arg(long)]
    pub test_path: Option<PathBuf>,

    /// Where to write the generated standalone runner
    #[arg(long)]
    pub runner_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the recorded workflow JSON (defaults to the configured path)
    pub workflow: Option<PathBuf>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Replay timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
}

#[derive(Args)]
pub struct QuickArgs {
    /// Search query
    #[arg(long, default_value = "playwright")]
    pub query: String,

    /// URL opened when every link strategy fails
    #[arg(long, default_value = "https://playwright.dev/")]
    pub fallback_url: String,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Replay timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
}
