//! Playwright-over-Node replay runtime for ReplayFlow.
//!
//! Recorded workflows are replayed by building a self-contained Node.js
//! script, writing it to a temp file, and running it with the local `node`
//! binary against the Playwright npm package. The script prints a single
//! marker-prefixed JSON line with the structured outcome; everything else on
//! stdout is passed through as log output.
//!
//! Each run owns exactly one browser session end-to-end and closes it in a
//! `finally` block regardless of success or failure.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use replayflow_core::sanitize::{escape_js_single_quoted, sanitize_selector};
use replayflow_core::workflow::{Action, Workflow};

const RESULT_MARKER: &str = "__REPLAYFLOW_RESULT__=";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const RESULTS_WAIT_MS: u32 = 10_000;
const CLICK_SETTLE_MS: u32 = 1_000;
const FILL_SETTLE_MS: u32 = 500;
const PRESS_SETTLE_MS: u32 = 500;
const SCROLL_SETTLE_MS: u32 = 1_000;

/// Preflight check of the local Node.js / Playwright runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeProbe {
    pub node_available: bool,
    pub node_version: Option<String>,
    pub playwright_package_available: bool,
    pub chromium_cache_detected: bool,
    pub ready: bool,
    pub notes: Vec<String>,
}

impl RuntimeProbe {
    fn empty() -> Self {
        Self {
            node_available: false,
            node_version: None,
            playwright_package_available: false,
            chromium_cache_detected: false,
            ready: false,
            notes: Vec::new(),
        }
    }
}

/// Settings for one replay invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default)]
    pub slow_mo_ms: u64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            slow_mo_ms: 0,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            timeout_secs: default_timeout_secs(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

/// One locator strategy in the link search chain.
///
/// `locator_js` is a JavaScript expression evaluating to a Playwright
/// locator; strategies are tried in order until one matches at least one
/// element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStrategy {
    pub name: String,
    pub locator_js: String,
}

impl LinkStrategy {
    /// Result title links whose text matches the pattern.
    pub fn title_text(pattern: &str) -> Self {
        Self {
            name: "title-text".to_string(),
            locator_js: format!(
                "page.locator('h3 a, .title a').filter({{ hasText: /{}/i }})",
                escape_js_regex(pattern)
            ),
        }
    }

    /// Any link whose href contains the fragment.
    pub fn href_contains(fragment: &str) -> Self {
        Self {
            name: "href-contains".to_string(),
            locator_js: format!(
                "page.locator('a[href*=\"{}\"]')",
                escape_js_single_quoted(fragment)
            ),
        }
    }

    /// Any link whose text matches the pattern.
    pub fn any_link_text(pattern: &str) -> Self {
        Self {
            name: "any-link-text".to_string(),
            locator_js: format!(
                "page.locator('a').filter({{ hasText: /{}/i }})",
                escape_js_regex(pattern)
            ),
        }
    }

    /// The first search result, whatever it is.
    pub fn first_result(selector: &str) -> Self {
        Self {
            name: "first-result".to_string(),
            locator_js: format!("page.locator('{}')", escape_js_single_quoted(selector)),
        }
    }
}

/// Ordered link search chain with a final unconditional fallback URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSearch {
    pub strategies: Vec<LinkStrategy>,
    pub fallback_url: String,
}

/// The built-in search sequence: navigate to a search engine, submit a
/// query, then hunt for a matching result link via the strategy chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickSearch {
    pub engine_url: String,
    pub search_box: String,
    pub results_selector: String,
    pub query: String,
    pub link: LinkSearch,
}

impl QuickSearch {
    /// Standard web search with the default strategy chain.
    pub fn web_search(query: &str, fallback_url: &str) -> Self {
        Self {
            engine_url: "https://www.baidu.com/".to_string(),
            search_box: "#kw".to_string(),
            results_selector: ".result, .c-container".to_string(),
            query: query.to_string(),
            link: LinkSearch {
                strategies: vec![
                    LinkStrategy::title_text(query),
                    LinkStrategy::href_contains(&host_fragment(fallback_url)),
                    LinkStrategy::any_link_text(query),
                    LinkStrategy::first_result(".result h3 a, .c-container h3 a"),
                ],
                fallback_url: fallback_url.to_string(),
            },
        }
    }
}

/// Outcome of one replay run, combining process capture with the structured
/// payload the injected script prints behind the result marker.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    pub payload: Option<Value>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.payload_bool("success")
    }

    pub fn fallback_used(&self) -> bool {
        self.payload_bool("fallbackUsed")
    }

    pub fn steps_completed(&self) -> u64 {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("stepsCompleted"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn matched_strategy(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("matchedStrategy"))
            .and_then(Value::as_str)
    }

    pub fn final_url(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("finalUrl"))
            .and_then(Value::as_str)
    }

    pub fn screenshots(&self) -> Vec<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("screenshots"))
            .and_then(Value::as_array)
            .map(|paths| paths.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn failed_message(&self) -> String {
        if let Some(payload) = &self.payload
            && let Some(error) = payload.get("error").and_then(Value::as_str)
        {
            return error.to_string();
        }

        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }

        format!("replay failed with exit code {}", self.exit_code)
    }

    fn payload_bool(&self, key: &str) -> bool {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Seam between orchestration and the Playwright subprocess.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn probe_runtime(&self) -> Result<RuntimeProbe>;

    async fn run_workflow(&self, workflow: &Workflow, options: &RunOptions) -> Result<RunReport>;

    async fn run_quick_search(
        &self,
        search: &QuickSearch,
        options: &RunOptions,
    ) -> Result<RunReport>;
}

/// Production runner: Node.js subprocess driving Playwright Chromium.
#[derive(Default)]
pub struct PlaywrightRunner;

impl PlaywrightRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkflowRunner for PlaywrightRunner {
    async fn probe_runtime(&self) -> Result<RuntimeProbe> {
        let mut probe = RuntimeProbe::empty();

        let node_probe = run_command_capture("node", &["--version".to_string()], 10).await;
        if let Ok(output) = node_probe
            && output.exit_code == 0
        {
            probe.node_available = true;
            probe.node_version = Some(output.stdout.trim().to_string());
        }

        if probe.node_available {
            let playwright_probe = run_command_capture(
                "node",
                &[
                    "--input-type=module".to_string(),
                    "-e".to_string(),
                    "import('playwright').then(() => process.exit(0)).catch(() => process.exit(1));"
                        .to_string(),
                ],
                15,
            )
            .await;
            probe.playwright_package_available = playwright_probe
                .map(|output| output.exit_code == 0)
                .unwrap_or(false);
        }

        probe.chromium_cache_detected = detect_chromium_cache();
        probe.ready = probe.node_available && probe.playwright_package_available;

        if !probe.node_available {
            probe
                .notes
                .push("Node.js not found. Install Node.js 20+ to enable replay.".to_string());
        }

        if probe.node_available && !probe.playwright_package_available {
            probe
                .notes
                .push("Playwright npm package not found. Run: npm i -D playwright".to_string());
        }

        if probe.ready && !probe.chromium_cache_detected {
            probe.notes.push(
                "Chromium browser binary not found in Playwright cache. Run: npx playwright install chromium".to_string(),
            );
        }

        Ok(probe)
    }

    async fn run_workflow(&self, workflow: &Workflow, options: &RunOptions) -> Result<RunReport> {
        let probe = self.probe_runtime().await?;
        ensure_probe_ready(&probe)?;

        tracing::info!(name = %workflow.name, steps = workflow.steps.len(), "replaying workflow");
        let report = run_node_job(build_workflow_script(workflow, options), options.timeout_secs)
            .await?;

        if !report.success() {
            tracing::error!(message = %report.failed_message(), "workflow replay failed");
        }

        Ok(report)
    }

    async fn run_quick_search(
        &self,
        search: &QuickSearch,
        options: &RunOptions,
    ) -> Result<RunReport> {
        let probe = self.probe_runtime().await?;
        ensure_probe_ready(&probe)?;

        tracing::info!(query = %search.query, "running quick search");
        let report =
            run_node_job(build_quick_search_script(search, options), options.timeout_secs).await?;

        if report.fallback_used() {
            tracing::warn!(
                fallback_url = %search.link.fallback_url,
                "every link strategy failed; navigated to the fallback URL"
            );
        } else if let Some(strategy) = report.matched_strategy() {
            tracing::info!(strategy, "link strategy matched");
        }

        Ok(report)
    }
}

fn ensure_probe_ready(probe: &RuntimeProbe) -> Result<()> {
    if !probe.node_available {
        bail!("Node.js is required for workflow replay");
    }
    if !probe.playwright_package_available {
        bail!("Playwright npm package is not available. Install it with: npm i -D playwright");
    }
    Ok(())
}

fn push_script_preamble(script: &mut String, options: &RunOptions) {
    script.push_str("import fs from 'node:fs';\n");
    script.push_str("import path from 'node:path';\n\n");
    script.push_str(&format!("const RESULT_MARKER = '{}';\n\n", RESULT_MARKER));

    script.push_str("let chromium;\n");
    script.push_str("try {\n");
    script.push_str("  ({ chromium } = await import('playwright'));\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  const message = error && error.stack ? error.stack : String(error);\n");
    script.push_str("  process.stderr.write(message + '\\n');\n");
    script.push_str("  process.stdout.write(`${RESULT_MARKER}${JSON.stringify({ success: false, error: message })}\\n`);\n");
    script.push_str("  process.exitCode = 1;\n");
    script.push_str("  process.exit();\n");
    script.push_str("}\n\n");

    script.push_str(&format!(
        "const browser = await chromium.launch({{ headless: {}, slowMo: {} }});\n",
        options.headless, options.slow_mo_ms
    ));
    script.push_str("const page = await browser.newPage();\n");
    script.push_str(&format!(
        "await page.setViewportSize({{ width: {}, height: {} }});\n\n",
        options.viewport_width, options.viewport_height
    ));

    script.push_str("page.on('console', (msg) => console.log('[page]', msg.text()));\n");
    script.push_str("page.on('pageerror', (error) => console.error('[page error]', error));\n\n");
}

fn push_failure_and_cleanup(script: &mut String, extra_fields: &str) {
    script.push_str("} catch (error) {\n");
    script.push_str("  const message = error && error.stack ? error.stack : String(error);\n");
    script.push_str("  process.stderr.write(message + '\\n');\n");
    script.push_str(&format!(
        "  process.stdout.write(`${{RESULT_MARKER}}${{JSON.stringify({{ success: false, error: message{extra_fields} }})}}\\n`);\n"
    ));
    script.push_str("  process.exitCode = 1;\n");
    script.push_str("} finally {\n");
    script.push_str("  await browser.close().catch(() => {});\n");
    script.push_str("}\n");
}

fn build_workflow_script(workflow: &Workflow, options: &RunOptions) -> String {
    let mut script = String::new();
    push_script_preamble(&mut script, options);

    script.push_str("let stepsCompleted = 0;\n");
    script.push_str("try {\n");

    let mut last_url: Option<String> = None;
    for action in workflow.actions() {
        emit_replay_action(&mut script, &action, &mut last_url);
    }

    script.push_str("  process.stdout.write(`${RESULT_MARKER}${JSON.stringify({ success: true, stepsCompleted, finalUrl: page.url() })}\\n`);\n");
    push_failure_and_cleanup(&mut script, ", stepsCompleted, finalUrl: page.url()");

    script
}

fn emit_replay_action(out: &mut String, action: &Action, last_url: &mut Option<String>) {
    match action {
        Action::Navigate { url } => {
            if last_url.as_deref() == Some(url.as_str()) {
                return;
            }
            let url_js = escape_js_single_quoted(url);
            out.push_str(&format!("  console.log('navigate: {url_js}');\n"));
            out.push_str(&format!("  await page.goto('{url_js}');\n"));
            out.push_str("  await page.waitForLoadState('networkidle');\n");
            *last_url = Some(url.clone());
        }
        Action::Click { selector, .. } => {
            let selector_js = sanitize_selector(selector);
            out.push_str(&format!("  console.log('click: {selector_js}');\n"));
            out.push_str(&format!("  await page.click('{selector_js}');\n"));
            out.push_str(&format!("  await page.waitForTimeout({CLICK_SETTLE_MS});\n"));
        }
        Action::Fill { selector, value } => {
            out.push_str(&format!(
                "  console.log('fill: {}');\n",
                escape_js_single_quoted(value)
            ));
            out.push_str(&format!(
                "  await page.fill('{}', '{}');\n",
                sanitize_selector(selector),
                escape_js_single_quoted(value)
            ));
            out.push_str(&format!("  await page.waitForTimeout({FILL_SETTLE_MS});\n"));
        }
        Action::Press { key, .. } => {
            let key_js = escape_js_single_quoted(key);
            out.push_str(&format!("  console.log('press: {key_js}');\n"));
            out.push_str(&format!("  await page.keyboard.press('{key_js}');\n"));
            out.push_str(&format!("  await page.waitForTimeout({PRESS_SETTLE_MS});\n"));
        }
        Action::Scroll { x, y } => {
            out.push_str(&format!("  console.log('scroll: ({x}, {y})');\n"));
            out.push_str(&format!("  await page.mouse.wheel({x}, {y});\n"));
            out.push_str(&format!(
                "  await page.waitForTimeout({SCROLL_SETTLE_MS});\n"
            ));
        }
    }
    out.push_str("  stepsCompleted += 1;\n\n");
}

fn build_quick_search_script(search: &QuickSearch, options: &RunOptions) -> String {
    let mut script = String::new();
    push_script_preamble(&mut script, options);

    script.push_str(&format!(
        "const artifactsDir = '{}';\n",
        escape_js_single_quoted(&options.artifacts_dir)
    ));
    script.push_str("let matchedStrategy = null;\n");
    script.push_str("let fallbackUsed = false;\n");
    script.push_str("const screenshots = [];\n");
    script.push_str("try {\n");

    let engine_js = escape_js_single_quoted(&search.engine_url);
    script.push_str(&format!("  console.log('navigate: {engine_js}');\n"));
    script.push_str(&format!("  await page.goto('{engine_js}');\n"));
    script.push_str("  await page.waitForLoadState('networkidle');\n\n");

    script.push_str(&format!(
        "  const searchBox = page.locator('{}').first();\n",
        sanitize_selector(&search.search_box)
    ));
    script.push_str("  await searchBox.click();\n");
    script.push_str(&format!(
        "  await searchBox.fill('{}');\n",
        escape_js_single_quoted(&search.query)
    ));
    script.push_str("  await Promise.all([page.waitForNavigation(), searchBox.press('Enter')]);\n");
    script.push_str(&format!(
        "  await page.waitForSelector('{}', {{ timeout: {} }});\n\n",
        escape_js_single_quoted(&search.results_selector),
        RESULTS_WAIT_MS
    ));

    script.push_str("  const strategies = [\n");
    for strategy in &search.link.strategies {
        script.push_str(&format!(
            "    {{ name: '{}', locate: () => {} }},\n",
            escape_js_single_quoted(&strategy.name),
            strategy.locator_js
        ));
    }
    script.push_str("  ];\n\n");

    script.push_str("  for (const strategy of strategies) {\n");
    script.push_str("    try {\n");
    script.push_str("      const candidate = strategy.locate().first();\n");
    script.push_str("      if (await candidate.count() > 0) {\n");
    script.push_str("        await candidate.click();\n");
    script.push_str("        matchedStrategy = strategy.name;\n");
    script.push_str("        console.log('link strategy matched:', strategy.name);\n");
    script.push_str("        break;\n");
    script.push_str("      }\n");
    script.push_str("    } catch (error) {\n");
    script.push_str(
        "      console.log('strategy failed:', strategy.name, error.message ?? String(error));\n",
    );
    script.push_str("    }\n");
    script.push_str("  }\n\n");

    script.push_str("  if (matchedStrategy === null) {\n");
    script.push_str("    fallbackUsed = true;\n");
    script.push_str("    console.log('no link strategy matched, navigating to fallback');\n");
    script.push_str(&format!(
        "    await page.goto('{}');\n",
        escape_js_single_quoted(&search.link.fallback_url)
    ));
    script.push_str("  }\n");
    script.push_str("  await page.waitForLoadState('networkidle');\n\n");

    script.push_str(
        "  const screenshotPath = path.join(artifactsDir, `quick-run-${Date.now()}.png`);\n",
    );
    script.push_str(
        "  await fs.promises.mkdir(path.dirname(screenshotPath), { recursive: true });\n",
    );
    script.push_str("  await page.screenshot({ path: screenshotPath, fullPage: true });\n");
    script.push_str("  screenshots.push(screenshotPath);\n\n");

    script.push_str("  process.stdout.write(`${RESULT_MARKER}${JSON.stringify({ success: true, matchedStrategy, fallbackUsed, finalUrl: page.url(), screenshots })}\\n`);\n");
    push_failure_and_cleanup(
        &mut script,
        ", matchedStrategy, fallbackUsed, finalUrl: page.url(), screenshots",
    );

    script
}

async fn run_node_job(script_content: String, timeout_secs: u64) -> Result<RunReport> {
    let timeout_secs = timeout_secs.max(1);

    let temp_dir = tempfile::Builder::new()
        .prefix("replayflow-script-")
        .tempdir()?;
    let script_path = temp_dir.path().join("runner.mjs");
    std::fs::write(&script_path, script_content)?;

    let started = Instant::now();
    let output =
        run_command_capture("node", &[script_path.display().to_string()], timeout_secs).await?;
    let duration_ms = started.elapsed().as_millis() as u64;
    let (stdout, payload) = extract_result_payload(&output.stdout);

    Ok(RunReport {
        exit_code: output.exit_code,
        duration_ms,
        stdout,
        stderr: output.stderr,
        payload,
    })
}

fn extract_result_payload(stdout: &str) -> (String, Option<Value>) {
    let mut payload: Option<Value> = None;
    let mut clean_lines = Vec::new();

    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix(RESULT_MARKER) {
            if let Ok(value) = serde_json::from_str::<Value>(rest.trim()) {
                payload = Some(value);
            }
            continue;
        }
        clean_lines.push(line.to_string());
    }

    (clean_lines.join("\n"), payload)
}

struct CommandCapture {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

async fn run_command_capture(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<CommandCapture> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(Duration::from_secs(timeout_secs), command.output()).await {
        Ok(result) => result?,
        Err(_) => bail!("Command timed out after {} seconds", timeout_secs),
    };

    Ok(CommandCapture {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn detect_chromium_cache() -> bool {
    if let Ok(path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
        let parsed = PathBuf::from(path);
        if parsed.exists() {
            return true;
        }
    }

    let mut candidates = Vec::new();

    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(&home).join(".cache/ms-playwright"));
        candidates.push(PathBuf::from(&home).join("Library/Caches/ms-playwright"));
    }

    if let Ok(user_profile) = std::env::var("USERPROFILE") {
        candidates.push(PathBuf::from(user_profile).join("AppData/Local/ms-playwright"));
    }

    candidates.into_iter().any(|path| path.exists())
}

fn host_fragment(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    stripped
        .split('/')
        .next()
        .unwrap_or(stripped)
        .to_string()
}

/// Escape a value for embedding in a JavaScript regex literal `/.../i`.
fn escape_js_regex(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']'
            | '\\' | '/' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_artifacts_dir() -> String {
    "test-results".to_string()
}
