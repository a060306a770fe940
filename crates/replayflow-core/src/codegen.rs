//! Playwright source generation from a recorded workflow.
//!
//! Two targets are emitted: a `@playwright/test` spec and a standalone
//! Node.js runner script. Both iterate the workflow's actions in order and
//! emit one template block per action, collapsing repeat navigations to the
//! URL the script is already on.

use chrono::{DateTime, Utc};

use crate::sanitize::{escape_js_single_quoted, sanitize_selector};
use crate::workflow::{Action, Workflow};

const DEFAULT_PAGE_TIMEOUT_MS: u32 = 30_000;
const CLICK_SETTLE_MS: u32 = 1_000;
const FILL_SETTLE_MS: u32 = 500;
const PRESS_SETTLE_MS: u32 = 500;
const SCROLL_SETTLE_MS: u32 = 1_000;

/// Generate a `@playwright/test` spec replaying the workflow.
///
/// Output is a pure function of the workflow and `generated_at`; identical
/// inputs yield byte-identical text. A workflow with zero steps still yields
/// a syntactically complete, empty-body test.
pub fn generate_test_spec(workflow: &Workflow, generated_at: DateTime<Utc>) -> String {
    let mut script = String::new();

    script.push_str("import { test, expect } from '@playwright/test';\n\n");
    push_header(&mut script, workflow, generated_at);
    script.push_str("test.describe('recorded workflow', () => {\n");
    script.push_str(&format!(
        "    test('replay: {}', async ({{ page }}) => {{\n",
        escape_js_single_quoted(&workflow.name)
    ));
    script.push_str(&format!(
        "        page.setDefaultTimeout({DEFAULT_PAGE_TIMEOUT_MS});\n"
    ));
    script.push_str("        page.on('console', (msg) => console.log('[page]', msg.text()));\n");
    script.push_str(
        "        page.on('pageerror', (error) => console.error('[page error]', error));\n\n",
    );

    let mut last_url: Option<String> = None;
    for action in workflow.actions() {
        emit_test_action(&mut script, &action, &mut last_url, "        ");
    }

    script.push_str("    });\n");
    script.push_str("});\n");

    script
}

/// Generate a standalone Node.js runner script replaying the workflow.
///
/// The runner launches a headful Chromium with a slow-motion delay, replays
/// the actions sequentially, and closes the browser in a `finally` block on
/// every path.
pub fn generate_runner_script(workflow: &Workflow, generated_at: DateTime<Utc>) -> String {
    let mut script = String::new();

    script.push_str("import { chromium } from 'playwright';\n\n");
    push_header(&mut script, workflow, generated_at);
    script.push_str("const browser = await chromium.launch({ headless: false, slowMo: 1000 });\n");
    script.push_str("const page = await browser.newPage();\n");
    script.push_str("await page.setViewportSize({ width: 1920, height: 1080 });\n\n");
    script.push_str("page.on('console', (msg) => console.log('[page]', msg.text()));\n");
    script.push_str("page.on('pageerror', (error) => console.error('[page error]', error));\n\n");
    script.push_str("try {\n");
    script.push_str(&format!(
        "    console.log('replaying workflow: {}');\n\n",
        escape_js_single_quoted(&workflow.name)
    ));

    let mut last_url: Option<String> = None;
    for action in workflow.actions() {
        emit_runner_action(&mut script, &action, &mut last_url, "    ");
    }

    script.push_str("    console.log('workflow finished, final url:', page.url());\n");
    script.push_str("} catch (error) {\n");
    script.push_str("    console.error('workflow failed:', error);\n");
    script.push_str("    process.exitCode = 1;\n");
    script.push_str("} finally {\n");
    script.push_str("    await browser.close();\n");
    script.push_str("}\n");

    script
}

fn push_header(script: &mut String, workflow: &Workflow, generated_at: DateTime<Utc>) {
    script.push_str("/**\n");
    script.push_str(&format!(
        " * Generated from workflow: {}\n",
        comment_text(&workflow.name)
    ));
    if !workflow.description.is_empty() {
        script.push_str(&format!(" * {}\n", comment_text(&workflow.description)));
    }
    script.push_str(&format!(
        " * Generated at: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    script.push_str(" */\n");
}

/// Flatten a recorded value so it cannot terminate a generated comment.
fn comment_text(text: &str) -> String {
    text.replace("*/", "*\\/").replace(['\n', '\r'], " ")
}

fn emit_test_action(
    out: &mut String,
    action: &Action,
    last_url: &mut Option<String>,
    indent: &str,
) {
    match action {
        Action::Navigate { url } => {
            if last_url.as_deref() == Some(url.as_str()) {
                return;
            }
            out.push_str(&format!("{indent}// Navigate to: {}\n", comment_text(url)));
            out.push_str(&format!(
                "{indent}await page.goto('{}');\n",
                escape_js_single_quoted(url)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForLoadState('networkidle');\n\n"
            ));
            *last_url = Some(url.clone());
        }
        Action::Click {
            selector,
            element_text,
        } => {
            let label = element_text
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or("unknown element");
            out.push_str(&format!("{indent}// Click: {}\n", comment_text(label)));
            out.push_str(&format!(
                "{indent}await page.click('{}');\n",
                sanitize_selector(selector)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({CLICK_SETTLE_MS});\n\n"
            ));
        }
        Action::Fill { selector, value } => {
            out.push_str(&format!("{indent}// Fill: {}\n", comment_text(value)));
            out.push_str(&format!(
                "{indent}await page.fill('{}', '{}');\n",
                sanitize_selector(selector),
                escape_js_single_quoted(value)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({FILL_SETTLE_MS});\n\n"
            ));
        }
        Action::Press { key, .. } => {
            out.push_str(&format!("{indent}// Press key: {}\n", comment_text(key)));
            out.push_str(&format!(
                "{indent}await page.keyboard.press('{}');\n",
                escape_js_single_quoted(key)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({PRESS_SETTLE_MS});\n\n"
            ));
        }
        Action::Scroll { x, y } => {
            out.push_str(&format!("{indent}// Scroll by ({x}, {y})\n"));
            out.push_str(&format!("{indent}await page.mouse.wheel({x}, {y});\n"));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({SCROLL_SETTLE_MS});\n\n"
            ));
        }
    }
}

fn emit_runner_action(
    out: &mut String,
    action: &Action,
    last_url: &mut Option<String>,
    indent: &str,
) {
    match action {
        Action::Navigate { url } => {
            if last_url.as_deref() == Some(url.as_str()) {
                return;
            }
            let url_js = escape_js_single_quoted(url);
            out.push_str(&format!("{indent}console.log('navigate: {url_js}');\n"));
            out.push_str(&format!("{indent}await page.goto('{url_js}');\n"));
            out.push_str(&format!(
                "{indent}await page.waitForLoadState('networkidle');\n\n"
            ));
            *last_url = Some(url.clone());
        }
        Action::Click {
            selector,
            element_text,
        } => {
            let label = element_text
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or("unknown element");
            out.push_str(&format!(
                "{indent}console.log('click: {}');\n",
                escape_js_single_quoted(label)
            ));
            out.push_str(&format!(
                "{indent}await page.click('{}');\n",
                sanitize_selector(selector)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({CLICK_SETTLE_MS});\n\n"
            ));
        }
        Action::Fill { selector, value } => {
            out.push_str(&format!(
                "{indent}console.log('fill: {}');\n",
                escape_js_single_quoted(value)
            ));
            out.push_str(&format!(
                "{indent}await page.fill('{}', '{}');\n",
                sanitize_selector(selector),
                escape_js_single_quoted(value)
            ));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({FILL_SETTLE_MS});\n\n"
            ));
        }
        Action::Press { key, .. } => {
            let key_js = escape_js_single_quoted(key);
            out.push_str(&format!("{indent}console.log('press: {key_js}');\n"));
            out.push_str(&format!("{indent}await page.keyboard.press('{key_js}');\n"));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({PRESS_SETTLE_MS});\n\n"
            ));
        }
        Action::Scroll { x, y } => {
            out.push_str(&format!("{indent}console.log('scroll: ({x}, {y})');\n"));
            out.push_str(&format!("{indent}await page.mouse.wheel({x}, {y});\n"));
            out.push_str(&format!(
                "{indent}await page.waitForTimeout({SCROLL_SETTLE_MS});\n\n"
            ));
        }
    }
}
