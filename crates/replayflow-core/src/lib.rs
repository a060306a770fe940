//! Recorded browser workflow model and Playwright code generation.
//!
//! A workflow is an ordered list of recorded interaction steps (navigation,
//! click, input, key press, scroll) loaded once from a JSON document. This
//! crate turns such a workflow into:
//! - a Playwright test spec (`@playwright/test`)
//! - a standalone Node.js runner script
//!
//! Generation is deterministic: both generators are pure functions of the
//! workflow and an explicit generation timestamp.

pub mod codegen;
pub mod sanitize;
pub mod workflow;

pub use codegen::{generate_runner_script, generate_test_spec};
pub use sanitize::{escape_js_single_quoted, sanitize_selector};
pub use workflow::{Action, Step, Workflow, WorkflowError};
