use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a recorded workflow document.
///
/// Both variants are fatal to the caller: the loader has no recovery path
/// and a partially loaded workflow is never produced.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to read workflow file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workflow document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One recorded browser interaction.
///
/// The JSON shape matches the recorder output: a `type` tag plus
/// type-specific camelCase fields. Selectors are recorded both as a CSS
/// selector and an XPath where available; the CSS form is preferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Navigation {
        url: String,
        timestamp: i64,
    },
    Click {
        #[serde(default, rename = "cssSelector")]
        css_selector: Option<String>,
        #[serde(default)]
        xpath: Option<String>,
        #[serde(default, rename = "elementText")]
        element_text: Option<String>,
        timestamp: i64,
    },
    Input {
        #[serde(default, rename = "cssSelector")]
        css_selector: Option<String>,
        #[serde(default)]
        xpath: Option<String>,
        value: String,
        timestamp: i64,
    },
    KeyPress {
        key: String,
        #[serde(default, rename = "cssSelector")]
        css_selector: Option<String>,
        #[serde(default)]
        xpath: Option<String>,
        timestamp: i64,
    },
    Scroll {
        #[serde(rename = "scrollX")]
        scroll_x: f64,
        #[serde(rename = "scrollY")]
        scroll_y: f64,
        timestamp: i64,
    },
}

impl Step {
    /// Recorded selector for this step, CSS form preferred over XPath.
    pub fn selector(&self) -> Option<&str> {
        match self {
            Step::Click {
                css_selector, xpath, ..
            }
            | Step::Input {
                css_selector, xpath, ..
            }
            | Step::KeyPress {
                css_selector, xpath, ..
            } => css_selector.as_deref().or(xpath.as_deref()),
            _ => None,
        }
    }
}

/// A recorded workflow document. Loaded once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

impl Workflow {
    /// Load a workflow from a JSON document on disk.
    ///
    /// A missing file, invalid JSON, or a document without a `steps` array
    /// all fail here; no partial result is ever returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WorkflowError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let workflow: Workflow = serde_json::from_str(&content)?;
        tracing::info!(
            name = %workflow.name,
            steps = workflow.steps.len(),
            "loaded workflow"
        );
        Ok(workflow)
    }

    /// Normalize the recorded steps into replayable actions, in order.
    pub fn actions(&self) -> Vec<Action> {
        self.steps.iter().map(Action::from_step).collect()
    }
}

/// A normalized step payload, ready for code generation or replay.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate {
        url: String,
    },
    Click {
        selector: String,
        element_text: Option<String>,
    },
    Fill {
        selector: String,
        value: String,
    },
    Press {
        key: String,
        selector: Option<String>,
    },
    Scroll {
        x: f64,
        y: f64,
    },
}

impl Action {
    fn from_step(step: &Step) -> Self {
        let selector = step.selector().unwrap_or_default().to_string();
        match step {
            Step::Navigation { url, .. } => Action::Navigate { url: url.clone() },
            Step::Click { element_text, .. } => Action::Click {
                selector,
                element_text: element_text.clone(),
            },
            Step::Input { value, .. } => Action::Fill {
                selector,
                value: value.clone(),
            },
            Step::KeyPress { key, .. } => Action::Press {
                key: key.clone(),
                selector: step.selector().map(str::to_string),
            },
            Step::Scroll {
                scroll_x, scroll_y, ..
            } => Action::Scroll {
                x: *scroll_x,
                y: *scroll_y,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_recorded_document() {
        let doc = json!({
            "name": "Recorded Workflow",
            "description": "Recorded on 2025/7/26",
            "steps": [
                {"type": "navigation", "url": "https://www.baidu.com/", "timestamp": 1},
                {"type": "click", "cssSelector": "#kw", "elementText": "", "timestamp": 2},
                {"type": "input", "cssSelector": "#kw", "value": "playwright", "timestamp": 3},
                {"type": "key_press", "key": "Enter", "cssSelector": "#kw", "timestamp": 4},
                {"type": "scroll", "scrollX": 0.0, "scrollY": 200.0, "timestamp": 5}
            ]
        });

        let workflow: Workflow = serde_json::from_value(doc).unwrap();
        assert_eq!(workflow.name, "Recorded Workflow");
        assert_eq!(workflow.steps.len(), 5);

        let actions = workflow.actions();
        assert_eq!(
            actions[0],
            Action::Navigate {
                url: "https://www.baidu.com/".to_string()
            }
        );
        assert_eq!(
            actions[2],
            Action::Fill {
                selector: "#kw".to_string(),
                value: "playwright".to_string()
            }
        );
        assert_eq!(
            actions[4],
            Action::Scroll { x: 0.0, y: 200.0 }
        );
    }

    #[test]
    fn css_selector_preferred_over_xpath() {
        let step: Step = serde_json::from_value(json!({
            "type": "click",
            "cssSelector": "#su",
            "xpath": "id(\"su\")",
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(step.selector(), Some("#su"));
    }

    #[test]
    fn xpath_used_when_css_selector_missing() {
        let step: Step = serde_json::from_value(json!({
            "type": "click",
            "xpath": "id(\"su\")",
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(step.selector(), Some("id(\"su\")"));
    }

    #[test]
    fn missing_steps_field_is_a_parse_error() {
        let result = serde_json::from_value::<Workflow>(json!({
            "name": "broken",
            "description": ""
        }));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("steps"));
    }

    #[test]
    fn unknown_step_type_is_a_parse_error() {
        let result = serde_json::from_value::<Workflow>(json!({
            "name": "broken",
            "steps": [{"type": "hover", "timestamp": 1}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Workflow::load("/nonexistent/recorded_workflow.json").unwrap_err();
        assert!(matches!(err, WorkflowError::Read { .. }));
    }

    #[test]
    fn load_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorded_workflow.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Workflow::load(&path).unwrap_err();
        assert!(matches!(err, WorkflowError::Parse(_)));
    }
}
