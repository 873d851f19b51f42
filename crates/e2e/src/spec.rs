//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// Default bound for every wait in a scenario.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
        #[serde(default)]
        expect_response: Option<ResponseExpectation>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Assert the document title matches a regular expression
    AssertTitle {
        pattern: String,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },

    /// Plain HTTP request, no browser involved. Exactly one of `path` or
    /// `asset` (a logical name looked up in the served asset manifest).
    Request {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        asset: Option<String>,
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        content_type_contains: Option<String>,
        #[serde(default)]
        body_contains: Option<String>,
    },
}

fn default_wait_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

/// A response the page must receive while navigating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseExpectation {
    /// Regular expression matched against the response URL.
    pub url_pattern: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub content_type_contains: Option<String>,
    #[serde(default = "default_wait_timeout")]
    pub timeout_ms: u64,
}

impl TestStep {
    /// Short label used in logs and results.
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::AssertTitle { pattern } => format!("assert_title:{}", pattern),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
            TestStep::Request { path, asset, .. } => match (path, asset) {
                (Some(p), _) => format!("request:{}", p),
                (None, Some(a)) => format!("request:asset:{}", a),
                (None, None) => "request".to_string(),
            },
        }
    }

    /// Whether the step drives the browser page. The others run in the harness.
    pub fn is_browser_step(&self) -> bool {
        !matches!(self, TestStep::Log { .. } | TestStep::Request { .. })
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, ordered by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    pub fn needs_browser(&self) -> bool {
        self.steps.iter().any(TestStep::is_browser_step)
    }

    fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("{}: no steps", self.name)));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if let TestStep::Request { path, asset, .. } = step {
                if path.is_some() == asset.is_some() {
                    return Err(E2eError::SpecParse(format!(
                        "{}: step {} needs exactly one of `path` or `asset`",
                        self.name,
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_spec() {
        let yaml = r#"
name: home-navigation
description: Navigate between the two views
tags:
  - smoke
steps:
  - action: navigate
    url: /
    wait_for_selector: nav
  - action: assert_title
    pattern: 'Vite \+ React'
  - action: click
    selector: 'nav >> text=About'
  - action: assert
    selector: h2
    text: About Us
  - action: screenshot
    name: about
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "home-navigation");
        assert_eq!(spec.steps.len(), 5);
        assert_eq!(spec.viewport.width, 1280);
        assert!(spec.needs_browser());
        assert!(matches!(&spec.steps[1], TestStep::AssertTitle { pattern } if pattern == r"Vite \+ React"));
    }

    #[test]
    fn test_wait_defaults() {
        let yaml = r#"
name: wait-defaults
steps:
  - action: wait
    selector: '#root'
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        match &spec.steps[0] {
            TestStep::Wait { timeout_ms, state, .. } => {
                assert_eq!(*timeout_ms, DEFAULT_TIMEOUT_MS);
                assert_eq!(*state, WaitState::Visible);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_expect_response_defaults() {
        let yaml = r#"
name: image
steps:
  - action: navigate
    url: /
    expect_response:
      url_pattern: 'horse-[0-9a-f]+\.webp'
      content_type_contains: image/webp
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        let TestStep::Navigate { expect_response: Some(exp), .. } = &spec.steps[0] else {
            panic!("expected navigate with expect_response");
        };
        assert_eq!(exp.status, 200);
        assert_eq!(exp.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_request_only_spec_needs_no_browser() {
        let yaml = r#"
name: assets
steps:
  - action: request
    asset: horse.webp
    content_type_contains: image/webp
  - action: log
    message: done
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert!(!spec.needs_browser());
        assert_eq!(spec.steps[0].name(), "request:asset:horse.webp");
    }

    #[test]
    fn test_request_needs_exactly_one_target() {
        let both = r#"
name: bad
steps:
  - action: request
    path: /
    asset: horse.webp
"#;
        assert!(matches!(TestSpec::from_yaml(both), Err(E2eError::SpecParse(_))));

        let neither = r#"
name: bad
steps:
  - action: request
    status: 200
"#;
        assert!(matches!(TestSpec::from_yaml(neither), Err(E2eError::SpecParse(_))));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let yaml = r#"
name: bad
steps:
  - action: teleport
    url: /
"#;
        assert!(TestSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "name: b\ntags: [smoke]\nsteps:\n  - action: log\n    message: b\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.yml"),
            "name: a\nsteps:\n  - action: log\n    message: a\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let specs = TestSpec::load_all(dir.path()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let smoke = TestSpec::filter_by_tag(&specs, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "b");
    }

    #[test]
    fn test_home_navigation_rechecks_link_after_round_trip() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("specs/home_navigation.yaml");
        let spec = TestSpec::from_file(&path).unwrap();

        let back_home = spec
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::Click { selector, .. } if selector == r#"nav a[href="/"]"#))
            .unwrap();
        let link_checked = spec.steps[back_home..].iter().any(|s| match s {
            TestStep::Assert { selector, text, attribute: Some(attr), .. } => {
                selector == "a.App-link"
                    && text.as_deref() == Some("Go to Google")
                    && attr.name == "href"
                    && attr.value.as_deref() == Some("https://google.com")
            }
            _ => false,
        });
        assert!(link_checked);
    }
}
