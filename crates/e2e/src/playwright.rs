//! Playwright browser automation
//!
//! Every browser step of a scenario is compiled into one Node script so the
//! page (and its client-side navigation state) carries across steps. The
//! script prints one marked JSON line per finished step and stops at the
//! first failure.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::spec::{AttributeAssertion, ResponseExpectation, TestStep, DEFAULT_TIMEOUT_MS};

/// Prefix of the per-step report lines on the script's stdout.
pub const STEP_MARKER: &str = "__PADDOCK_STEP__";

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Position of the step in its scenario.
    pub index: usize,
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// One report line as printed by the generated script.
#[derive(Debug, Clone, Deserialize)]
struct StepReport {
    index: usize,
    success: bool,
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    /// Generated scripts are kept here for inspection.
    pub script_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    /// `node_modules` directory holding `@playwright/test`; exported as `NODE_PATH`.
    pub node_modules: Option<PathBuf>,
    /// Upper bound for one whole scenario script.
    pub script_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            script_dir: PathBuf::from("test-results/scripts"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            node_modules: None,
            script_timeout: Duration::from_secs(120),
        }
    }
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_installed()?;

        std::fs::create_dir_all(&config.screenshot_dir)?;
        std::fs::create_dir_all(&config.script_dir)?;

        Ok(Self { config })
    }

    /// Check if Playwright is installed. `--no-install` keeps npx from
    /// prompting for a download.
    pub fn check_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["--no-install", "playwright", "--version"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    fn screenshot_path(&self, name: &str) -> PathBuf {
        self.config.screenshot_dir.join(format!("{}.png", name))
    }

    /// Run the browser steps of a scenario. `steps` pairs each step with its
    /// index in the scenario. Steps after a failure have no result.
    pub async fn run_steps(&self, scenario: &str, steps: &[(usize, &TestStep)]) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(steps);
        let script_path = self.config.script_dir.join(format!("{}.js", sanitize(scenario)));
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright script: {}", script_path.display());
        let (success, stdout, stderr) = self.run_script(&script_path).await?;

        let mut results = Vec::new();
        for report in parse_step_reports(&stdout) {
            let Some((_, step)) = steps.iter().find(|(i, _)| *i == report.index) else {
                continue;
            };
            let screenshot_path = match step {
                TestStep::Screenshot { name, .. } if report.success => Some(self.screenshot_path(name)),
                _ => None,
            };
            results.push(StepResult {
                index: report.index,
                success: report.success,
                step_name: step.name(),
                duration_ms: report.duration_ms,
                error: report.error,
                screenshot_path,
            });
        }

        // A crash before the first step (missing module, browser launch)
        // leaves nothing to attribute the failure to.
        if !success && !results.iter().any(|r| !r.success) {
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(results)
    }

    /// Build the Playwright script for a set of steps
    pub fn build_script(&self, steps: &[(usize, &TestStep)]) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit, expect }} = require('@playwright/test');

const MARKER = {marker};
const report = (r) => console.log(MARKER + JSON.stringify(r));

async function step(index, body) {{
  const start = Date.now();
  try {{
    await body();
    report({{ index, success: true, duration_ms: Date.now() - start }});
  }} catch (error) {{
    report({{ index, success: false, duration_ms: Date.now() - start, error: error.message }});
    throw error;
  }}
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};

  try {{
"#,
            marker = js_str(STEP_MARKER),
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            base_url = js_str(self.config.base_url.trim_end_matches('/')),
        ));

        // Generate step code
        for (index, step) in steps {
            script.push_str(&format!("\n    // Step {}: {}\n", index + 1, step.name()));
            script.push_str(&format!("    await step({}, async () => {{\n", index));
            script.push_str(&self.step_to_js(step));
            script.push_str("\n    });\n");
        }

        // Footer
        script.push_str(
            r#"
  } catch (error) {
    console.error(error.stack || error.message);
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, wait_for_selector, expect_response } => {
                let mut lines = Vec::new();
                if let Some(exp) = expect_response {
                    lines.push(format!(
                        "      const expected = page.waitForResponse((r) => new RegExp({}).test(r.url()), {{ timeout: {} }});",
                        js_str(&exp.url_pattern),
                        exp.timeout_ms
                    ));
                }
                lines.push(format!("      const nav = await page.goto(baseUrl + {});", js_str(url)));
                lines.push(
                    "      if (nav && nav.status() >= 400) throw new Error(`navigation returned ${nav.status()}`);"
                        .to_string(),
                );
                if let Some(exp) = expect_response {
                    lines.push(response_checks(exp));
                }
                if let Some(sel) = wait_for_selector {
                    lines.push(format!(
                        "      await page.waitForSelector({}, {{ timeout: {} }});",
                        js_str(sel),
                        DEFAULT_TIMEOUT_MS
                    ));
                }
                lines.join("\n")
            }
            TestStep::Click { selector, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!("      await page.click({}, {{ timeout: {} }});", js_str(selector), timeout)
            }
            TestStep::Wait { selector, timeout_ms, state } => format!(
                "      await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                js_str(selector),
                state.as_str(),
                timeout_ms
            ),
            TestStep::Sleep { ms } => format!("      await page.waitForTimeout({});", ms),
            TestStep::Assert { selector, visible, text, text_contains, attribute, count } => {
                let loc = format!("page.locator({})", js_str(selector));
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!("      await expect({}).toBeVisible();", loc)),
                    Some(false) => assertions.push(format!("      await expect({}).toBeHidden();", loc)),
                    None => {}
                }
                if let Some(t) = text {
                    assertions.push(format!("      await expect({}).toHaveText({});", loc, js_str(t)));
                }
                if let Some(tc) = text_contains {
                    assertions.push(format!("      await expect({}).toContainText({});", loc, js_str(tc)));
                }
                if let Some(attr) = attribute {
                    assertions.push(attribute_check(&loc, attr));
                }
                if let Some(c) = count {
                    assertions.push(format!("      await expect({}).toHaveCount({});", loc, c));
                }
                if assertions.is_empty() {
                    assertions.push(format!("      await expect({}.first()).toBeAttached();", loc));
                }

                assertions.join("\n")
            }
            TestStep::AssertTitle { pattern } => {
                format!("      await expect(page).toHaveTitle(new RegExp({}));", js_str(pattern))
            }
            TestStep::Screenshot { name, selector, full_page } => {
                let path = self.screenshot_path(name);
                let path = js_str(&path.to_string_lossy());
                match selector {
                    Some(sel) => format!("      await page.locator({}).screenshot({{ path: {} }});", js_str(sel), path),
                    None => format!("      await page.screenshot({{ path: {}, fullPage: {} }});", path, full_page),
                }
            }
            // Harness-side steps never reach the script.
            TestStep::Log { .. } | TestStep::Request { .. } => String::new(),
        }
    }

    /// Execute a script with node. Returns exit success, stdout and stderr.
    async fn run_script(&self, script_path: &Path) -> E2eResult<(bool, String, String)> {
        let mut cmd = TokioCommand::new("node");
        cmd.arg(script_path).kill_on_drop(true);
        if let Some(modules) = &self.config.node_modules {
            cmd.env("NODE_PATH", modules);
        }

        let output = tokio::time::timeout(self.config.script_timeout, cmd.output())
            .await
            .map_err(|_| E2eError::Timeout(format!("script {}", script_path.display())))??;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() {
            info!("[playwright] {}", stderr.trim_end());
        }
        Ok((output.status.success(), stdout, stderr))
    }
}

fn response_checks(exp: &ResponseExpectation) -> String {
    let mut lines = vec![
        "      const response = await expected;".to_string(),
        format!(
            "      if (response.status() !== {status}) throw new Error(`expected status {status} for ${{response.url()}}, got ${{response.status()}}`);",
            status = exp.status
        ),
    ];
    if let Some(ct) = &exp.content_type_contains {
        lines.push(format!(
            "      const contentType = response.headers()['content-type'] || '';\n      if (!contentType.includes({ct})) throw new Error(`expected content-type containing ` + {ct} + `, got ${{contentType}}`);",
            ct = js_str(ct)
        ));
    }
    lines.join("\n")
}

fn attribute_check(loc: &str, attr: &AttributeAssertion) -> String {
    let name = js_str(&attr.name);
    let mut lines = Vec::new();
    match &attr.value {
        Some(val) => lines.push(format!("      await expect({}).toHaveAttribute({}, {});", loc, name, js_str(val))),
        None => lines.push(format!("      await expect({}).toHaveAttribute({});", loc, name)),
    }
    if let Some(c) = &attr.contains {
        lines.push(format!("      expect(await {}.getAttribute({})).toContain({});", loc, name, js_str(c)));
    }
    lines.join("\n")
}

/// Quote a string as a JavaScript literal.
pub fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Extract the step reports from the script's stdout, ignoring other output.
fn parse_step_reports(stdout: &str) -> Vec<StepReport> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(STEP_MARKER))
        .filter_map(|json| serde_json::from_str(json).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{TestSpec, WaitState};
    use test_case::test_case;

    fn handle() -> PlaywrightHandle {
        PlaywrightHandle {
            config: PlaywrightConfig {
                base_url: "http://127.0.0.1:9999/".to_string(),
                screenshot_dir: PathBuf::from("/tmp/shots"),
                ..Default::default()
            },
        }
    }

    fn indexed(spec: &TestSpec) -> Vec<(usize, &TestStep)> {
        spec.steps.iter().enumerate().filter(|(_, s)| s.is_browser_step()).collect()
    }

    #[test]
    fn test_js_str_escapes() {
        assert_eq!(js_str("it's"), r#""it's""#);
        assert_eq!(js_str(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(js_str("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_script_runs_all_steps_on_one_page() {
        let spec = TestSpec::from_yaml(
            r#"
name: nav
steps:
  - action: navigate
    url: /
  - action: log
    message: between
  - action: click
    selector: "a[href='/about']"
  - action: assert
    selector: h2
    text: About Us
"#,
        )
        .unwrap();

        let script = handle().build_script(&indexed(&spec));
        assert_eq!(script.matches("newPage()").count(), 1);
        assert!(script.contains("require('@playwright/test')"));
        assert!(script.contains(r#"const baseUrl = "http://127.0.0.1:9999";"#));
        assert!(script.contains("await step(0, async"));
        assert!(!script.contains("await step(1, async"));
        assert!(script.contains("await step(2, async"));
        assert!(script.contains(r#"await page.click("a[href='/about']", { timeout: 10000 });"#));
        assert!(script.contains(r#"await expect(page.locator("h2")).toHaveText("About Us");"#));
    }

    #[test]
    fn test_expect_response_registered_before_goto() {
        let spec = TestSpec::from_yaml(
            r#"
name: image
steps:
  - action: navigate
    url: /
    expect_response:
      url_pattern: 'horse-[0-9a-f]{8}\.webp'
      content_type_contains: image/webp
"#,
        )
        .unwrap();

        let js = handle().step_to_js(&spec.steps[0]);
        let wait_at = js.find("page.waitForResponse").unwrap();
        let goto_at = js.find("page.goto").unwrap();
        assert!(wait_at < goto_at);
        assert!(js.contains(r#"new RegExp("horse-[0-9a-f]{8}\\.webp")"#));
        assert!(js.contains(r#"contentType.includes("image/webp")"#));
        assert!(js.contains("response.status() !== 200"));
    }

    #[test]
    fn test_assert_variants() {
        let h = handle();
        let step = TestStep::Assert {
            selector: "a.App-link".to_string(),
            visible: Some(true),
            text: None,
            text_contains: None,
            attribute: Some(AttributeAssertion {
                name: "href".to_string(),
                value: Some("https://google.com".to_string()),
                contains: None,
            }),
            count: Some(1),
        };
        let js = h.step_to_js(&step);
        assert!(js.contains("toBeVisible()"));
        assert!(js.contains(r#"toHaveAttribute("href", "https://google.com")"#));
        assert!(js.contains("toHaveCount(1)"));

        let bare = TestStep::Assert {
            selector: "nav".to_string(),
            visible: None,
            text: None,
            text_contains: None,
            attribute: None,
            count: None,
        };
        assert!(h.step_to_js(&bare).contains("toBeAttached()"));
    }

    #[test]
    fn test_title_wait_and_screenshot() {
        let h = handle();
        let title = TestStep::AssertTitle { pattern: r"Vite \+ React".to_string() };
        assert_eq!(
            h.step_to_js(&title),
            r#"      await expect(page).toHaveTitle(new RegExp("Vite \\+ React"));"#
        );

        let wait = TestStep::Wait {
            selector: "#root".to_string(),
            timeout_ms: 10_000,
            state: WaitState::Attached,
        };
        assert!(h.step_to_js(&wait).contains("state: 'attached', timeout: 10000"));

        let shot = TestStep::Screenshot { name: "home".to_string(), selector: None, full_page: true };
        assert!(h.step_to_js(&shot).contains(r#"path: "/tmp/shots/home.png", fullPage: true"#));
    }

    #[test]
    fn test_parse_step_reports() {
        let stdout = format!(
            "noise\n{m}{{\"index\":0,\"success\":true,\"duration_ms\":12}}\n{m}not json\n{m}{{\"index\":2,\"success\":false,\"duration_ms\":3,\"error\":\"Timeout\"}}\n",
            m = STEP_MARKER
        );
        let reports = parse_step_reports(&stdout);
        assert_eq!(reports.len(), 2);
        assert!(reports[0].success);
        assert_eq!(reports[1].index, 2);
        assert_eq!(reports[1].error.as_deref(), Some("Timeout"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("spa fallback/deep"), "spa_fallback_deep");
        assert_eq!(sanitize("home-navigation"), "home-navigation");
    }

    #[test_case("chromium", Browser::Chromium ; "chromium")]
    #[test_case("firefox", Browser::Firefox ; "firefox")]
    #[test_case("webkit", Browser::Webkit ; "webkit")]
    #[test_case("netscape", Browser::Chromium ; "unknown falls back")]
    fn test_browser_parse(name: &str, expected: Browser) {
        assert_eq!(Browser::parse(name), expected);
    }
}
