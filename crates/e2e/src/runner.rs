//! Main test runner that orchestrates the server, Playwright and HTTP checks

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use paddock_common::{AssetManifest, MANIFEST_FILE_NAME};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::{TestSpec, TestStep};

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Main E2E test runner
pub struct TestRunner {
    server_config: ServerConfig,
    playwright_config: PlaywrightConfig,

    /// Target an already running instance instead of spawning one.
    base_url: Option<String>,

    /// Browser scenarios are skipped rather than failed when false.
    browser_enabled: bool,

    /// Running server handle (if any)
    server: Option<ServerHandle>,

    http: reqwest::Client,

    /// Fetched from the server on first asset lookup.
    manifest: Option<AssetManifest>,

    /// Test specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            server_config: config.server,
            playwright_config: config.playwright,
            base_url: config.base_url,
            browser_enabled: config.browser_enabled,
            server: None,
            http,
            manifest: None,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        })
    }

    /// Start the server, unless an external base URL was given
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if let Some(url) = &self.base_url {
            self.playwright_config.base_url = url.trim_end_matches('/').to_string();
            return Ok(());
        }
        if self.server.is_some() {
            return Ok(()); // Already running
        }

        let server = ServerHandle::spawn(self.server_config.clone()).await?;

        // Update playwright config with actual server URL
        self.playwright_config.base_url = server.base_url().to_string();

        self.server = Some(server);
        Ok(())
    }

    /// Stop the server
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.playwright_config.base_url
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag).into_iter().cloned().collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.run_specs(std::slice::from_ref(&spec)).await
    }

    /// Run a list of test specs
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        // Ensure server is running
        self.start_server().await?;

        info!("Running {} test(s) against {}...", specs.len(), self.base_url());

        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => TestResult {
                    name: spec.name.clone(),
                    success: false,
                    skipped: false,
                    duration_ms: 0,
                    steps: vec![],
                    error: Some(e.to_string()),
                },
            };

            if result.skipped {
                skipped += 1;
                warn!("- {} (skipped: {})", result.name, result.error.as_deref().unwrap_or(""));
            } else if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run a single test spec. Browser steps run as one script; request and
    /// log steps run in the harness. Results are reported in step order.
    pub async fn run_spec(&mut self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        if spec.needs_browser() && !self.browser_enabled {
            return Ok(TestResult {
                name: spec.name.clone(),
                success: true,
                skipped: true,
                duration_ms: 0,
                steps: vec![],
                error: Some("Playwright not available".to_string()),
            });
        }

        let mut step_results = Vec::new();

        let browser_steps: Vec<(usize, &TestStep)> = spec
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_browser_step())
            .collect();
        if !browser_steps.is_empty() {
            // Update viewport from spec
            let mut pw_config = self.playwright_config.clone();
            pw_config.viewport_width = spec.viewport.width;
            pw_config.viewport_height = spec.viewport.height;

            let playwright = PlaywrightHandle::new(pw_config)?;
            step_results.extend(playwright.run_steps(&spec.name, &browser_steps).await?);
        }

        for (index, step) in spec.steps.iter().enumerate() {
            if step.is_browser_step() {
                continue;
            }
            let step_start = Instant::now();
            let outcome = self.execute_harness_step(step).await;
            step_results.push(StepResult {
                index,
                success: outcome.is_ok(),
                step_name: step.name(),
                duration_ms: step_start.elapsed().as_millis() as u64,
                error: outcome.err().map(|e| e.to_string()),
                screenshot_path: None,
            });
        }
        step_results.sort_by_key(|r| r.index);

        let test_error = if let Some(failed) = step_results.iter().find(|r| !r.success) {
            Some(format!(
                "{}: {}",
                failed.step_name,
                failed.error.as_deref().unwrap_or("failed")
            ))
        } else if step_results.len() < spec.steps.len() {
            Some(format!(
                "only {} of {} steps reported",
                step_results.len(),
                spec.steps.len()
            ))
        } else {
            None
        };

        Ok(TestResult {
            name: spec.name.clone(),
            success: test_error.is_none(),
            skipped: false,
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            error: test_error,
        })
    }

    async fn execute_harness_step(&mut self, step: &TestStep) -> E2eResult<()> {
        match step {
            TestStep::Log { message } => {
                info!("[TEST LOG] {}", message);
                Ok(())
            }
            TestStep::Request { path, asset, status, content_type_contains, body_contains } => {
                let path = match (path, asset) {
                    (Some(p), _) => p.clone(),
                    (None, Some(logical)) => self.resolve_asset(logical).await?,
                    (None, None) => return Err(E2eError::SpecParse("request without target".to_string())),
                };
                let url = format!("{}{}", self.base_url(), path);
                debug!("GET {}", url);

                let resp = self.http.get(&url).send().await?;
                check_response(resp, *status, content_type_contains.as_deref(), body_contains.as_deref()).await
            }
            other => Err(E2eError::StepFailed {
                step: other.name(),
                reason: "browser step outside the browser".to_string(),
            }),
        }
    }

    /// Public path of a logical asset, via the manifest the server publishes.
    async fn resolve_asset(&mut self, logical: &str) -> E2eResult<String> {
        if self.manifest.is_none() {
            let url = format!("{}/{}", self.base_url(), MANIFEST_FILE_NAME);
            let manifest: AssetManifest = self.http.get(&url).send().await?.error_for_status()?.json().await?;
            self.manifest = Some(manifest);
        }
        match &self.manifest {
            Some(manifest) => Ok(manifest.resolve(logical)?.to_string()),
            None => Err(E2eError::AssertionFailed(format!("no manifest for {}", logical))),
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

async fn check_response(
    resp: reqwest::Response,
    status: u16,
    content_type_contains: Option<&str>,
    body_contains: Option<&str>,
) -> E2eResult<()> {
    let url = resp.url().to_string();
    if resp.status().as_u16() != status {
        return Err(E2eError::AssertionFailed(format!(
            "expected status {} for {}, got {}",
            status,
            url,
            resp.status()
        )));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if let Some(expected) = content_type_contains {
        if !content_type.contains(expected) {
            return Err(E2eError::AssertionFailed(format!(
                "expected content-type containing {:?} for {}, got {:?}",
                expected, url, content_type
            )));
        }
    }

    if let Some(expected) = body_contains {
        let body = resp.text().await?;
        if !body.contains(expected) {
            return Err(E2eError::AssertionFailed(format!(
                "body of {} does not contain {:?}",
                url, expected
            )));
        }
    }
    Ok(())
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub server: ServerConfig,
    pub playwright: PlaywrightConfig,
    pub base_url: Option<String>,
    pub browser_enabled: bool,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            playwright: PlaywrightConfig::default(),
            base_url: None,
            browser_enabled: true,
            specs_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/specs")),
            output_dir: PathBuf::from("test-results"),
        }
    }
}
