//! Paddock E2E Test Framework
//!
//! Rust-controlled end-to-end testing:
//! - Spawns `paddock-web` as a subprocess (or targets a running instance)
//! - Drives Playwright through a generated Node script per scenario
//! - Parses declarative YAML scenarios
//! - Runs browser-less HTTP request steps with `reqwest`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle | --base-url          │
//! │    ├── run_spec(spec) -> TestResult                         │
//! │    │     ├── browser steps -> one Playwright script         │
//! │    │     └── request / log steps -> harness                 │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags, viewport                    │
//! │    └── steps: [TestStep]                                    │
//! │          ├── navigate { url, expect_response? }             │
//! │          ├── click / wait / sleep                           │
//! │          ├── assert { selector, visible?, text?, attr? }    │
//! │          ├── assert_title { pattern }                       │
//! │          ├── screenshot { name, selector? }                 │
//! │          └── request { path | asset, status }               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, TestRunner, TestSuiteResult};
pub use spec::{TestSpec, TestStep};
