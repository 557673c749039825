//! Runner that sequences scenarios against one browser session and
//! aggregates their outcomes

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::chrome::ChromeSession;
use crate::config::RunnerConfig;
use crate::driver::BrowserSession;
use crate::error::{E2eResult, ScenarioError};
use crate::outcome::{Diagnostic, Observed, RunSummary, TestOutcome};
use crate::probe::wait_for_app;
use crate::report::{write_results_json, ReportRenderer};
use crate::scenario::{format_panic_trace, format_traceback, Scenario, ScenarioContext};
use crate::scenarios::{CrudScenario, LOGIN_PAGE};
use crate::screenshot::ScreenshotRecorder;

/// State of one run: configuration, screenshot sink, and the summary being
/// built up
pub struct RunContext<'a> {
    config: &'a RunnerConfig,
    recorder: ScreenshotRecorder,
    summary: RunSummary,
    started: Instant,
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a RunnerConfig) -> Self {
        Self {
            config,
            recorder: ScreenshotRecorder::new(&config.screenshots_dir),
            summary: RunSummary::new(),
            started: Instant::now(),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Run one scenario to completion and record its outcome. Errors and
    /// panics inside the scenario end up in the outcome, never here.
    pub async fn run_scenario<S, Sc>(&mut self, session: &S, scenario: &Sc) -> &TestOutcome
    where
        S: BrowserSession,
        Sc: Scenario<S> + ?Sized,
    {
        let name = scenario.name().to_string();
        debug!("Running test: {}", name);

        let outcome = TestOutcome::started(&name, scenario.description());
        let start = Instant::now();
        let mut ctx = ScenarioContext::new(session, self.config, &self.recorder, &name);

        let result = AssertUnwindSafe(scenario.run(&mut ctx)).catch_unwind().await;
        let elapsed = start.elapsed();

        let observed = match result {
            Ok(Ok(())) => Observed::clean(),
            Ok(Err(e)) => {
                let diagnostic = Diagnostic {
                    message: e.to_string(),
                    traceback: format_traceback(&e, ctx.steps()),
                };
                match e {
                    ScenarioError::Assertion(_) => Observed::failure(diagnostic),
                    ScenarioError::Driver(_) => Observed::error(diagnostic),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                Observed::error(Diagnostic {
                    traceback: format_panic_trace(&message, ctx.steps()),
                    message,
                })
            }
        };

        let (screenshots, steps) = ctx.into_parts();
        let outcome = outcome.finalize(elapsed, screenshots, steps, observed);

        if outcome.status.is_pass() {
            info!("✓ {} ({:.2} s)", outcome.name, outcome.duration);
        } else {
            error!("✗ {} [{}] - {}", outcome.name, outcome.status, outcome.message);
        }

        self.summary.record(outcome);
        let recorded = self.summary.tests().len() - 1;
        &self.summary.tests()[recorded]
    }

    /// Close the run: stamp the wall-clock time and hand back the summary
    pub fn finish(mut self) -> RunSummary {
        self.summary.finish(self.started.elapsed());
        self.summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "scenario panicked".to_string()
    }
}

/// Files produced by a finished run
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub summary: RunSummary,
    pub report_path: PathBuf,
    pub results_path: PathBuf,
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `scenarios` in order against `session`. Every scenario runs even if
    /// earlier ones fail.
    pub async fn execute<S, Sc>(&self, session: &S, scenarios: &[Sc]) -> RunSummary
    where
        S: BrowserSession,
        Sc: Scenario<S>,
    {
        let mut run = RunContext::new(&self.config);

        info!("Running {} test(s)...", scenarios.len());

        for scenario in scenarios {
            run.run_scenario(session, scenario).await;
        }

        let summary = run.finish();

        info!("");
        info!(
            "Test Results: {} passed, {} failed ({:.2} s)",
            summary.passed(),
            summary.failed(),
            summary.total_time()
        );

        summary
    }

    /// Run the CRUD suite (optionally filtered by name) in a fresh Chrome
    /// session and write the HTML report and JSON results.
    pub async fn run_suite(&self, filter: Option<&str>) -> E2eResult<RunArtifacts> {
        self.config.validate()?;
        self.config.ensure_dirs()?;

        if self.config.preflight {
            wait_for_app(&self.config.url(LOGIN_PAGE), self.config.timeouts.probe()).await?;
        }

        let session = ChromeSession::launch(&self.config.browser, &self.config.downloads_dir).await?;
        self.run_with_session(session, filter).await
    }

    /// Run the CRUD suite on an already acquired session, then release it
    /// whatever the outcome and write the artifacts.
    pub async fn run_with_session<S: BrowserSession>(
        &self,
        session: S,
        filter: Option<&str>,
    ) -> E2eResult<RunArtifacts> {
        let scenarios = CrudScenario::selected(filter);
        if scenarios.is_empty() {
            warn!("No scenario matches filter {:?}", filter);
        }

        let summary = self.execute(&session, &scenarios).await;

        if let Err(e) = session.quit().await {
            warn!("Error closing browser: {}", e);
        }

        self.write_artifacts(summary)
    }

    /// Write the HTML report and `test-results.json` for a finished run
    pub fn write_artifacts(&self, summary: RunSummary) -> E2eResult<RunArtifacts> {
        let renderer = ReportRenderer::new(&self.config.reports_dir, &self.config.report_title);
        let report_path = renderer.write(&summary)?;
        let results_path = write_results_json(&summary, &self.config.output_dir)?;

        Ok(RunArtifacts {
            summary,
            report_path,
            results_path,
        })
    }
}
