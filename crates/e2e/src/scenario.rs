//! Scenario trait and the per-scenario execution context

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt::{Debug, Write as _};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::RunnerConfig;
use crate::driver::{BrowserSession, Locator};
use crate::error::{DriverError, ScenarioError, ScenarioResult};
use crate::outcome::StepRecord;
use crate::screenshot::ScreenshotRecorder;
use crate::wait::Wait;

/// One user-facing test case
#[async_trait]
pub trait Scenario<S: BrowserSession>: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()>;
}

#[async_trait]
impl<S: BrowserSession, T: Scenario<S> + ?Sized> Scenario<S> for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()> {
        (**self).run(ctx).await
    }
}

/// What a scenario sees while it runs: the session, the run configuration,
/// and a log of what it has done so far.
pub struct ScenarioContext<'a, S: BrowserSession> {
    session: &'a S,
    config: &'a RunnerConfig,
    recorder: &'a ScreenshotRecorder,
    test_name: String,
    screenshots: Vec<PathBuf>,
    steps: Vec<StepRecord>,
}

impl<'a, S: BrowserSession> ScenarioContext<'a, S> {
    pub fn new(
        session: &'a S,
        config: &'a RunnerConfig,
        recorder: &'a ScreenshotRecorder,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            session,
            config,
            recorder,
            test_name: test_name.into(),
            screenshots: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn session(&self) -> &'a S {
        self.session
    }

    pub fn config(&self) -> &'a RunnerConfig {
        self.config
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Wait with the run's default bound
    pub fn wait(&self) -> Wait {
        self.wait_for(self.config.timeouts.wait())
    }

    pub fn wait_for(&self, timeout: Duration) -> Wait {
        Wait::new(timeout).poll_interval(self.config.timeouts.poll_interval())
    }

    /// Run one driver action and log it as a step
    pub async fn step<T, F>(&mut self, name: impl Into<String>, action: F) -> ScenarioResult<T>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        let name = name.into();
        debug!("[{}] {}", self.test_name, name);
        let start = Instant::now();
        let result = action.await;
        self.steps.push(StepRecord {
            name,
            duration_ms: start.elapsed().as_millis() as u64,
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result.map_err(ScenarioError::from)
    }

    pub async fn navigate(&mut self, path: &str) -> ScenarioResult<()> {
        let session = self.session;
        let url = self.config.url(path);
        self.step(format!("navigate {}", url), session.navigate(&url))
            .await
    }

    pub async fn find(&mut self, locator: &Locator) -> ScenarioResult<S::Element> {
        let session = self.session;
        self.step(format!("locate {}", locator), session.locate(locator))
            .await
    }

    pub async fn count(&mut self, locator: &Locator) -> ScenarioResult<usize> {
        let session = self.session;
        self.step(format!("count {}", locator), async move {
            Ok(session.locate_all(locator).await?.len())
        })
        .await
    }

    pub async fn type_into(&mut self, locator: &Locator, text: &str) -> ScenarioResult<()> {
        let session = self.session;
        self.step(format!("type '{}' into {}", text, locator), async move {
            let element = session.locate(locator).await?;
            session.send_keys(&element, text).await
        })
        .await
    }

    pub async fn clear(&mut self, locator: &Locator) -> ScenarioResult<()> {
        let session = self.session;
        self.step(format!("clear {}", locator), async move {
            let element = session.locate(locator).await?;
            session.clear(&element).await
        })
        .await
    }

    pub async fn click(&mut self, locator: &Locator) -> ScenarioResult<()> {
        let session = self.session;
        self.step(format!("click {}", locator), async move {
            let element = session.locate(locator).await?;
            session.click(&element).await
        })
        .await
    }

    /// Click an element obtained from an earlier wait or lookup
    pub async fn click_element(&mut self, element: &S::Element, what: &str) -> ScenarioResult<()> {
        let session = self.session;
        self.step(format!("click {}", what), session.click(element))
            .await
    }

    pub async fn wait_present(&mut self, locator: &Locator) -> ScenarioResult<S::Element> {
        let session = self.session;
        let wait = self.wait();
        self.step(
            format!("wait for presence of {}", locator),
            wait.until_present(session, locator),
        )
        .await
    }

    pub async fn wait_clickable(&mut self, locator: &Locator) -> ScenarioResult<S::Element> {
        let session = self.session;
        let wait = self.wait();
        self.step(
            format!("wait for {} to be clickable", locator),
            wait.until_clickable(session, locator),
        )
        .await
    }

    pub async fn wait_invisible(&mut self, locator: &Locator) -> ScenarioResult<()> {
        let session = self.session;
        let wait = self.wait();
        self.step(
            format!("wait for invisibility of {}", locator),
            wait.until_invisible(session, locator),
        )
        .await
    }

    /// Accept a dialog if one shows up within `timeout`. Returns whether one
    /// did; no dialog is not an error.
    pub async fn accept_optional_dialog(&mut self, timeout: Duration) -> ScenarioResult<bool> {
        let session = self.session;
        let wait = self.wait_for(timeout);
        self.step("accept optional dialog", async move {
            match wait.until_dialog_accepted(session).await {
                Ok(()) => Ok(true),
                Err(DriverError::Timeout { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn current_url(&mut self) -> ScenarioResult<String> {
        let session = self.session;
        self.step("read current url", session.current_url()).await
    }

    /// Screenshot at a named checkpoint. Never fails the scenario.
    pub async fn checkpoint(&mut self, label: &str) -> Option<PathBuf> {
        let path = self
            .recorder
            .capture(self.session, &self.test_name, label)
            .await;
        if let Some(path) = &path {
            self.screenshots.push(path.clone());
        }
        path
    }

    pub fn ensure(&mut self, condition: bool, message: impl Into<String>) -> ScenarioResult<()> {
        let message = message.into();
        self.steps.push(StepRecord {
            name: format!("assert {}", message),
            duration_ms: 0,
            success: condition,
            error: (!condition).then(|| "assertion failed".to_string()),
        });
        if condition {
            Ok(())
        } else {
            Err(ScenarioError::Assertion(message))
        }
    }

    pub fn assert_contains(&mut self, haystack: &str, needle: &str) -> ScenarioResult<()> {
        self.ensure(
            haystack.contains(needle),
            format!("expected '{}' to contain '{}'", haystack, needle),
        )
    }

    pub fn assert_equal<T: PartialEq + Debug>(&mut self, left: T, right: T) -> ScenarioResult<()> {
        let message = format!("expected {:?} == {:?}", left, right);
        self.ensure(left == right, message)
    }

    /// Hand back what the scenario captured: screenshots and step log
    pub fn into_parts(self) -> (Vec<PathBuf>, Vec<StepRecord>) {
        (self.screenshots, self.steps)
    }
}

/// Render an error chain plus the step log as a readable trace
pub fn format_traceback(error: &(dyn StdError + 'static), steps: &[StepRecord]) -> String {
    let mut out = format!("Error: {}\n", error);
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "Caused by: {}", cause);
        source = cause.source();
    }
    append_steps(&mut out, steps);
    out
}

/// Trace for a scenario that panicked
pub fn format_panic_trace(message: &str, steps: &[StepRecord]) -> String {
    let mut out = format!("Panic: {}\n", message);
    append_steps(&mut out, steps);
    out
}

fn append_steps(out: &mut String, steps: &[StepRecord]) {
    if steps.is_empty() {
        return;
    }
    out.push_str("Steps:\n");
    for (i, step) in steps.iter().enumerate() {
        let _ = write!(out, "  {:>2}. {} ({} ms)", i + 1, step.name, step.duration_ms);
        match &step.error {
            Some(e) => {
                let _ = writeln!(out, " FAILED: {}", e);
            }
            None => out.push_str(" ok\n"),
        }
    }
}
