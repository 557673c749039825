//! Per-scenario outcomes and the run-level summary

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Error => "ERROR",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and trace of something that went wrong in a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub traceback: String,
}

/// How a scenario body ended, normalized: an unhandled error, an assertion
/// failure, or neither.
#[derive(Debug, Clone, Default)]
pub struct Observed {
    pub error: Option<Diagnostic>,
    pub failure: Option<Diagnostic>,
}

impl Observed {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn error(diagnostic: Diagnostic) -> Self {
        Self {
            error: Some(diagnostic),
            failure: None,
        }
    }

    pub fn failure(diagnostic: Diagnostic) -> Self {
        Self {
            error: None,
            failure: Some(diagnostic),
        }
    }
}

/// Unhandled errors win over assertion failures.
pub fn classify(error: Option<&Diagnostic>, failure: Option<&Diagnostic>) -> TestStatus {
    match (error, failure) {
        (Some(_), _) => TestStatus::Error,
        (None, Some(_)) => TestStatus::Fail,
        (None, None) => TestStatus::Pass,
    }
}

/// One driver action performed by a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub description: String,
    pub status: TestStatus,
    pub message: String,
    pub traceback: String,
    /// Seconds
    pub duration: f64,
    pub screenshots: Vec<PathBuf>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl TestOutcome {
    /// Outcome as it stands when a scenario starts
    pub fn started(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status: TestStatus::Pass,
            message: String::new(),
            traceback: String::new(),
            duration: 0.0,
            screenshots: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Close the outcome once the scenario has ended.
    ///
    /// Only screenshots that still exist on disk are kept.
    pub fn finalize(
        mut self,
        elapsed: Duration,
        screenshots: Vec<PathBuf>,
        steps: Vec<StepRecord>,
        observed: Observed,
    ) -> Self {
        self.duration = elapsed.as_secs_f64();
        self.screenshots = screenshots.into_iter().filter(|p| p.exists()).collect();
        self.steps = steps;
        self.status = classify(observed.error.as_ref(), observed.failure.as_ref());

        if let Some(diag) = observed.error.or(observed.failure) {
            self.message = diag.message;
            self.traceback = diag.traceback;
        }
        self
    }
}

/// Aggregate of every outcome in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    total: usize,
    passed: usize,
    failed: usize,
    /// Wall-clock seconds for the whole run, set by [`RunSummary::finish`]
    total_time: f64,
    started_at: DateTime<Local>,
    tests: Vec<TestOutcome>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            total: 0,
            passed: 0,
            failed: 0,
            total_time: 0.0,
            started_at: Local::now(),
            tests: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: TestOutcome) {
        self.total += 1;
        if outcome.status.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.tests.push(outcome);
    }

    /// Set the run's wall-clock time. Includes time spent between scenarios.
    pub fn finish(&mut self, elapsed: Duration) {
        self.total_time = elapsed.as_secs_f64();
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn tests(&self) -> &[TestOutcome] {
        &self.tests
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}
