//! Error types for E2E testing

use thiserror::Error;

/// Run-level errors. These abort the run rather than a single scenario.
#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Browser failed to launch: {0}")]
    BrowserLaunch(String),

    #[error("Application not reachable at {url} after {attempts} attempts")]
    AppUnreachable { url: String, attempts: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Errors raised by a browser session.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No element found for {0}")]
    NoSuchElement(String),

    #[error("Timeout after {timeout_secs:.1}s waiting for: {condition}")]
    Timeout { condition: String, timeout_secs: f64 },

    #[error("No dialog is showing")]
    NoDialog,

    #[error("Unexpected script result: {0}")]
    Script(String),

    #[error("Browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Failure of a single scenario.
///
/// `Assertion` is an expected condition that did not hold and is reported as
/// FAIL. Everything surfacing from the driver is reported as ERROR.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("{0}")]
    Assertion(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ScenarioError {
    pub fn is_assertion(&self) -> bool {
        matches!(self, ScenarioError::Assertion(_))
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
