//! Runner configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL of the application under test (no trailing slash needed)
    pub base_url: String,

    /// Account used by the login scenario
    pub credentials: Credentials,

    /// Browser launch options
    pub browser: BrowserOptions,

    /// Where checkpoint screenshots are written
    pub screenshots_dir: PathBuf,

    /// Where the browser saves downloads (PDF export)
    pub downloads_dir: PathBuf,

    /// Where HTML reports are written
    pub reports_dir: PathBuf,

    /// Where the JSON results file is written
    pub output_dir: PathBuf,

    /// Wait bounds
    pub timeouts: Timeouts,

    /// Title shown at the top of the HTML report
    pub report_title: String,

    /// Check the application answers before launching the browser
    pub preflight: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/BreakingBadweb".to_string(),
            credentials: Credentials::default(),
            browser: BrowserOptions::default(),
            screenshots_dir: PathBuf::from("screenshots"),
            downloads_dir: PathBuf::from("downloads"),
            reports_dir: PathBuf::from("reports"),
            output_dir: PathBuf::from("test-results"),
            timeouts: Timeouts::default(),
            report_title: "Reporte de Pruebas - Breaking Bad CRUD".to_string(),
            preflight: true,
        }
    }
}

impl RunnerConfig {
    /// Parse a configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        for (key, secs) in [
            ("wait_secs", self.timeouts.wait_secs),
            ("dialog_secs", self.timeouts.dialog_secs),
        ] {
            if !(secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()) {
                return Err(E2eError::Config(format!(
                    "timeouts.{} must be a positive number of seconds, got {}",
                    key, secs
                )));
            }
        }
        if Duration::try_from_secs_f64(self.timeouts.probe_secs).is_err() {
            return Err(E2eError::Config(format!(
                "timeouts.probe_secs must be a non-negative number of seconds, got {}",
                self.timeouts.probe_secs
            )));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(E2eError::Config("poll_interval_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Absolute URL for a path on the application
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Create every output directory the run writes into
    pub fn ensure_dirs(&self) -> E2eResult<()> {
        for dir in [
            &self.screenshots_dir,
            &self.downloads_dir,
            &self.reports_dir,
            &self.output_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "test".to_string(),
            password: "password".to_string(),
        }
    }
}

/// Browser launch options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,

    /// Disable to pass `--no-sandbox` (needed in most containers)
    pub sandbox: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,

    /// Timeout for a single DevTools request
    pub request_timeout_secs: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chrome_executable: None,
            window_width: 1920,
            window_height: 1080,
            request_timeout_secs: 30,
        }
    }
}

/// Wait bounds, in seconds unless noted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Default bound for wait-until conditions
    pub wait_secs: f64,

    /// Bound for the optional confirmation dialog on delete
    pub dialog_secs: f64,

    pub poll_interval_ms: u64,

    /// How long the pre-flight probe keeps retrying the application
    pub probe_secs: f64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wait_secs: 10.0,
            dialog_secs: 3.0,
            poll_interval_ms: 500,
            probe_secs: 10.0,
        }
    }
}

impl Timeouts {
    pub fn wait(&self) -> Duration {
        Duration::from_secs_f64(self.wait_secs)
    }

    pub fn dialog(&self) -> Duration {
        Duration::from_secs_f64(self.dialog_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs_f64(self.probe_secs)
    }
}
