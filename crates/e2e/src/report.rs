//! HTML report and JSON results output

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::outcome::{RunSummary, TestOutcome, TestStatus};

const STYLE: &str = r#"
      body { font-family: Arial, sans-serif; margin: 20px; }
      h1 { color: #2c3e50; }
      .test-case { margin-bottom: 20px; border: 1px solid #ddd; padding: 15px; border-radius: 5px; }
      .passed { background-color: #d4edda; border-color: #c3e6cb; }
      .failed { background-color: #f8d7da; border-color: #f5c6cb; }
      .error { background-color: #fff3cd; border-color: #ffeeba; }
      .screenshot { margin-top: 10px; border: 1px solid #aaa; max-width: 100%; height: auto; }
      .summary { background-color: #f8f9fa; padding: 15px; margin-bottom: 20px; }
      .timestamp { color: #6c757d; font-size: 0.9em; }
      .error-message { color: #dc3545; font-weight: bold; }
      .stack-trace { font-family: monospace; white-space: pre; background-color: #f8f9fa; padding: 10px; overflow-x: auto; }
      .screenshot-container { margin: 10px 0; }
      .screenshot-name { font-size: 0.8em; color: #666; }
"#;

/// Renders a [`RunSummary`] into a standalone HTML page
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    reports_dir: PathBuf,
    title: String,
}

impl ReportRenderer {
    pub fn new(reports_dir: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            title: title.into(),
        }
    }

    /// Render the page. Screenshot links are relative to the reports
    /// directory; screenshots missing on disk are left out.
    pub fn render(&self, summary: &RunSummary, generated_at: DateTime<Local>) -> E2eResult<String> {
        let report_dir = absolutize(&self.reports_dir)?;
        let title = escape_html(&self.title);

        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html>
  <head>
    <title>{title}</title>
    <meta charset="UTF-8">
    <style>{STYLE}    </style>
  </head>
  <body>
    <h1>{title}</h1>
    <div class="timestamp">Generado: {generated}</div>

    <div class="summary">
      <h3>Resumen</h3>
      <p>Pruebas ejecutadas: {total}</p>
      <p>Pruebas exitosas: <span style="color: green;">{passed}</span></p>
      <p>Pruebas fallidas: <span style="color: red;">{failed}</span></p>
      <p>Tiempo total de ejecución: {total_time:.2} segundos</p>
      <p class="timestamp">Inicio de la ejecución: {started}</p>
    </div>
"#,
            generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
            total = summary.total(),
            passed = summary.passed(),
            failed = summary.failed(),
            total_time = summary.total_time(),
            started = summary.started_at().format("%Y-%m-%d %H:%M:%S"),
        );

        for test in summary.tests() {
            self.render_card(&mut html, test, &report_dir)?;
        }

        html.push_str("  </body>\n</html>\n");
        Ok(html)
    }

    fn render_card(&self, html: &mut String, test: &TestOutcome, report_dir: &Path) -> E2eResult<()> {
        let name = escape_html(&test.name);
        let _ = write!(
            html,
            r#"
    <div class="test-case {class}">
      <h3>{name}</h3>
      <p><strong>Estado:</strong> {status}</p>
      <p><strong>Duración:</strong> {duration:.2} segundos</p>
      <p><strong>Descripción:</strong> {description}</p>
"#,
            class = status_class(test.status),
            status = test.status,
            duration = test.duration,
            description = escape_html(&test.description),
        );

        if !test.status.is_pass() {
            let _ = write!(
                html,
                r#"      <div class="error-message">Error: {}</div>
      <div class="stack-trace">{}</div>
"#,
                escape_html(&test.message),
                escape_html(&test.traceback),
            );
        }

        if !test.screenshots.is_empty() {
            html.push_str("      <h4>Capturas de pantalla:</h4>\n");
            for screenshot in test.screenshots.iter().filter(|p| p.exists()) {
                let target = absolutize(screenshot)?;
                let link = encode_link(&relative_path(&target, report_dir));
                let file_name = screenshot
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let _ = write!(
                    html,
                    r#"      <div class="screenshot-container">
        <img class="screenshot" src="{link}" alt="Captura de {name}">
        <div class="screenshot-name">{file}</div>
      </div>
"#,
                    file = escape_html(&file_name),
                );
            }
        }

        html.push_str("    </div>\n");
        Ok(())
    }

    /// Write `test_report_<YYYYMMDD_HHMMSS>.html` into the reports directory
    /// and return its absolute path. An existing report is never replaced; a
    /// name collision gets a numeric suffix.
    pub fn write(&self, summary: &RunSummary) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir)?;

        let now = Local::now();
        let html = self.render(summary, now)?;
        let stem = format!("test_report_{}", now.format("%Y%m%d_%H%M%S"));

        let mut attempt = 1;
        let path = loop {
            let file_name = if attempt == 1 {
                format!("{}.html", stem)
            } else {
                format!("{}_{}.html", stem, attempt)
            };
            let candidate = self.reports_dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(file) => {
                    fill_new(file, &candidate, html.as_bytes())?;
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < 100 => attempt += 1,
                Err(e) => {
                    return Err(E2eError::Report(format!(
                        "cannot create {}: {}",
                        candidate.display(),
                        e
                    )))
                }
            }
        };

        let path = std::fs::canonicalize(&path)?;
        info!("Report written to: {}", path.display());
        Ok(path)
    }
}

/// Write `bytes` into a file this run just created. On failure the partial
/// file is removed so no truncated report is left behind.
fn fill_new(mut out: impl Write, path: &Path, bytes: &[u8]) -> E2eResult<()> {
    if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
        drop(out);
        let _ = std::fs::remove_file(path);
        return Err(E2eError::Report(format!(
            "cannot write {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

/// Write the summary as `test-results.json` in `output_dir`
pub fn write_results_json(summary: &RunSummary, output_dir: &Path) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

fn status_class(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Pass => "passed",
        TestStatus::Fail => "failed",
        TestStatus::Error => "error",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Absolute, lexically normalized form of `path` (no filesystem access
/// beyond reading the working directory)
fn absolutize(path: &Path) -> E2eResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// `target` expressed relative to directory `base`. Both must be absolute.
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component);
    }
    rel
}

/// Percent-encode each segment of a relative path and join with `/`
fn encode_link(rel: &Path) -> String {
    rel.components()
        .map(|c| match c {
            Component::ParentDir => "..".to_string(),
            other => urlencoding::encode(&other.as_os_str().to_string_lossy()).into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
