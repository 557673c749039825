//! In-memory stand-in for the Breaking Bad web app, driven through the same
//! `BrowserSession` capability as Chrome.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use breakingbad_e2e::config::Timeouts;
use breakingbad_e2e::driver::{BrowserSession, Locator};
use breakingbad_e2e::error::{DriverError, DriverResult};
use breakingbad_e2e::scenarios::locators;
use breakingbad_e2e::RunnerConfig;

pub const BASE_URL: &str = "http://app.test/BreakingBadweb";

const FORM_FIELDS: [&str; 5] = ["nombre", "color", "tipo", "nivel", "foto"];

/// Config pointing every output directory into `root`, with short waits
pub fn test_config(root: &Path) -> RunnerConfig {
    RunnerConfig {
        base_url: BASE_URL.to_string(),
        screenshots_dir: root.join("screenshots"),
        downloads_dir: root.join("downloads"),
        reports_dir: root.join("reports"),
        output_dir: root.join("test-results"),
        timeouts: Timeouts {
            wait_secs: 0.3,
            dialog_secs: 0.2,
            poll_interval_ms: 20,
            probe_secs: 0.2,
        },
        preflight: false,
        ..RunnerConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Login,
    Index,
    Add,
    Edit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeElement {
    Input(String),
    Submit,
    AddLink,
    Heading,
    Cell(usize),
    Row(usize),
    RowAction(usize, Action),
    LogoutLink,
}

#[derive(Debug)]
struct State {
    page: Page,
    url: String,
    logged_in: bool,
    fields: HashMap<String, String>,
    rows: Vec<Row>,
    pending_delete: Option<usize>,
    closed: bool,
    pdf_downloads: usize,
    dialogs_accepted: usize,
    screenshots_taken: usize,
}

#[derive(Debug, Default)]
struct Faults {
    hidden: HashSet<String>,
    fail_screenshots: bool,
    confirm_on_delete: bool,
    landing_path: Option<String>,
}

/// Clones share one application, so a test can keep a handle on a session
/// it handed to the runner.
#[derive(Clone)]
pub struct FakeApp {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl FakeApp {
    /// Application with two existing characters
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                page: Page::Blank,
                url: "about:blank".to_string(),
                logged_in: false,
                fields: HashMap::new(),
                rows: vec![
                    Row {
                        name: "Jesse Pinkman".to_string(),
                        level: "7".to_string(),
                    },
                    Row {
                        name: "Saul Goodman".to_string(),
                        level: "6".to_string(),
                    },
                ],
                pending_delete: None,
                closed: false,
                pdf_downloads: 0,
                dialogs_accepted: 0,
                screenshots_taken: 0,
            })),
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    /// Make a locator match nothing
    pub fn hide(&self, locator: &Locator) {
        self.faults.lock().unwrap().hidden.insert(locator.to_string());
    }

    pub fn fail_screenshots(&self) {
        self.faults.lock().unwrap().fail_screenshots = true;
    }

    /// Ask for a JavaScript confirmation before deleting
    pub fn confirm_on_delete(&self) {
        self.faults.lock().unwrap().confirm_on_delete = true;
    }

    /// Send the browser somewhere other than `index.php` after login
    pub fn land_on(&self, path: &str) {
        self.faults.lock().unwrap().landing_path = Some(path.to_string());
    }

    pub fn rows(&self) -> Vec<Row> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn logged_in(&self) -> bool {
        self.state.lock().unwrap().logged_in
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn pdf_downloads(&self) -> usize {
        self.state.lock().unwrap().pdf_downloads
    }

    pub fn dialogs_accepted(&self) -> usize {
        self.state.lock().unwrap().dialogs_accepted
    }

    pub fn screenshots_taken(&self) -> usize {
        self.state.lock().unwrap().screenshots_taken
    }

    fn open(&self) -> DriverResult<std::sync::MutexGuard<'_, State>> {
        let state = self.state.lock().unwrap();
        if state.closed {
            return Err(DriverError::Other("session closed".to_string()));
        }
        Ok(state)
    }

    fn resolve(&self, state: &State, locator: &Locator) -> Vec<FakeElement> {
        if self.faults.lock().unwrap().hidden.contains(&locator.to_string()) {
            return Vec::new();
        }

        let mut found = Vec::new();
        let heading = page_heading(state.page);

        if let (Some(text), Some(heading)) = (contains_text(locator, "h2"), heading) {
            if heading.contains(&text) {
                found.push(FakeElement::Heading);
            }
            return found;
        }

        match state.page {
            Page::Blank => {}
            Page::Login => {
                if *locator == locators::username() || *locator == locators::password() {
                    if let Locator::Name(name) = locator {
                        found.push(FakeElement::Input(name.clone()));
                    }
                } else if *locator == locators::submit() {
                    found.push(FakeElement::Submit);
                }
            }
            Page::Index => {
                if *locator == locators::add_link() {
                    found.push(FakeElement::AddLink);
                } else if *locator == locators::rows() {
                    found.extend((0..state.rows.len()).map(FakeElement::Row));
                } else if *locator == locators::logout_link() {
                    found.push(FakeElement::LogoutLink);
                } else if let Some(text) = contains_text(locator, "td") {
                    found.extend(
                        state
                            .rows
                            .iter()
                            .enumerate()
                            .filter(|(_, row)| row.name.contains(&text))
                            .map(|(i, _)| FakeElement::Cell(i)),
                    );
                } else if !state.rows.is_empty() {
                    for (class, action) in [
                        (locators::EDIT_BUTTON_CLASS, Action::Edit),
                        (locators::DELETE_BUTTON_CLASS, Action::Delete),
                        (locators::PDF_BUTTON_CLASS, Action::Pdf),
                    ] {
                        if *locator == locators::first_row_action(class) {
                            found.push(FakeElement::RowAction(0, action));
                        }
                    }
                }
            }
            Page::Add | Page::Edit(_) => {
                if *locator == locators::submit() {
                    found.push(FakeElement::Submit);
                } else if let Locator::Name(name) = locator {
                    if FORM_FIELDS.contains(&name.as_str()) {
                        found.push(FakeElement::Input(name.clone()));
                    }
                }
            }
        }
        found
    }

    fn go(&self, state: &mut State, page: Page, path: &str) {
        state.page = page;
        state.url = format!("{}{}", BASE_URL, path);
        state.fields.clear();
    }

    fn delete_row(state: &mut State, index: usize) {
        if index < state.rows.len() {
            state.rows.remove(index);
        }
    }
}

fn page_heading(page: Page) -> Option<&'static str> {
    match page {
        Page::Blank => None,
        Page::Login => Some("Iniciar sesión"),
        Page::Index => Some("Personajes"),
        Page::Add => Some("Agregar Personaje"),
        Page::Edit(_) => Some("Editar Personaje"),
    }
}

/// Text `X` out of `//<tag>[contains(text(),'X')]`
fn contains_text(locator: &Locator, tag: &str) -> Option<String> {
    let Locator::XPath(xpath) = locator else {
        return None;
    };
    let prefix = format!("//{}[contains(text(),", tag);
    let literal = xpath.strip_prefix(&prefix)?.strip_suffix(")]")?;
    Some(literal.trim_matches('\'').to_string())
}

#[async_trait]
impl BrowserSession for FakeApp {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.open()?;
        let path = url
            .strip_prefix(BASE_URL)
            .ok_or_else(|| DriverError::Other(format!("unknown host in {}", url)))?
            .to_string();

        match path.as_str() {
            "/login.php" => self.go(&mut state, Page::Login, "/login.php"),
            "/index.php" if state.logged_in => self.go(&mut state, Page::Index, "/index.php"),
            "/index.php" => self.go(&mut state, Page::Login, "/login.php"),
            other => self.go(&mut state, Page::Blank, other),
        }
        Ok(())
    }

    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<FakeElement>> {
        let state = self.open()?;
        Ok(self.resolve(&state, locator))
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> DriverResult<()> {
        let mut state = self.open()?;
        match element {
            FakeElement::Input(name) => {
                state.fields.entry(name.clone()).or_default().push_str(text);
                Ok(())
            }
            other => Err(DriverError::Other(format!("cannot type into {:?}", other))),
        }
    }

    async fn clear(&self, element: &FakeElement) -> DriverResult<()> {
        let mut state = self.open()?;
        match element {
            FakeElement::Input(name) => {
                state.fields.insert(name.clone(), String::new());
                Ok(())
            }
            other => Err(DriverError::Other(format!("cannot clear {:?}", other))),
        }
    }

    async fn click(&self, element: &FakeElement) -> DriverResult<()> {
        let mut state = self.open()?;
        let page = state.page;

        match (page, element) {
            (Page::Login, FakeElement::Submit) => {
                let ok = state.fields.get("username").map(String::as_str) == Some("test")
                    && state.fields.get("password").map(String::as_str) == Some("password");
                if ok {
                    state.logged_in = true;
                    let landing = self
                        .faults
                        .lock()
                        .unwrap()
                        .landing_path
                        .clone()
                        .unwrap_or_else(|| "/index.php".to_string());
                    self.go(&mut state, Page::Index, &landing);
                } else {
                    state.fields.clear();
                }
            }
            (Page::Index, FakeElement::AddLink) => self.go(&mut state, Page::Add, "/agregar.php"),
            (Page::Add, FakeElement::Submit) => {
                let row = Row {
                    name: state.fields.get("nombre").cloned().unwrap_or_default(),
                    level: state.fields.get("nivel").cloned().unwrap_or_default(),
                };
                state.rows.push(row);
                self.go(&mut state, Page::Index, "/index.php");
            }
            (Page::Index, FakeElement::RowAction(i, Action::Edit)) => {
                let row = state.rows[*i].clone();
                self.go(&mut state, Page::Edit(*i), &format!("/editar.php?id={}", i + 1));
                state.fields.insert("nombre".into(), row.name);
                state.fields.insert("nivel".into(), row.level);
            }
            (Page::Edit(i), FakeElement::Submit) => {
                let name = state.fields.get("nombre").cloned().unwrap_or_default();
                let level = state.fields.get("nivel").cloned().unwrap_or_default();
                state.rows[i] = Row { name, level };
                self.go(&mut state, Page::Index, "/index.php");
            }
            (Page::Index, FakeElement::RowAction(i, Action::Delete)) => {
                if self.faults.lock().unwrap().confirm_on_delete {
                    state.pending_delete = Some(*i);
                } else {
                    Self::delete_row(&mut state, *i);
                }
            }
            (Page::Index, FakeElement::RowAction(_, Action::Pdf)) => state.pdf_downloads += 1,
            (Page::Index, FakeElement::LogoutLink) => {
                state.logged_in = false;
                self.go(&mut state, Page::Login, "/login.php");
            }
            (_, other) => {
                return Err(DriverError::Other(format!(
                    "{:?} is not clickable on {:?}",
                    other, page
                )))
            }
        }
        Ok(())
    }

    async fn is_displayed(&self, _element: &FakeElement) -> DriverResult<bool> {
        self.open().map(|_| true)
    }

    async fn is_enabled(&self, _element: &FakeElement) -> DriverResult<bool> {
        self.open().map(|_| true)
    }

    async fn accept_dialog(&self) -> DriverResult<()> {
        let mut state = self.open()?;
        match state.pending_delete.take() {
            Some(index) => {
                Self::delete_row(&mut state, index);
                state.dialogs_accepted += 1;
                Ok(())
            }
            None => Err(DriverError::NoDialog),
        }
    }

    async fn screenshot(&self, path: &Path) -> DriverResult<()> {
        let mut state = self.open()?;
        if self.faults.lock().unwrap().fail_screenshots {
            return Err(DriverError::Other("capture failed".to_string()));
        }

        let shade = (state.screenshots_taken * 40 % 256) as u8;
        image::RgbImage::from_pixel(8, 6, image::Rgb([shade, 120, 200]))
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| DriverError::Other(e.to_string()))?;
        state.screenshots_taken += 1;
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.open()?.url.clone())
    }

    async fn quit(&self) -> DriverResult<()> {
        self.open()?.closed = true;
        Ok(())
    }
}

/// All `src="..."` values in an HTML document
pub fn image_sources(html: &str) -> Vec<String> {
    html.match_indices("<img ")
        .filter_map(|(start, _)| {
            let rest = &html[start..];
            let src = rest.find("src=\"")? + 5;
            let end = rest[src..].find('"')?;
            Some(rest[src..src + end].to_string())
        })
        .collect()
}

/// Resolve a report-relative link back to a file path
pub fn resolve_link(report_dir: &Path, link: &str) -> PathBuf {
    let decoded = urlencoding::decode(link).unwrap();
    report_dir.join(decoded.as_ref())
}

pub fn short_wait() -> Duration {
    Duration::from_millis(200)
}
