//! Breaking Bad CRUD E2E Suite
//!
//! This crate drives a real browser through the Breaking Bad character
//! manager (login, create, edit, delete, PDF export, logout) and reports
//! what happened:
//! - Controls Chrome over the DevTools protocol (`chromiumoxide`)
//! - Runs the scenarios in a fixed order against one shared session
//! - Captures timestamped screenshots at named checkpoints
//! - Classifies each scenario as PASS, FAIL or ERROR
//! - Writes a self-contained HTML report and a JSON results file
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── wait_for_app(url) -> pre-flight probe                │
//! │    ├── ChromeSession::launch() -> impl BrowserSession       │
//! │    ├── execute(session, [Scenario]) -> RunSummary           │
//! │    └── write_artifacts(summary) -> report + results         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (CrudScenario::ALL)                               │
//! │    ├── test_1_login                                         │
//! │    ├── test_2_crear_personaje                               │
//! │    ├── test_3_editar_personaje                              │
//! │    ├── test_4_eliminar_personaje                            │
//! │    ├── test_5_generar_pdf                                   │
//! │    └── test_6_logout                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioContext                                            │
//! │    ├── navigate / find / type_into / click / clear          │
//! │    ├── wait_present / wait_clickable / wait_invisible       │
//! │    ├── checkpoint(label) -> screenshot                      │
//! │    └── ensure / assert_contains / assert_equal              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod chrome;
pub mod config;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod probe;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod scenarios;
pub mod screenshot;
pub mod wait;

pub use config::RunnerConfig;
pub use driver::{BrowserSession, Locator};
pub use error::{DriverError, E2eError, E2eResult, ScenarioError};
pub use outcome::{RunSummary, TestOutcome, TestStatus};
pub use runner::{RunArtifacts, TestRunner};
pub use scenario::{Scenario, ScenarioContext};
pub use scenarios::CrudScenario;
