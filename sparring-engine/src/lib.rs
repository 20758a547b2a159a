//! # sparring-engine
//!
//! Executes test cases against a live TCP server.
//!
//! ### Key Submodules:
//! - `runner`: one test case, N concurrent client timelines under a ceiling
//! - `manual`: interactive line sources for manual execution
//! - `driver`: sequences a whole suite and assembles the `SuiteReport`

pub mod driver;
mod error;
pub mod manual;
pub mod runner;

pub use driver::{CaseMode, CaseOutcome, ModePolicy, SuiteReport, TestSuiteDriver};
pub use error::SuiteError;
pub use manual::{LineSource, ScriptedLines, StdinLines};
pub use runner::{ScenarioRunner, Timeline};
