//! ## sparring-engine::driver
//! **Runs a whole suite, one case at a time**
//!
//! Cases come from a `ScenarioSource` in order. A case that failed to load is
//! logged and skipped; every other case is executed to completion (all of
//! its clients joined) before the next one starts.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{info, instrument, warn};

use sparring_config::{ConfigError, ScenarioSource, TestCase};
use sparring_core::CaseResult;
use sparring_telemetry::EventLogger;

use crate::error::SuiteError;
use crate::manual::LineSource;
use crate::runner::ScenarioRunner;

const ASK_PROMPT: &str =
    "Press Enter to execute test case automatically or 'm' to execute it manually: ";

/// How the driver picks the mode of each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModePolicy {
    #[default]
    Automatic,
    Manual,
    /// Ask the operator before every case.
    Ask,
}

impl FromStr for ModePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "automatic" => Ok(ModePolicy::Automatic),
            "manual" => Ok(ModePolicy::Manual),
            "ask" => Ok(ModePolicy::Ask),
            other => Err(format!(
                "unknown mode '{other}', expected auto, manual or ask"
            )),
        }
    }
}

/// Mode a case actually ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Automatic,
    Manual,
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMode::Automatic => f.write_str("automatic"),
            CaseMode::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug)]
pub enum CaseOutcome {
    Completed { mode: CaseMode, result: CaseResult },
    Skipped {
        index: usize,
        name: String,
        error: String,
    },
}

impl CaseOutcome {
    pub fn name(&self) -> &str {
        match self {
            CaseOutcome::Completed { result, .. } => &result.name,
            CaseOutcome::Skipped { name, .. } => name,
        }
    }

    pub fn result(&self) -> Option<&CaseResult> {
        match self {
            CaseOutcome::Completed { result, .. } => Some(result),
            CaseOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn completed(&self) -> impl Iterator<Item = &CaseResult> {
        self.outcomes.iter().filter_map(CaseOutcome::result)
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CaseOutcome::Skipped { .. }))
            .count()
    }

    /// No case was skipped and no completed case recorded an error.
    pub fn passed(&self) -> bool {
        self.skipped() == 0 && self.completed().all(CaseResult::passed)
    }
}

pub struct TestSuiteDriver {
    runner: ScenarioRunner,
    policy: ModePolicy,
    input: Box<dyn LineSource>,
}

impl TestSuiteDriver {
    pub fn new(runner: ScenarioRunner, policy: ModePolicy, input: Box<dyn LineSource>) -> Self {
        Self {
            runner,
            policy,
            input,
        }
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    /// Executes every case of `source` in order.
    ///
    /// Only a document-level load failure or broken operator input aborts the
    /// suite; everything else ends up in the returned report.
    #[instrument(skip_all, fields(addr = %self.runner.target(), policy = ?self.policy))]
    pub async fn run<S>(&mut self, source: &S) -> Result<SuiteReport, SuiteError>
    where
        S: ScenarioSource + ?Sized,
    {
        let started = Instant::now();
        let entries = source.load_scenarios()?;
        info!(cases = entries.len(), "Test suite loaded");

        let mut outcomes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let outcome = match entry {
                Ok(case) => self.run_case(&case).await?,
                Err(error) => self.skip(index, error),
            };
            outcomes.push(outcome);
        }

        let report = SuiteReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        EventLogger::log_event(
            "suite_complete",
            vec![
                KeyValue::new("cases", report.outcomes.len() as i64),
                KeyValue::new("skipped", report.skipped() as i64),
                KeyValue::new("passed", report.passed()),
            ],
        )
        .await;
        Ok(report)
    }

    async fn run_case(&mut self, case: &TestCase) -> Result<CaseOutcome, SuiteError> {
        self.runner.log(&format!("Executing test case: {}", case.name));
        let mode = self.choose_mode().await?;
        info!(case = %case.name, %mode, "Running test case");

        let result = match mode {
            CaseMode::Automatic => self.runner.run(case).await,
            CaseMode::Manual => self.runner.run_manual(case, &mut *self.input).await,
        };
        Ok(CaseOutcome::Completed { mode, result })
    }

    async fn choose_mode(&mut self) -> Result<CaseMode, SuiteError> {
        match self.policy {
            ModePolicy::Automatic => Ok(CaseMode::Automatic),
            ModePolicy::Manual => Ok(CaseMode::Manual),
            ModePolicy::Ask => {
                let answer = self.input.read_line(ASK_PROMPT).await?;
                let manual = answer
                    .as_deref()
                    .is_some_and(|a| a.trim().eq_ignore_ascii_case("m"));
                Ok(if manual {
                    CaseMode::Manual
                } else {
                    CaseMode::Automatic
                })
            }
        }
    }

    fn skip(&self, index: usize, error: ConfigError) -> CaseOutcome {
        let name = match &error {
            ConfigError::InvalidCase { name, .. } => name.clone(),
            _ => String::new(),
        };
        warn!(index, case = %name, "Skipping test case: {error}");
        self.runner.log(&format!("Skipping test case #{index}: {error}"));
        CaseOutcome::Skipped {
            index,
            name,
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use sparring_client::ConnectionOptions;
    use sparring_telemetry::{MemorySink, MetricsRecorder};
    use tracing_test::traced_test;

    use crate::manual::ScriptedLines;

    /// Answers every prompt with Enter and keeps the last log line shown
    /// before each prompt.
    struct Operator {
        sink: Arc<MemorySink>,
        seen: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl LineSource for Operator {
        async fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            self.seen.lock().push(self.sink.lines().last().cloned());
            Ok(Some(String::new()))
        }
    }

    #[test]
    fn mode_policy_parses_cli_spellings() {
        assert_eq!("auto".parse(), Ok(ModePolicy::Automatic));
        assert_eq!("MANUAL".parse(), Ok(ModePolicy::Manual));
        assert_eq!("ask".parse(), Ok(ModePolicy::Ask));
        assert!("sometimes".parse::<ModePolicy>().is_err());
    }

    #[test]
    fn skipped_cases_fail_the_suite() {
        let report = SuiteReport {
            outcomes: vec![CaseOutcome::Skipped {
                index: 0,
                name: "broken".into(),
                error: "bad".into(),
            }],
            elapsed: Duration::ZERO,
        };
        assert!(!report.passed());
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcomes[0].name(), "broken");
        assert_eq!(report.completed().count(), 0);
    }

    #[test]
    fn empty_suite_passes() {
        assert!(SuiteReport::default().passed());
    }

    #[traced_test]
    #[tokio::test]
    async fn empty_source_completes_without_cases() {
        let sink = Arc::new(MemorySink::new());
        let runner = ScenarioRunner::new(
            "127.0.0.1:9",
            ConnectionOptions::default(),
            sink.clone(),
            MetricsRecorder::new(),
        );
        let mut driver = TestSuiteDriver::new(
            runner,
            ModePolicy::Ask,
            Box::new(ScriptedLines::default()),
        );
        let report = driver.run(&Vec::<TestCase>::new()).await.unwrap();

        assert!(report.outcomes.is_empty());
        assert!(sink.lines().is_empty());
        assert!(logs_contain("Test suite loaded"));
    }

    #[tokio::test]
    async fn case_name_is_logged_before_the_mode_prompt() {
        let sink = Arc::new(MemorySink::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runner = ScenarioRunner::new(
            "127.0.0.1:9",
            ConnectionOptions::default(),
            sink.clone(),
            MetricsRecorder::new(),
        );
        let operator = Operator {
            sink: sink.clone(),
            seen: seen.clone(),
        };
        let mut driver = TestSuiteDriver::new(runner, ModePolicy::Ask, Box::new(operator));

        let report = driver
            .run(&vec![TestCase::new("quick", 0.1)])
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            *seen.lock(),
            vec![Some("Executing test case: quick".to_owned())]
        );
    }
}
