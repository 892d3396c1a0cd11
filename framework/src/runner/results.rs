//! Recorded results of local test runs

use crate::context::Context;
use crate::error::{Failure, FailureKind};
use crate::reporter::ResultReporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// One recorded reporter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A passed check
    Ok {
        /// Optional description
        message: String,
    },
    /// A failed check or explicit failure
    Fail {
        /// The failure
        failure: Failure,
    },
    /// A caught exception
    Exception {
        /// The failure carrying the panic message
        failure: Failure,
    },
}

/// In-memory [`ResultReporter`] used by [`LocalRunner`](super::LocalRunner)
#[derive(Debug, Default)]
pub struct TestResults {
    events: Mutex<Vec<Event>>,
}

impl TestResults {
    /// All events recorded so far
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The first failure or exception, which decides the test outcome
    pub fn first_failure(&self) -> Option<Failure> {
        self.events().into_iter().find_map(|event| match event {
            Event::Fail { failure } | Event::Exception { failure } => Some(failure),
            Event::Ok { .. } => None,
        })
    }

    pub(crate) fn push_timeout(&self, timeout: Duration) {
        self.fail(Failure::with_kind(
            FailureKind::Timeout,
            format!("test did not complete within {}ms", timeout.as_millis()),
        ));
    }

    fn push(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl ResultReporter for TestResults {
    fn ok(&self, message: &str) {
        self.push(Event::Ok {
            message: message.to_string(),
        });
    }

    fn fail(&self, failure: Failure) {
        self.push(Event::Fail { failure });
    }

    fn exception(&self, failure: Failure) {
        self.push(Event::Exception { failure });
    }

    fn has_failed(&self) -> bool {
        self.first_failure().is_some()
    }
}

/// Final status of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// No failure recorded
    Passed,
    /// At least one failure or exception recorded
    Failed,
    /// Abandoned after the runner's timeout
    TimedOut,
}

/// Outcome of one test in a run
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// Full test name
    pub name: String,
    /// Context the test was registered for
    pub context: Context,
    /// Final status
    pub status: TestStatus,
    /// The failure that decided the outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Every recorded reporter call
    pub events: Vec<Event>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl TestOutcome {
    /// Whether the test passed
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-test outcomes in execution order
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    /// Number of passed tests
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of failed or timed-out tests
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Whether every test passed
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::passed)
    }

    /// Look up the outcome of a test by full name
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Serialize the summary as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "started_at": self.started_at,
            "finished_at": self.finished_at,
            "passed": self.passed(),
            "failed": self.failed(),
            "tests": self.outcomes,
        })
    }
}
