//! In-process test runner
//!
//! [`LocalRunner`] implements the callback-style [`TestRunner`] contract: it
//! collects registrations and later runs them one at a time, in registration order,
//! each with a fresh [`TestResults`] reporter and a per-test timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use classy_test::{ClassyConfig, LocalRunner, Registrar};
//!
//! #[tokio::test]
//! async fn math_suite() {
//!     let mut runner = LocalRunner::from_config(&ClassyConfig::from_env());
//!     Registrar::new().register::<MathTests>(&mut runner).unwrap();
//!
//!     let summary = runner.run().await;
//!     assert!(summary.all_passed(), "{:#}", summary.to_json());
//! }
//! ```

mod results;

pub use results::{Event, RunSummary, TestOutcome, TestResults, TestStatus};

use crate::config::ClassyConfig;
use crate::context::Context;
use crate::registrar::{TestBody, TestRunner};
use crate::reporter::{Reporter, ResultReporter};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default per-test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

struct Registration {
    name: String,
    context: Context,
    body: TestBody,
}

/// Sequential in-process runner
pub struct LocalRunner {
    process: Context,
    timeout: Duration,
    strict: bool,
    tests: Vec<Registration>,
}

impl LocalRunner {
    /// Create a runner for a process running in `process` context
    pub fn new(process: Context) -> Self {
        Self {
            process,
            timeout: DEFAULT_TIMEOUT,
            strict: false,
            tests: Vec::new(),
        }
    }

    /// Create a runner from configuration
    pub fn from_config(config: &ClassyConfig) -> Self {
        Self::new(config.process)
            .timeout(config.test_timeout)
            .strict(config.strict)
    }

    /// Set the per-test timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable strict mode on the reporters handed to tests
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of registered tests
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no test was registered
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Names of registered tests in registration order
    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }

    /// Run every registered test, one at a time
    pub async fn run(&self) -> RunSummary {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.tests.len());

        for test in &self.tests {
            outcomes.push(self.run_registration(test).await);
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "test run finished"
        );
        summary
    }

    /// Run a single registered test by full name
    pub async fn run_test(&self, name: &str) -> Option<TestOutcome> {
        let test = self.tests.iter().find(|t| t.name == name)?;
        Some(self.run_registration(test).await)
    }

    async fn run_registration(&self, test: &Registration) -> TestOutcome {
        let results = Arc::new(TestResults::default());
        let reporter = Reporter::new(results.clone(), &test.name).strict(self.strict);
        let started = Instant::now();

        let finished = tokio::time::timeout(self.timeout, (test.body)(reporter)).await;

        let status = if finished.is_err() {
            warn!(test = %test.name, timeout_ms = self.timeout.as_millis() as u64, "test timed out");
            results.push_timeout(self.timeout);
            TestStatus::TimedOut
        } else if results.has_failed() {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };

        TestOutcome {
            name: test.name.clone(),
            context: test.context,
            status,
            failure: results.first_failure(),
            events: results.events(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

impl TestRunner for LocalRunner {
    fn process_context(&self) -> Context {
        self.process
    }

    fn register_test(&mut self, name: &str, context: Context, body: TestBody) {
        self.tests.push(Registration {
            name: name.to_string(),
            context,
            body,
        });
    }
}
