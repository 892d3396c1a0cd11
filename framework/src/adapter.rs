//! The execution adapter
//!
//! Runs one test of a test case against the runner's reporter:
//!
//! 1. build an instance from the test case factory
//! 2. `set_up`, if present
//! 3. the test itself, skipped when `set_up` failed
//! 4. `tear_down`, if present, whenever an instance exists
//!
//! Panics, `Err` returns and failed completion signals are converted into reports.
//! Nothing raised by the test case escapes [`invoke`].

use crate::completion::Outcome;
use crate::error::Failure;
use crate::registrar::TestBody;
use crate::reporter::Reporter;
use crate::suite::{Scope, Step, Suite};
use futures::FutureExt;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle phase of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building the instance
    Construct,
    /// The `set_up` hook
    SetUp,
    /// The test method
    Test,
    /// The `tear_down` hook
    TearDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => write!(f, "constructor"),
            Self::SetUp => write!(f, "set_up"),
            Self::Test => write!(f, "test"),
            Self::TearDown => write!(f, "tear_down"),
        }
    }
}

/// Run `method` of the test case against `reporter`
///
/// Every failure is reported on `reporter`; the returned future itself never
/// panics. An unknown method is reported as an exception.
pub async fn invoke<S: Send + 'static>(suite: &Suite<S>, method: &str, reporter: &Reporter) {
    let Some(test) = suite.test(method) else {
        reporter.exception(Failure::new(format!(
            "test case '{}' has no test named '{}'",
            suite.name(),
            method
        )));
        return;
    };

    match suite.scope() {
        Scope::Test => {
            let Some(mut instance) = construct(suite, reporter) else {
                return;
            };
            run_lifecycle(suite, &test.step, &mut instance, reporter).await;
            debug!(test = reporter.test_name(), "discarding test case instance");
        }
        Scope::Suite => {
            let mut shared = suite.shared.lock().await;
            if shared.is_none() {
                *shared = construct(suite, reporter);
            }
            if let Some(instance) = shared.as_mut() {
                run_lifecycle(suite, &test.step, instance, reporter).await;
            }
        }
    }
}

/// Build the runner-facing body for one test
pub(crate) fn test_body<S: Send + 'static>(suite: Arc<Suite<S>>, method: String) -> TestBody {
    Arc::new(move |reporter: Reporter| {
        let suite = Arc::clone(&suite);
        let method = method.clone();
        async move { invoke(&suite, &method, &reporter).await }.boxed()
    })
}

fn construct<S>(suite: &Suite<S>, reporter: &Reporter) -> Option<S> {
    debug!(test = reporter.test_name(), "constructing test case instance");
    match catch_unwind(AssertUnwindSafe(|| (suite.factory)())) {
        Ok(Ok(instance)) => Some(instance),
        Ok(Err(failure)) => {
            reporter.report(failure.in_phase(Phase::Construct));
            None
        }
        Err(payload) => {
            reporter.exception(Failure::panic(&*payload).in_phase(Phase::Construct));
            None
        }
    }
}

async fn run_lifecycle<S>(suite: &Suite<S>, test: &Step<S>, instance: &mut S, reporter: &Reporter) {
    let ready = match &suite.set_up {
        Some(set_up) => run_phase(Phase::SetUp, set_up, instance, reporter).await,
        None => true,
    };

    if ready {
        run_phase(Phase::Test, test, instance, reporter).await;
    } else {
        debug!(test = reporter.test_name(), "set_up failed; skipping test");
    }

    if let Some(tear_down) = &suite.tear_down {
        run_phase(Phase::TearDown, tear_down, instance, reporter).await;
    }
}

/// Run one hook or test, reporting its failure. Returns whether it succeeded.
async fn run_phase<S>(phase: Phase, step: &Step<S>, instance: &mut S, reporter: &Reporter) -> bool {
    debug!(test = reporter.test_name(), %phase, "running phase");

    let result: Result<Outcome, _> = AssertUnwindSafe(async { step(instance, reporter).await.resolve().await })
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => true,
        Ok(Err(failure)) => {
            reporter.report(failure.in_phase(phase));
            false
        }
        Err(payload) => {
            reporter.exception(Failure::panic(&*payload).in_phase(phase));
            false
        }
    }
}
