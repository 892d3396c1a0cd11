//! The result-reporting contract
//!
//! [`ResultReporter`] is the object a test runner hands to each invocation. It is
//! owned by the runner; the adapter and the test only record into it.
//!
//! [`Reporter`] is the handle test case methods receive. It forwards to the
//! runner's reporter and adds assertion helpers and completion signals.
//!
//! Assertion helpers record a failure and return `false` instead of panicking, so a
//! test can keep checking after the first mismatch.

use crate::completion::{labelled_channel, Pending, Signal};
use crate::error::{panic_message, Failure};
use regex::Regex;
use std::fmt::{self, Debug};
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;

/// Per-invocation result sink provided by the test runner
pub trait ResultReporter: Send + Sync {
    /// Record a passed check
    fn ok(&self, message: &str);

    /// Record a failed check or explicit failure
    fn fail(&self, failure: Failure);

    /// Record an unexpected exception (panic) or broken invariant
    fn exception(&self, failure: Failure);

    /// Whether any failure or exception was recorded so far
    fn has_failed(&self) -> bool;
}

/// Handle passed to every hook and test of one invocation
///
/// # Example
///
/// ```rust,ignore
/// fn add(&mut self, test: &Reporter) {
///     test.equal(1 + 1, 2);
///     test.matches("Math - add", r"^Math - ");
/// }
/// ```
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ResultReporter>,
    test_name: Arc<str>,
    strict: bool,
}

impl Reporter {
    /// Wrap a runner-provided result sink for the named test
    pub fn new(sink: Arc<dyn ResultReporter>, test_name: impl AsRef<str>) -> Self {
        Self {
            sink,
            test_name: Arc::from(test_name.as_ref()),
            strict: false,
        }
    }

    /// Enable strict mode (repeated completion signals are logged as warnings)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Full name of the running test
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Create a completion channel for an asynchronous test
    ///
    /// Return the [`Pending`] half from the test method and fire the [`Signal`]
    /// once the awaited work finished.
    pub fn pending(&self) -> (Signal, Pending) {
        labelled_channel(&self.test_name, self.strict)
    }

    /// Whether any failure was recorded for this invocation
    pub fn has_failed(&self) -> bool {
        self.sink.has_failed()
    }

    // =========================================================================
    // Raw reporting
    // =========================================================================

    /// Record a passed check
    pub fn ok(&self, message: &str) {
        self.sink.ok(message);
    }

    /// Record an explicit failure
    pub fn fail(&self, message: impl Into<String>) {
        self.sink.fail(Failure::new(message));
    }

    /// Record a failure value
    pub fn report(&self, failure: Failure) {
        self.sink.fail(failure);
    }

    /// Record an exception
    pub fn exception(&self, failure: Failure) {
        self.sink.exception(failure);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Assert that `actual` equals `expected`
    #[track_caller]
    pub fn equal<T: PartialEq + Debug>(&self, actual: T, expected: T) -> bool {
        let location = Location::caller();
        self.check(actual == expected, || {
            format!(
                "equal(actual, expected) at {}\n  Expected: {:?}\n  Received: {:?}",
                location, expected, actual
            )
        })
    }

    /// Assert that `actual` differs from `unexpected`
    #[track_caller]
    pub fn not_equal<T: PartialEq + Debug>(&self, actual: T, unexpected: T) -> bool {
        let location = Location::caller();
        self.check(actual != unexpected, || {
            format!(
                "not_equal(actual, unexpected) at {}\n  Expected NOT: {:?}\n  Received: {:?}",
                location, unexpected, actual
            )
        })
    }

    /// Assert that `value` is true
    #[track_caller]
    pub fn is_true(&self, value: bool) -> bool {
        let location = Location::caller();
        self.check(value, || format!("is_true(value) at {}\n  Received: false", location))
    }

    /// Assert that `value` is false
    #[track_caller]
    pub fn is_false(&self, value: bool) -> bool {
        let location = Location::caller();
        self.check(!value, || format!("is_false(value) at {}\n  Received: true", location))
    }

    /// Assert that `actual` matches the regular expression `pattern`
    ///
    /// An invalid pattern is reported as a failure.
    #[track_caller]
    pub fn matches(&self, actual: &str, pattern: &str) -> bool {
        let location = Location::caller();
        match Regex::new(pattern) {
            Ok(regex) => self.check(regex.is_match(actual), || {
                format!(
                    "matches(actual, pattern) at {}\n  Pattern: {}\n  Received: {:?}",
                    location, pattern, actual
                )
            }),
            Err(e) => {
                self.sink.fail(Failure::assertion(format!(
                    "matches(actual, pattern) at {}\n  Invalid pattern {:?}: {}",
                    location, pattern, e
                )));
                false
            }
        }
    }

    /// Assert that `f` panics
    #[track_caller]
    pub fn panics<F: FnOnce()>(&self, f: F) -> bool {
        let location = Location::caller();
        match catch_unwind(AssertUnwindSafe(f)) {
            Err(payload) => {
                self.sink
                    .ok(&format!("panicked as expected: {}", panic_message(&*payload)));
                true
            }
            Ok(()) => {
                self.sink.fail(Failure::assertion(format!(
                    "panics(f) at {}\n  Expected a panic, but the closure returned",
                    location
                )));
                false
            }
        }
    }

    fn check(&self, passed: bool, describe: impl FnOnce() -> String) -> bool {
        if passed {
            self.sink.ok("");
        } else {
            self.sink.fail(Failure::assertion(describe()));
        }
        passed
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("test_name", &self.test_name)
            .field("strict", &self.strict)
            .finish()
    }
}
