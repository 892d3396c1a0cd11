//! Process-wide registration state
//!
//! Every `#[test_case]` impl block submits a [`SuiteEntry`]. [`register_all`]
//! registers all of them at once; a malformed test case is reported and skipped
//! without stopping the others.
//!
//! Test case names and full test names are reserved here, once per process, no
//! matter which [`Registrar`] handle registered them.

use super::{RegisteredTest, Registrar, RegistrationResult, TestRunner};
use crate::error::ClassyError;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::error;

static RESERVED_NAMES: OnceLock<Mutex<ReservedNames>> = OnceLock::new();

/// Names taken by registered test cases
#[derive(Debug, Default)]
pub(crate) struct ReservedNames {
    pub(crate) suites: HashSet<String>,
    pub(crate) tests: HashSet<String>,
}

/// Lock the process-wide name reservations
pub(crate) fn reserved_names() -> MutexGuard<'static, ReservedNames> {
    let names = RESERVED_NAMES.get_or_init(|| Mutex::new(ReservedNames::default()));
    match names.lock() {
        Ok(names) => names,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Inventory entry for a test case
pub struct SuiteEntry {
    /// Test case name
    pub name: &'static str,
    /// Registers the test case on a runner
    pub register: fn(&Registrar, &mut dyn TestRunner) -> RegistrationResult,
}

inventory::collect!(SuiteEntry);

/// All collected test case entries, ordered by name
pub fn entries() -> Vec<&'static SuiteEntry> {
    let mut entries: Vec<_> = inventory::iter::<SuiteEntry>.into_iter().collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}

/// Outcome of registering every collected test case
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Tests handed to the runner, in registration order
    pub registered: Vec<RegisteredTest>,
    /// Test cases that were rejected, with the reason
    pub failures: Vec<(String, ClassyError)>,
}

impl RegistrationReport {
    /// Whether every test case registered cleanly
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Full names of the registered tests
    pub fn test_names(&self) -> Vec<&str> {
        self.registered.iter().map(RegisteredTest::name).collect()
    }
}

/// Register every collected test case on `runner`
///
/// Test cases already registered in this process are reported as
/// [`ClassyError::DuplicateSuiteName`], so a second call rejects everything.
///
/// # Example
///
/// ```rust,ignore
/// let mut runner = LocalRunner::from_config(&ClassyConfig::from_env());
/// let report = classy_test::register_all(&Registrar::new(), &mut runner);
/// assert!(report.is_ok());
/// let summary = runner.run().await;
/// ```
pub fn register_all(registrar: &Registrar, runner: &mut dyn TestRunner) -> RegistrationReport {
    let mut report = RegistrationReport::default();

    for entry in entries() {
        match (entry.register)(registrar, runner) {
            Ok(tests) => report.registered.extend(tests),
            Err(e) => {
                error!(suite = entry.name, error = %e, "rejected test case");
                report.failures.push((entry.name.to_string(), e));
            }
        }
    }

    report
}
