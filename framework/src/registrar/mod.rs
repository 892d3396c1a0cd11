//! The test case registrar
//!
//! Turns a test case descriptor into one registration call per test on the
//! underlying [`TestRunner`]. All validation happens before the first call, so a
//! rejected test case registers nothing. Names are reserved process-wide.
//!
//! # Example
//!
//! ```rust,ignore
//! use classy_test::{Context, LocalRunner, Registrar};
//!
//! let mut runner = LocalRunner::new(Context::Server);
//! let registrar = Registrar::new();
//!
//! let tests = registrar.register::<MathTests>(&mut runner)?;
//! assert_eq!(tests[0].name(), "Math - add");
//! ```

pub mod registry;

pub use registry::{register_all, RegistrationReport, SuiteEntry};

use registry::{reserved_names, ReservedNames};

use crate::adapter;
use crate::context::{select_context, select_test_context, Context};
use crate::error::ClassyError;
use crate::reporter::Reporter;
use crate::suite::{Suite, TestCase};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Separator between the test case name and the method name
pub const NAME_SEPARATOR: &str = " - ";

/// Body handed to the test runner; invoked once per run with that run's reporter
pub type TestBody = Arc<dyn Fn(Reporter) -> BoxFuture<'static, ()> + Send + Sync>;

/// Result of registering one test case
pub type RegistrationResult = Result<Vec<RegisteredTest>, ClassyError>;

/// The underlying callback-style test runner
///
/// Implementations receive one call per test and invoke the body later with a
/// fresh reporter. The body completes once the test is finished.
pub trait TestRunner {
    /// The context this process executes tests in
    fn process_context(&self) -> Context;

    /// Register a test under `name`
    fn register_test(&mut self, name: &str, context: Context, body: TestBody);
}

/// Generate the full name of a test
pub fn full_test_name(suite: &str, method: &str) -> String {
    format!("{}{}{}", suite, NAME_SEPARATOR, method)
}

/// A test handed to the runner
#[derive(Clone)]
pub struct RegisteredTest {
    name: String,
    suite: String,
    method: String,
    context: Context,
    body: TestBody,
}

impl RegisteredTest {
    /// Full `"<suite> - <method>"` name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the test case
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Name of the test method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Effective execution context
    pub fn context(&self) -> Context {
        self.context
    }

    /// The runner-facing body
    pub fn body(&self) -> &TestBody {
        &self.body
    }

    /// Invoke the test against `reporter`
    pub async fn run(&self, reporter: Reporter) {
        (self.body)(reporter).await
    }
}

impl fmt::Debug for RegisteredTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTest")
            .field("name", &self.name)
            .field("context", &self.context)
            .finish()
    }
}

/// Registers test cases and guards name uniqueness
///
/// A `Registrar` is a handle onto the process-wide name reservations: test case
/// names and full test names are unique across every registrar in the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registrar {
    _private: (),
}

impl Registrar {
    /// Create a registrar handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test case type
    pub fn register<T: TestCase>(&self, runner: &mut dyn TestRunner) -> RegistrationResult {
        self.register_suite(T::suite(), runner)
    }

    /// Register a test case descriptor
    pub fn register_suite<S: Send + 'static>(
        &self,
        suite: Suite<S>,
        runner: &mut dyn TestRunner,
    ) -> RegistrationResult {
        let planned = {
            let mut reserved = reserved_names();
            let planned = plan(&reserved, &suite)?;
            reserved.suites.insert(suite.name().to_string());
            reserved
                .tests
                .extend(planned.iter().map(|(full_name, _, _)| full_name.clone()));
            planned
        };

        let process = runner.process_context();
        let suite_name = suite.name().to_string();
        let suite = Arc::new(suite);
        let mut registered = Vec::new();

        for (full_name, method, context) in planned {
            if !context.admits(process) {
                debug!(test = %full_name, %context, %process, "skipping test for this process");
                continue;
            }

            let body = adapter::test_body(Arc::clone(&suite), method.clone());
            runner.register_test(&full_name, context, Arc::clone(&body));
            debug!(test = %full_name, %context, "registered test");

            registered.push(RegisteredTest {
                name: full_name,
                suite: suite_name.clone(),
                method,
                context,
                body,
            });
        }

        info!(
            suite = %suite_name,
            context = %select_context(&suite),
            registered = registered.len(),
            "registered test case"
        );
        Ok(registered)
    }

    /// Whether a test case name is taken in this process
    pub fn is_registered(&self, suite: &str) -> bool {
        reserved_names().suites.contains(suite)
    }
}

/// Validate a test case and compute `(full name, method, context)` per test
fn plan<S>(
    reserved: &ReservedNames,
    suite: &Suite<S>,
) -> Result<Vec<(String, String, Context)>, ClassyError> {
    let name = suite.name();
    if name.trim().is_empty() {
        return Err(ClassyError::MissingName);
    }
    if reserved.suites.contains(name) {
        return Err(ClassyError::duplicate_suite(name));
    }
    if let Some(method) = suite.duplicates.first() {
        return Err(ClassyError::duplicate_test(full_test_name(name, method)));
    }
    if suite.is_empty() {
        return Err(ClassyError::empty_suite(name));
    }

    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(suite.len());
    for method in suite.test_names() {
        let full_name = full_test_name(name, method);
        if reserved.tests.contains(&full_name) || !seen.insert(full_name.clone()) {
            return Err(ClassyError::duplicate_test(full_name));
        }
        let context = select_test_context(suite, method)?;
        planned.push((full_name, method.to_string(), context));
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::LocalRunner;
    use pretty_assertions::assert_eq;

    fn arithmetic(name: &str) -> Suite<()> {
        Suite::builder(name, || ())
            .test("add", |_, test: &Reporter| {
                test.equal(1 + 1, 2);
            })
            .test("subtract", |_, test: &Reporter| {
                test.equal(2 - 1, 1);
            })
            .build()
    }

    fn names(tests: &[RegisteredTest]) -> Vec<&str> {
        tests.iter().map(RegisteredTest::name).collect()
    }

    #[test]
    fn test_full_test_name() {
        assert_eq!(full_test_name("Math", "add"), "Math - add");
    }

    #[test]
    fn test_one_registration_per_test() {
        let mut runner = LocalRunner::new(Context::Both);
        let registrar = Registrar::new();

        let tests = registrar
            .register_suite(arithmetic("Arithmetic"), &mut runner)
            .unwrap();

        assert_eq!(names(&tests), vec!["Arithmetic - add", "Arithmetic - subtract"]);
        assert_eq!(
            runner.test_names(),
            vec!["Arithmetic - add", "Arithmetic - subtract"]
        );
        assert!(tests.iter().all(|t| t.context() == Context::Both));
        assert!(registrar.is_registered("Arithmetic"));
    }

    #[test]
    fn test_duplicate_suite_name_is_rejected() {
        let mut runner = LocalRunner::new(Context::Both);
        let registrar = Registrar::new();

        registrar
            .register_suite(arithmetic("Repeated"), &mut runner)
            .unwrap();
        let err = registrar
            .register_suite(arithmetic("Repeated"), &mut runner)
            .unwrap_err();

        assert_eq!(err, ClassyError::duplicate_suite("Repeated"));
        assert_eq!(runner.len(), 2);
    }

    #[test]
    fn test_suite_names_are_unique_across_registrars() {
        let mut runner = LocalRunner::new(Context::Both);

        Registrar::new()
            .register_suite(arithmetic("Shared"), &mut runner)
            .unwrap();
        let err = Registrar::new()
            .register_suite(arithmetic("Shared"), &mut runner)
            .unwrap_err();

        assert_eq!(err, ClassyError::duplicate_suite("Shared"));
        assert_eq!(runner.len(), 2);
        assert!(Registrar::new().is_registered("Shared"));
    }

    #[test]
    fn test_full_names_are_unique_across_registrars() {
        let mut runner = LocalRunner::new(Context::Both);
        let first = Suite::builder("Split - left", || ()).test("right", |_, _| ()).build();
        let second = Suite::builder("Split", || ()).test("left - right", |_, _| ()).build();

        Registrar::new().register_suite(first, &mut runner).unwrap();
        let err = Registrar::new().register_suite(second, &mut runner).unwrap_err();

        assert_eq!(err, ClassyError::duplicate_test("Split - left - right"));
        assert!(!Registrar::new().is_registered("Split"));
        assert_eq!(runner.len(), 1);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let mut runner = LocalRunner::new(Context::Both);
        let suite = Suite::builder("  ", || ()).test("a", |_, _| ()).build();

        let err = Registrar::new().register_suite(suite, &mut runner).unwrap_err();

        assert_eq!(err, ClassyError::MissingName);
        assert!(runner.is_empty());
    }

    #[test]
    fn test_duplicate_test_name_is_rejected_before_registration() {
        let mut runner = LocalRunner::new(Context::Both);
        let suite = Suite::builder("Twice", || ())
            .test("a", |_, _| ())
            .test("b", |_, _| ())
            .test("a", |_, _| ())
            .build();

        let err = Registrar::new().register_suite(suite, &mut runner).unwrap_err();

        assert_eq!(err, ClassyError::duplicate_test("Twice - a"));
        assert!(runner.is_empty());
    }

    #[test]
    fn test_colliding_full_names_across_suites() {
        let mut runner = LocalRunner::new(Context::Both);
        let registrar = Registrar::new();
        let first = Suite::builder("A - b", || ()).test("c", |_, _| ()).build();
        let second = Suite::builder("A", || ()).test("b - c", |_, _| ()).build();

        registrar.register_suite(first, &mut runner).unwrap();
        let err = registrar.register_suite(second, &mut runner).unwrap_err();

        assert_eq!(err, ClassyError::duplicate_test("A - b - c"));
        assert!(!registrar.is_registered("A"));
    }

    #[test]
    fn test_empty_suite_is_rejected() {
        let mut runner = LocalRunner::new(Context::Both);
        let suite = Suite::builder("Hollow", || ())
            .set_up(|_: &mut (), _: &Reporter| ())
            .build();

        let err = Registrar::new().register_suite(suite, &mut runner).unwrap_err();

        assert_eq!(err, ClassyError::empty_suite("Hollow"));
    }

    #[test]
    fn test_server_only_suite_in_client_process() {
        let mut runner = LocalRunner::new(Context::Client);
        let suite = Suite::builder("ServerOnly", || ())
            .server_only()
            .test("query", |_, _| ())
            .build();

        let tests = Registrar::new().register_suite(suite, &mut runner).unwrap();

        assert!(tests.is_empty());
        assert!(runner.is_empty());
    }

    #[test]
    fn test_per_test_context_filters_individual_tests() {
        let mut runner = LocalRunner::new(Context::Server);
        let suite = Suite::builder("Mixed", || ())
            .test("everywhere", |_, _| ())
            .test_in(Context::Client, "render", |_, _| ())
            .test_in(Context::Server, "persist", |_, _| ())
            .build();

        let tests = Registrar::new().register_suite(suite, &mut runner).unwrap();

        assert_eq!(names(&tests), vec!["Mixed - everywhere", "Mixed - persist"]);
        assert_eq!(tests[1].context(), Context::Server);
    }

    #[test]
    fn test_context_conflict_is_rejected() {
        let mut runner = LocalRunner::new(Context::Both);
        let suite = Suite::builder("Conflict", || ())
            .client_only()
            .test_in(Context::Server, "persist", |_, _| ())
            .build();

        let err = Registrar::new().register_suite(suite, &mut runner).unwrap_err();

        assert!(matches!(err, ClassyError::ContextConflict { .. }));
    }
}
