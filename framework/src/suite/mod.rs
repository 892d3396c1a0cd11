//! Test case descriptors
//!
//! A test case is a named type whose methods become tests. [`Suite`] is its
//! explicit descriptor: the suite name, an instance factory, two optional hook slots
//! (`set_up` / `tear_down`) and an ordered list of named tests.
//!
//! Descriptors are usually generated by the `#[test_case]` attribute macro from an
//! `impl` block, but can also be built by hand:
//!
//! ```rust,ignore
//! use classy_test::{Reporter, Suite};
//!
//! #[derive(Default)]
//! struct Math {
//!     base: i32,
//! }
//!
//! let suite = Suite::builder("Math", Math::default)
//!     .set_up(|math: &mut Math, _test: &Reporter| math.base = 1)
//!     .test("add", |math: &mut Math, test: &Reporter| {
//!         test.equal(math.base + 1, 2);
//!     })
//!     .build();
//! ```

mod builder;

pub use builder::SuiteBuilder;

use crate::completion::Completion;
use crate::context::Context;
use crate::error::Failure;
use crate::reporter::Reporter;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of the hook run before every test
pub const SET_UP: &str = "set_up";

/// Name of the hook run after every test
pub const TEAR_DOWN: &str = "tear_down";

/// Future returned by a bound hook or test
pub type StepFuture<'a> = BoxFuture<'a, Completion>;

/// A hook or test bound to an instance of `S`
pub type Step<S> = Arc<dyn for<'a> Fn(&'a mut S, &'a Reporter) -> StepFuture<'a> + Send + Sync>;

/// Instance factory of a test case
pub type Factory<S> = Arc<dyn Fn() -> Result<S, Failure> + Send + Sync>;

/// Wrap a function into a [`Step`]
///
/// Accepts `fn` items and closures whose future borrows the instance and reporter.
pub fn step_fn<S, F>(f: F) -> Step<S>
where
    F: for<'a> Fn(&'a mut S, &'a Reporter) -> StepFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Types declared as test cases
///
/// Implemented by the `#[test_case]` attribute macro.
pub trait TestCase: Send + Sized + 'static {
    /// Build the descriptor of this test case
    fn suite() -> Suite<Self>;
}

/// How long one test case instance lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// A fresh instance for every test invocation
    #[default]
    Test,
    /// One instance shared by all tests of the test case, created on first use
    Suite,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "test" => Ok(Self::Test),
            "suite" => Ok(Self::Suite),
            other => Err(format!("unknown scope '{}'", other)),
        }
    }
}

/// One named test of a test case
pub struct TestMethod<S> {
    pub(crate) context: Context,
    pub(crate) step: Step<S>,
}

impl<S> TestMethod<S> {
    /// Context declared on this test (narrows the test case's context)
    pub fn context(&self) -> Context {
        self.context
    }
}

impl<S> Clone for TestMethod<S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context,
            step: Arc::clone(&self.step),
        }
    }
}

/// Descriptor of a test case
pub struct Suite<S> {
    pub(crate) name: String,
    pub(crate) context: Context,
    pub(crate) scope: Scope,
    pub(crate) factory: Factory<S>,
    pub(crate) set_up: Option<Step<S>>,
    pub(crate) tear_down: Option<Step<S>>,
    pub(crate) tests: IndexMap<String, TestMethod<S>>,
    pub(crate) duplicates: Vec<String>,
    pub(crate) shared: tokio::sync::Mutex<Option<S>>,
}

impl<S: Send + 'static> Suite<S> {
    /// Start building a test case whose instances come from `factory`
    pub fn builder<F>(name: impl Into<String>, factory: F) -> SuiteBuilder<S>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        SuiteBuilder::new(name.into(), Arc::new(move || Ok(factory())))
    }

    /// Start building a test case with a fallible instance factory
    ///
    /// A factory error is reported as the failure of the test being run.
    pub fn try_builder<F, E>(name: impl Into<String>, factory: F) -> SuiteBuilder<S>
    where
        F: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        SuiteBuilder::new(
            name.into(),
            Arc::new(move || factory().map_err(|e| Failure::from_error(&e))),
        )
    }
}

impl<S> Suite<S> {
    /// The test case name, used as prefix of every test name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared context (defaults to [`Context::Both`])
    pub fn context(&self) -> Context {
        self.context
    }

    /// Instance scope
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Test names in declaration order, hooks excluded
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    /// Look up a test by method name
    pub fn test(&self, method: &str) -> Option<&TestMethod<S>> {
        self.tests.get(method)
    }

    /// Number of tests, hooks excluded
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the test case declares no tests
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Whether a `set_up` hook is present
    pub fn has_set_up(&self) -> bool {
        self.set_up.is_some()
    }

    /// Whether a `tear_down` hook is present
    pub fn has_tear_down(&self) -> bool {
        self.tear_down.is_some()
    }
}

impl<S> fmt::Debug for Suite<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("scope", &self.scope)
            .field("set_up", &self.set_up.is_some())
            .field("tear_down", &self.tear_down.is_some())
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .finish()
    }
}
