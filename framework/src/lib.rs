//! classy-test: test suites declared as types
//!
//! Test authors describe a suite as an `impl` block. `set_up` and `tear_down` are
//! lifecycle hooks, every other method taking `self` is a test. The registrar turns
//! the suite into one registration per test on a callback-style [`TestRunner`], named
//! `"<suite> - <method>"`, and the execution adapter runs each test on a fresh
//! instance.
//!
//! ```rust,ignore
//! use classy_test::{test_case, LocalRunner, Registrar, Reporter};
//!
//! #[derive(Default)]
//! struct MathTests {
//!     base: i32,
//! }
//!
//! #[test_case(name = "Math")]
//! impl MathTests {
//!     fn set_up(&mut self) {
//!         self.base = 1;
//!     }
//!
//!     fn add(&mut self, test: &Reporter) {
//!         test.equal(self.base + 1, 2);
//!     }
//!
//!     async fn subtract(&mut self, test: &Reporter) {
//!         test.equal(self.base - 1, 0);
//!     }
//! }
//!
//! #[tokio::test]
//! async fn math() {
//!     let mut runner = LocalRunner::from_config(classy_test::ClassyConfig::global());
//!     Registrar::new().register::<MathTests>(&mut runner).unwrap();
//!     assert!(runner.run().await.all_passed());
//! }
//! ```

pub mod adapter;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod registrar;
pub mod reporter;
pub mod runner;
pub mod suite;

#[cfg(test)]
pub(crate) mod test_tracing;

pub use adapter::{invoke, Phase};
pub use completion::{channel, Completion, IntoCompletion, IntoOutcome, Outcome, Pending, Signal};
pub use config::{ClassyConfig, ClassyConfigBuilder};
pub use context::{select_context, Context};
pub use error::{ClassyError, Failure, FailureKind};
pub use registrar::{
    full_test_name, register_all, RegisteredTest, Registrar, RegistrationReport, SuiteEntry,
    TestBody, TestRunner,
};
pub use reporter::{Reporter, ResultReporter};
pub use runner::{Event, LocalRunner, RunSummary, TestOutcome, TestResults, TestStatus};
pub use suite::{step_fn, Scope, Step, Suite, SuiteBuilder, TestCase};

pub use futures::future::BoxFuture;

// Re-export for macro-generated code
pub use inventory;

// Re-export the attribute macro
pub use classy_test_macros::test_case;
