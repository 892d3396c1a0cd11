//! Error types for classy-test
//!
//! Two families of errors live here:
//! - [`ClassyError`] - configuration errors raised while registering a test case.
//!   They abort registration of the offending test case only.
//! - [`Failure`] - a failed outcome of a single test invocation (assertion failure,
//!   `Err` return, failed completion signal or caught panic). Failures are always
//!   reported through the invocation's reporter and never escape the adapter.

use crate::context::Context;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Configuration error raised at registration time
///
/// # Example
///
/// ```rust,ignore
/// use classy_test::{ClassyError, Registrar};
///
/// match registrar.register::<MathTests>(&mut runner) {
///     Ok(tests) => println!("registered {} tests", tests.len()),
///     Err(ClassyError::DuplicateSuiteName { name }) => eprintln!("{} registered twice", name),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassyError {
    /// The test case has an empty name
    #[error("Test case is missing its required name")]
    MissingName,

    /// Another test case with the same name was already registered
    #[error("Test case '{name}' is already registered")]
    DuplicateSuiteName {
        /// The conflicting test case name
        name: String,
    },

    /// Two tests resolve to the same full name
    #[error("Duplicate test name '{full_name}'")]
    DuplicateTestName {
        /// The generated `"<suite> - <method>"` name
        full_name: String,
    },

    /// The test case declares no tests at all
    #[error("Test case '{name}' declares no tests")]
    EmptySuite {
        /// The test case name
        name: String,
    },

    /// A test is restricted to a context its test case never runs in
    #[error("Test '{full_name}' runs on {test} but its test case runs on {suite}")]
    ContextConflict {
        /// The generated full test name
        full_name: String,
        /// Context declared on the test
        test: Context,
        /// Context declared on the test case
        suite: Context,
    },

    /// A configuration value could not be parsed
    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig {
        /// The configuration key (usually an environment variable)
        key: String,
        /// The rejected value
        value: String,
    },
}

impl ClassyError {
    /// Create a DuplicateSuiteName error
    pub fn duplicate_suite(name: impl Into<String>) -> Self {
        Self::DuplicateSuiteName { name: name.into() }
    }

    /// Create a DuplicateTestName error
    pub fn duplicate_test(full_name: impl Into<String>) -> Self {
        Self::DuplicateTestName {
            full_name: full_name.into(),
        }
    }

    /// Create an EmptySuite error
    pub fn empty_suite(name: impl Into<String>) -> Self {
        Self::EmptySuite { name: name.into() }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What produced a [`Failure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An assertion helper on the reporter failed
    Assertion,
    /// A hook or test returned `Err`, or failed explicitly
    Error,
    /// A panic was caught at the adapter boundary
    Panic,
    /// An asynchronous completion signal reported failure or was dropped
    Signal,
    /// The runner abandoned the test after its timeout
    Timeout,
}

/// A failed outcome attributed to one test invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// What produced the failure
    pub kind: FailureKind,
    /// Human readable failure message
    pub message: String,
    /// Lifecycle phase the failure happened in, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl Failure {
    /// Create an explicit failure with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Error, message)
    }

    /// Create a failure of a specific kind
    pub fn with_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
        }
    }

    /// Create an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Assertion, message)
    }

    /// Create a failure from any displayable error value
    pub fn from_error<E: fmt::Display + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }

    /// Create a failure from a caught panic payload
    pub fn panic(payload: &(dyn Any + Send)) -> Self {
        Self::with_kind(FailureKind::Panic, panic_message(payload))
    }

    /// Attach the lifecycle phase the failure happened in
    ///
    /// An already attached phase is kept.
    pub fn in_phase(mut self, phase: impl fmt::Display) -> Self {
        if self.phase.is_none() {
            self.phase = Some(phase.to_string());
        }
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            Some(phase) => write!(f, "{} (in {})", self.message, phase),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Failure {}

/// Extract the message of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}
