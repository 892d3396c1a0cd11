//! Execution contexts and the context selector
//!
//! A process runs either client-side, server-side, or (for in-process runs) both.
//! Every test case declares which of these it belongs to; the registrar consults
//! [`select_context`] once at registration time and skips tests the current process
//! does not admit.

use crate::error::ClassyError;
use crate::registrar::full_test_name;
use crate::suite::Suite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a test case (or a process) executes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    /// Client side only
    Client,
    /// Server side only
    Server,
    /// Both sides
    #[default]
    Both,
}

impl Context {
    /// Check whether something declared for `self` registers in a `process` context
    ///
    /// A `Both` process admits everything; a client process never admits
    /// server-only tests and vice versa.
    pub fn admits(self, process: Context) -> bool {
        match self {
            Self::Both => true,
            Self::Client => process != Self::Server,
            Self::Server => process != Self::Client,
        }
    }

    /// Narrow two contexts to the one both allow
    ///
    /// Returns `None` when they are disjoint (client vs. server).
    pub fn intersect(self, other: Context) -> Option<Context> {
        match (self, other) {
            (Self::Both, other) | (other, Self::Both) => Some(other),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Context {
    type Err = ClassyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" | "client-only" => Ok(Self::Client),
            "server" | "server-only" => Ok(Self::Server),
            "both" | "" => Ok(Self::Both),
            other => Err(ClassyError::invalid_config("context", other)),
        }
    }
}

/// Select the context a test case registers for
///
/// Defaults to [`Context::Both`] unless the test case declared an override.
pub fn select_context<S>(suite: &Suite<S>) -> Context {
    suite.context()
}

/// Select the effective context of one test in a test case
///
/// A test may narrow its test case's context, never widen it.
pub fn select_test_context<S>(suite: &Suite<S>, method: &str) -> Result<Context, ClassyError> {
    let suite_context = select_context(suite);
    let test_context = suite
        .test(method)
        .map(|test| test.context())
        .unwrap_or_default();

    suite_context
        .intersect(test_context)
        .ok_or_else(|| ClassyError::ContextConflict {
            full_name: full_test_name(suite.name(), method),
            test: test_context,
            suite: suite_context,
        })
}
