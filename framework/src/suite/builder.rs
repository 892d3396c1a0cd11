//! Fluent construction of test case descriptors

use super::{step_fn, Factory, Scope, Step, Suite, TestMethod, SET_UP, TEAR_DOWN};
use crate::completion::IntoCompletion;
use crate::context::Context;
use crate::reporter::Reporter;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for [`Suite`]
///
/// Returned by [`Suite::builder`] and [`Suite::try_builder`].
///
/// # Example
///
/// ```rust,ignore
/// Suite::builder("Subscriptions", Subscriptions::default)
///     .server_only()
///     .set_up(|s: &mut Subscriptions, _: &Reporter| s.connect())
///     .test("ready", |s: &mut Subscriptions, test: &Reporter| s.wait_ready(test))
///     .tear_down(|s: &mut Subscriptions, _: &Reporter| s.disconnect())
///     .build();
/// ```
pub struct SuiteBuilder<S> {
    name: String,
    context: Context,
    scope: Scope,
    factory: Factory<S>,
    set_up: Option<Step<S>>,
    tear_down: Option<Step<S>>,
    tests: IndexMap<String, TestMethod<S>>,
    inherited: HashSet<String>,
    duplicates: Vec<String>,
}

impl<S: Send + 'static> SuiteBuilder<S> {
    pub(crate) fn new(name: String, factory: Factory<S>) -> Self {
        Self {
            name,
            context: Context::Both,
            scope: Scope::Test,
            factory,
            set_up: None,
            tear_down: None,
            tests: IndexMap::new(),
            inherited: HashSet::new(),
            duplicates: Vec::new(),
        }
    }

    // =========================================================================
    // Test case metadata
    // =========================================================================

    /// Set the execution context
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Register only in client processes
    pub fn client_only(self) -> Self {
        self.context(Context::Client)
    }

    /// Register only in server processes
    pub fn server_only(self) -> Self {
        self.context(Context::Server)
    }

    /// Set the instance scope
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Set the hook run before every test
    pub fn set_up<F, R>(self, f: F) -> Self
    where
        F: Fn(&mut S, &Reporter) -> R + Send + Sync + 'static,
        R: IntoCompletion,
    {
        self.set_up_step(sync_step(f))
    }

    /// Set the hook run before every test from a bound step
    pub fn set_up_step(mut self, step: Step<S>) -> Self {
        self.set_up = Some(step);
        self
    }

    /// Set the hook run after every test, even a failed one
    pub fn tear_down<F, R>(self, f: F) -> Self
    where
        F: Fn(&mut S, &Reporter) -> R + Send + Sync + 'static,
        R: IntoCompletion,
    {
        self.tear_down_step(sync_step(f))
    }

    /// Set the hook run after every test from a bound step
    pub fn tear_down_step(mut self, step: Step<S>) -> Self {
        self.tear_down = Some(step);
        self
    }

    // =========================================================================
    // Tests
    // =========================================================================

    /// Add a test running in the test case's context
    ///
    /// The reserved names `set_up` and `tear_down` set the hooks instead.
    pub fn test<F, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut S, &Reporter) -> R + Send + Sync + 'static,
        R: IntoCompletion,
    {
        self.test_step_in(Context::Both, name, sync_step(f))
    }

    /// Add a test restricted to `context`
    pub fn test_in<F, R>(self, context: Context, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut S, &Reporter) -> R + Send + Sync + 'static,
        R: IntoCompletion,
    {
        self.test_step_in(context, name, sync_step(f))
    }

    /// Add a test from a bound step
    pub fn test_step(self, name: impl Into<String>, step: Step<S>) -> Self {
        self.test_step_in(Context::Both, name, step)
    }

    /// Add a test from a bound step, restricted to `context`
    pub fn test_step_in(mut self, context: Context, name: impl Into<String>, step: Step<S>) -> Self {
        let name = name.into();
        match name.as_str() {
            SET_UP => return self.set_up_step(step),
            TEAR_DOWN => return self.tear_down_step(step),
            _ => {}
        }

        let overrides_parent = self.inherited.remove(&name);
        let previous = self.tests.insert(name.clone(), TestMethod { context, step });
        if previous.is_some() && !overrides_parent {
            self.duplicates.push(name);
        }
        self
    }

    // =========================================================================
    // Inheritance
    // =========================================================================

    /// Inherit hooks and tests of a parent test case embedded in `S`
    ///
    /// `project` selects the parent value inside the child instance; inherited steps
    /// run against it. Tests and hooks the child defines itself, before or after
    /// this call, override the inherited ones. Overridden tests keep the parent's
    /// position.
    pub fn inherit<P: Send + 'static>(mut self, parent: Suite<P>, project: fn(&mut S) -> &mut P) -> Self {
        if self.set_up.is_none() {
            self.set_up = parent.set_up.map(|step| lift(step, project));
        }
        if self.tear_down.is_none() {
            self.tear_down = parent.tear_down.map(|step| lift(step, project));
        }

        for (name, method) in parent.tests {
            if self.tests.contains_key(&name) {
                continue;
            }
            self.inherited.insert(name.clone());
            self.tests.insert(
                name,
                TestMethod {
                    context: method.context,
                    step: lift(method.step, project),
                },
            );
        }
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> Suite<S> {
        Suite {
            name: self.name,
            context: self.context,
            scope: self.scope,
            factory: self.factory,
            set_up: self.set_up,
            tear_down: self.tear_down,
            tests: self.tests,
            duplicates: self.duplicates,
            shared: tokio::sync::Mutex::new(None),
        }
    }
}

/// Bind a synchronous closure as a step
///
/// The closure is called inside the returned future, so a panic surfaces while the
/// adapter polls it.
fn sync_step<S, F, R>(f: F) -> Step<S>
where
    S: Send + 'static,
    F: Fn(&mut S, &Reporter) -> R + Send + Sync + 'static,
    R: IntoCompletion,
{
    let f = Arc::new(f);
    step_fn(move |instance, reporter| {
        let f = Arc::clone(&f);
        Box::pin(async move { f(instance, reporter).into_completion() })
    })
}

/// Re-bind a parent step onto the child instance
fn lift<S, P>(step: Step<P>, project: fn(&mut S) -> &mut P) -> Step<S>
where
    S: 'static,
    P: 'static,
{
    step_fn(move |instance, reporter| step(project(instance), reporter))
}
