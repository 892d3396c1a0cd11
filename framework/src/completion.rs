//! Single-shot completion signals for asynchronous tests
//!
//! A test that waits on something outside its own future (a spawned task, a timer,
//! a subscription becoming ready) asks its reporter for a [`Signal`] / [`Pending`]
//! pair and returns the `Pending` half. The adapter awaits it before running
//! `tear_down`.
//!
//! Only the first signal is honoured. Later calls are discarded, and so is a signal
//! arriving after the runner abandoned the test.
//!
//! # Example
//!
//! ```rust,ignore
//! fn waits_for_ready(&mut self, test: &Reporter) -> Pending {
//!     let (signal, pending) = test.pending();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!         signal.done();
//!     });
//!     pending
//! }
//! ```

use crate::error::{panic_message, Failure, FailureKind};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result of one hook or test
pub type Outcome = Result<(), Failure>;

/// What a hook or test hands back to the adapter
pub enum Completion {
    /// Finished synchronously
    Ready(Outcome),
    /// Finishes once the paired signal fires
    Pending(Pending),
}

impl Completion {
    /// Wait for the outcome, resolving a pending completion
    pub async fn resolve(self) -> Outcome {
        match self {
            Self::Ready(outcome) => outcome,
            Self::Pending(pending) => pending.wait().await,
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Conversion of hook and test return values into a [`Completion`]
///
/// Implemented for `()`, `Result<(), E>`, [`Pending`] and `Result<Pending, E>`,
/// which are the return types accepted on test case methods.
pub trait IntoCompletion {
    /// Convert into a completion
    fn into_completion(self) -> Completion;
}

impl IntoCompletion for () {
    fn into_completion(self) -> Completion {
        Completion::Ready(Ok(()))
    }
}

impl<E: fmt::Display> IntoCompletion for Result<(), E> {
    fn into_completion(self) -> Completion {
        Completion::Ready(self.map_err(|e| Failure::from_error(&e)))
    }
}

impl IntoCompletion for Pending {
    fn into_completion(self) -> Completion {
        Completion::Pending(self)
    }
}

impl<E: fmt::Display> IntoCompletion for Result<Pending, E> {
    fn into_completion(self) -> Completion {
        match self {
            Ok(pending) => Completion::Pending(pending),
            Err(e) => Completion::Ready(Err(Failure::from_error(&e))),
        }
    }
}

impl IntoCompletion for Completion {
    fn into_completion(self) -> Completion {
        self
    }
}

/// Conversion of callback return values into an [`Outcome`]
pub trait IntoOutcome {
    /// Convert into an outcome
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Ok(())
    }
}

impl<E: fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Outcome {
        self.map_err(|e| Failure::from_error(&e))
    }
}

/// Receiving half of a completion channel
pub struct Pending {
    receiver: oneshot::Receiver<Outcome>,
}

impl Pending {
    /// Wait for the first signal
    ///
    /// Fails when every [`Signal`] clone was dropped without firing.
    pub async fn wait(self) -> Outcome {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Failure::with_kind(
                FailureKind::Signal,
                "completion signal dropped without reporting an outcome",
            )),
        }
    }
}

/// Sending half of a completion channel
///
/// Cheap to clone; every clone shares the same one-time trigger.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalState>,
}

struct SignalState {
    fired: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    test_name: String,
    strict: bool,
}

/// Create an unlabelled completion channel
///
/// Prefer [`Reporter::pending`](crate::Reporter::pending) inside tests, which labels
/// diagnostics with the test name and honours strict mode.
pub fn channel() -> (Signal, Pending) {
    labelled_channel("", false)
}

pub(crate) fn labelled_channel(test_name: &str, strict: bool) -> (Signal, Pending) {
    let (sender, receiver) = oneshot::channel();
    let signal = Signal {
        inner: Arc::new(SignalState {
            fired: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
            test_name: test_name.to_string(),
            strict,
        }),
    };
    (signal, Pending { receiver })
}

impl Signal {
    /// Report success. Returns `false` if a signal was already honoured.
    pub fn done(&self) -> bool {
        self.complete(Ok(()))
    }

    /// Report failure. Returns `false` if a signal was already honoured.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.complete(Err(Failure::with_kind(FailureKind::Signal, message)))
    }

    /// Report an outcome. Returns `false` if a signal was already honoured.
    pub fn complete(&self, outcome: Outcome) -> bool {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            self.discard(&outcome);
            return false;
        }

        let sender = match self.inner.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(sender) = sender {
            // The receiver is gone once the runner abandoned the test
            if sender.send(outcome).is_err() {
                debug!(test = %self.inner.test_name, "completion signal arrived after the test was abandoned");
            }
        }
        true
    }

    /// Run a callback on behalf of the test, failing the test if it panics or errs
    ///
    /// Returns `true` when the callback succeeded. A successful callback does not
    /// complete the test; call [`done`](Self::done) for that.
    pub fn guard<F, R>(&self, callback: F) -> bool
    where
        F: FnOnce() -> R,
        R: IntoOutcome,
    {
        match catch_unwind(AssertUnwindSafe(callback)) {
            Ok(result) => match result.into_outcome() {
                Ok(()) => true,
                Err(failure) => {
                    self.complete(Err(failure.in_phase("callback")));
                    false
                }
            },
            Err(payload) => {
                let failure = Failure::with_kind(FailureKind::Panic, panic_message(&*payload));
                self.complete(Err(failure.in_phase("callback")));
                false
            }
        }
    }

    /// Whether a signal was already honoured
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    fn discard(&self, outcome: &Outcome) {
        let ignored = match outcome {
            Ok(()) => "success".to_string(),
            Err(failure) => failure.to_string(),
        };
        if self.inner.strict {
            warn!(test = %self.inner.test_name, %ignored, "completion signalled more than once; ignoring");
        } else {
            debug!(test = %self.inner.test_name, %ignored, "completion signalled more than once; ignoring");
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("test_name", &self.inner.test_name)
            .field("fired", &self.is_fired())
            .finish()
    }
}
