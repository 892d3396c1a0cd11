use classy_test::{
    test_case, Context, Event, FailureKind, LocalRunner, Pending, Registrar, Reporter,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn explode() {
    panic!("callback blew up");
}

#[derive(Default)]
struct FlakyTests;

#[test_case(name = "Flaky")]
impl FlakyTests {
    fn guarded_callback(&mut self, test: &Reporter) -> Pending {
        let (signal, pending) = test.pending();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::ZERO).await;
            signal.guard(explode);
            signal.done();
        });
        pending
    }

    fn runs_afterwards(&mut self, test: &Reporter) {
        test.is_true(true);
    }
}

#[tokio::test]
async fn flaky_reports_exactly_one_failure_and_the_run_continues() {
    let mut runner = LocalRunner::new(Context::Both).strict(true);
    Registrar::new().register::<FlakyTests>(&mut runner).unwrap();

    let summary = runner.run().await;

    let flaky = summary.outcome("Flaky - guarded_callback").unwrap();
    let failures: Vec<_> = flaky
        .events
        .iter()
        .filter(|event| !matches!(event, Event::Ok { .. }))
        .collect();
    assert_eq!(failures.len(), 1);

    let failure = flaky.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Panic);
    assert_eq!(failure.message, "callback blew up");
    assert_eq!(failure.phase.as_deref(), Some("callback"));

    assert!(summary.outcome("Flaky - runs_afterwards").unwrap().passed());
}

#[derive(Default)]
struct SignalTests;

#[test_case(name = "Signals")]
impl SignalTests {
    async fn ready_later(&mut self, test: &Reporter) -> Pending {
        let (signal, pending) = test.pending();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            signal.done();
            signal.fail("too late to matter");
        });
        pending
    }

    fn failed_signal(&mut self, test: &Reporter) -> Pending {
        let (signal, pending) = test.pending();
        tokio::spawn(async move {
            signal.fail("subscription rejected");
        });
        pending
    }

    fn forgotten_signal(&mut self, test: &Reporter) -> Pending {
        let (_signal, pending) = test.pending();
        pending
    }
}

#[tokio::test]
async fn pending_tests_wait_for_their_signal() {
    let mut runner = LocalRunner::new(Context::Both).timeout(Duration::from_secs(5));
    Registrar::new().register::<SignalTests>(&mut runner).unwrap();

    let summary = runner.run().await;

    assert!(summary.outcome("Signals - ready_later").unwrap().passed());

    let failed = summary.outcome("Signals - failed_signal").unwrap();
    let failure = failed.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Signal);
    assert_eq!(failure.message, "subscription rejected");

    let forgotten = summary.outcome("Signals - forgotten_signal").unwrap();
    assert_eq!(forgotten.failure.as_ref().unwrap().kind, FailureKind::Signal);
}
