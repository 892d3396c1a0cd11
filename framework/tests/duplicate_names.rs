use classy_test::{register_all, test_case, ClassyError, Context, LocalRunner, Registrar};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct First;

#[test_case(name = "Twin")]
impl First {
    fn a(&mut self) {}
}

#[derive(Default)]
struct Second;

#[test_case(name = "Twin")]
impl Second {
    fn b(&mut self) {}
}

#[derive(Default)]
struct Bystander;

#[test_case(name = "Bystander")]
impl Bystander {
    fn c(&mut self) {}
}

#[tokio::test]
async fn register_all_reports_the_duplicate_and_keeps_going() {
    let mut runner = LocalRunner::new(Context::Both);

    let report = register_all(&Registrar::new(), &mut runner);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "Twin");
    assert_eq!(report.failures[0].1, ClassyError::duplicate_suite("Twin"));
    assert!(report.test_names().contains(&"Bystander - c"));
    assert_eq!(runner.len(), 2);

    let err = Registrar::new().register::<First>(&mut runner).unwrap_err();
    assert_eq!(err, ClassyError::duplicate_suite("Twin"));
    let err = Registrar::new().register::<Bystander>(&mut runner).unwrap_err();
    assert_eq!(err, ClassyError::duplicate_suite("Bystander"));

    let again = register_all(&Registrar::new(), &mut runner);
    assert!(again.registered.is_empty());
    assert_eq!(again.failures.len(), 3);
    assert_eq!(runner.len(), 2);

    assert!(runner.run().await.all_passed());
}
