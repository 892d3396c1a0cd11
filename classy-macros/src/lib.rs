//! Procedural macros for classy-test
//!
//! This crate provides the `#[test_case]` attribute, which turns an `impl` block
//! into a test case descriptor and registers it for auto-discovery.

use proc_macro::TokenStream;

mod test_case;

/// Declare a test case from an `impl` block
///
/// Methods named `set_up` and `tear_down` become lifecycle hooks. Every other
/// method taking `&self` or `&mut self` becomes a test, in declaration order.
/// Associated functions without a receiver are left alone.
///
/// Methods may be sync or `async`, take an optional `&Reporter` argument and return
/// `()`, `Result<(), E>`, `Pending` or `Result<Pending, E>`.
///
/// # Attributes
///
/// - `name`: test case name, required
/// - `context`: `"client"`, `"server"` or `"both"` (default)
/// - `scope`: `"test"` (fresh instance per test, default) or `"suite"`
/// - `factory`: path to a `fn() -> Self` building instances (default: `Default`)
/// - `try_factory`: path to a `fn() -> Result<Self, E>`
/// - `parent` / `via`: inherit hooks and tests of the test case stored in field `via`
///
/// Method attributes: `#[helper]` excludes a method, `#[client]` / `#[server]`
/// restrict a single test.
///
/// # Example
///
/// ```rust,ignore
/// use classy_test::{test_case, Reporter};
///
/// #[derive(Default)]
/// struct MathTests;
///
/// #[test_case(name = "Math")]
/// impl MathTests {
///     fn add(&mut self, test: &Reporter) {
///         test.equal(1 + 1, 2);
///     }
///
///     #[server]
///     async fn persisted(&mut self, test: &Reporter) -> Result<(), std::io::Error> {
///         test.is_true(store().await?.contains(2));
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn test_case(attr: TokenStream, input: TokenStream) -> TokenStream {
    test_case::test_case_impl(attr, input)
}
