//! `#[test_case]` attribute macro

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Path, Token, Type};

const HOOKS: [&str; 2] = ["set_up", "tear_down"];

/// Parsed arguments of the attribute
#[derive(Default)]
struct TestCaseArgs {
    name: Option<LitStr>,
    context: Option<LitStr>,
    scope: Option<LitStr>,
    factory: Option<Path>,
    try_factory: Option<Path>,
    parent: Option<Type>,
    via: Option<Ident>,
}

impl Parse for TestCaseArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = TestCaseArgs::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match key.to_string().as_str() {
                "name" => args.name = Some(input.parse()?),
                "context" => args.context = Some(input.parse()?),
                "scope" => args.scope = Some(input.parse()?),
                "factory" => args.factory = Some(input.parse()?),
                "try_factory" => args.try_factory = Some(input.parse()?),
                "parent" => args.parent = Some(input.parse()?),
                "via" => args.via = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!(
                            "unknown parameter '{}', expected one of 'name', 'context', 'scope', \
                             'factory', 'try_factory', 'parent', 'via'",
                            other
                        ),
                    ))
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// One hook or test found in the impl block
struct Step {
    method: Ident,
    is_async: bool,
    takes_reporter: bool,
    context: Option<TokenStream2>,
}

pub fn test_case_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    match expand(attr.into(), input.into()) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

pub(crate) fn expand(attr: TokenStream2, input: TokenStream2) -> syn::Result<TokenStream2> {
    let args: TestCaseArgs = syn::parse2(attr)?;
    let mut item: ItemImpl = syn::parse2(input)?;

    let name = args.name.as_ref().ok_or_else(|| {
        syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[test_case] requires a name, e.g. #[test_case(name = \"Math\")]",
        )
    })?;
    if name.value().trim().is_empty() {
        return Err(syn::Error::new_spanned(name, "test case name must not be empty"));
    }
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[test_case] goes on an inherent impl block, not a trait impl",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[test_case] does not support generic test cases",
        ));
    }

    let self_ty = (*item.self_ty).clone();
    let type_ident = type_ident(&self_ty)?;

    let mut steps = Vec::new();
    for impl_item in item.items.iter_mut() {
        if let ImplItem::Fn(method) = impl_item {
            if let Some(step) = collect_step(method)? {
                steps.push(step);
            }
        }
    }

    let builder = builder_tokens(&args, name, &self_ty)?;
    let step_fns = steps.iter().map(|step| step_fn_tokens(step, &self_ty));
    let registrations = steps.iter().map(registration_tokens);
    let register_fn = format_ident!("__classy_register_{}", to_snake_case(&type_ident.to_string()));

    Ok(quote! {
        #item

        impl ::classy_test::TestCase for #self_ty {
            fn suite() -> ::classy_test::Suite<Self> {
                #(#step_fns)*

                #builder
                    #(#registrations)*
                    .build()
            }
        }

        #[doc(hidden)]
        fn #register_fn(
            registrar: &::classy_test::Registrar,
            runner: &mut dyn ::classy_test::TestRunner,
        ) -> ::classy_test::registrar::RegistrationResult {
            registrar.register::<#self_ty>(runner)
        }

        ::classy_test::inventory::submit! {
            ::classy_test::SuiteEntry {
                name: #name,
                register: #register_fn,
            }
        }
    })
}

/// Classify a method, stripping the marker attributes this macro understands
fn collect_step(method: &mut ImplItemFn) -> syn::Result<Option<Step>> {
    let helper = take_marker(&mut method.attrs, "helper");
    let client = take_marker(&mut method.attrs, "client");
    let server = take_marker(&mut method.attrs, "server");

    let Some(receiver) = method.sig.receiver() else {
        return Ok(None);
    };
    if helper {
        return Ok(None);
    }
    if receiver.reference.is_none() {
        return Err(syn::Error::new_spanned(
            receiver,
            "test case methods must take `&self` or `&mut self`",
        ));
    }
    if !method.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &method.sig.generics,
            "test case methods cannot be generic; mark helpers with #[helper]",
        ));
    }

    let extra = method
        .sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();
    if extra > 1 {
        return Err(syn::Error::new_spanned(
            &method.sig.inputs,
            "test case methods take at most one argument, the `&Reporter`",
        ));
    }

    let ident = method.sig.ident.clone();
    let is_hook = HOOKS.contains(&ident.to_string().as_str());
    let context = match (client, server) {
        (true, true) => {
            return Err(syn::Error::new_spanned(
                &ident,
                "a test cannot be both #[client] and #[server]",
            ))
        }
        (true, false) => Some(quote!(::classy_test::Context::Client)),
        (false, true) => Some(quote!(::classy_test::Context::Server)),
        (false, false) => None,
    };
    if is_hook && context.is_some() {
        return Err(syn::Error::new_spanned(
            &ident,
            "#[client] and #[server] apply to tests, not to set_up / tear_down",
        ));
    }

    Ok(Some(Step {
        method: ident,
        is_async: method.sig.asyncness.is_some(),
        takes_reporter: extra == 1,
        context,
    }))
}

/// Remove `#[marker]` from `attrs`, returning whether it was present
fn take_marker(attrs: &mut Vec<Attribute>, marker: &str) -> bool {
    let before = attrs.len();
    attrs.retain(|attr| !attr.path().is_ident(marker));
    attrs.len() != before
}

fn builder_tokens(args: &TestCaseArgs, name: &LitStr, self_ty: &Type) -> syn::Result<TokenStream2> {
    let mut tokens = match (&args.factory, &args.try_factory) {
        (Some(_), Some(try_factory)) => {
            return Err(syn::Error::new_spanned(
                try_factory,
                "use either 'factory' or 'try_factory', not both",
            ))
        }
        (Some(factory), None) => quote! { ::classy_test::Suite::builder(#name, #factory) },
        (None, Some(try_factory)) => {
            quote! { ::classy_test::Suite::try_builder(#name, #try_factory) }
        }
        (None, None) => quote! {
            ::classy_test::Suite::builder(#name, <#self_ty as ::core::default::Default>::default)
        },
    };

    if let Some(context) = &args.context {
        let context = parse_context(context)?;
        tokens.extend(quote! { .context(#context) });
    }

    if let Some(scope) = &args.scope {
        let scope = match scope.value().as_str() {
            "test" => quote!(::classy_test::Scope::Test),
            "suite" => quote!(::classy_test::Scope::Suite),
            _ => {
                return Err(syn::Error::new_spanned(
                    scope,
                    "scope must be \"test\" or \"suite\"",
                ))
            }
        };
        tokens.extend(quote! { .scope(#scope) });
    }

    match (&args.parent, &args.via) {
        (Some(parent), Some(via)) => tokens.extend(quote! {
            .inherit(<#parent as ::classy_test::TestCase>::suite(), {
                fn __classy_project(this: &mut #self_ty) -> &mut #parent {
                    &mut this.#via
                }
                __classy_project
            })
        }),
        (Some(parent), None) => {
            return Err(syn::Error::new_spanned(
                parent,
                "'parent' needs 'via = <field>' naming the field holding the parent",
            ))
        }
        (None, Some(via)) => {
            return Err(syn::Error::new_spanned(via, "'via' is only valid together with 'parent'"))
        }
        (None, None) => {}
    }

    Ok(tokens)
}

fn parse_context(context: &LitStr) -> syn::Result<TokenStream2> {
    match context.value().as_str() {
        "client" => Ok(quote!(::classy_test::Context::Client)),
        "server" => Ok(quote!(::classy_test::Context::Server)),
        "both" => Ok(quote!(::classy_test::Context::Both)),
        _ => Err(syn::Error::new_spanned(
            context,
            "context must be \"client\", \"server\" or \"both\"",
        )),
    }
}

fn step_ident(method: &Ident) -> Ident {
    format_ident!("__classy_step_{}", method)
}

/// Bind a method as a step: call it, await it when async, convert the result
fn step_fn_tokens(step: &Step, self_ty: &Type) -> TokenStream2 {
    let method = &step.method;
    let fn_name = step_ident(method);
    let call = if step.takes_reporter {
        quote! { this.#method(test) }
    } else {
        quote! { this.#method() }
    };
    let call = if step.is_async {
        quote! { #call.await }
    } else {
        call
    };
    let unused = if step.takes_reporter {
        quote! {}
    } else {
        quote! { let _ = test; }
    };

    quote! {
        #[allow(non_snake_case)]
        fn #fn_name<'a>(
            this: &'a mut #self_ty,
            test: &'a ::classy_test::Reporter,
        ) -> ::classy_test::BoxFuture<'a, ::classy_test::Completion> {
            ::std::boxed::Box::pin(async move {
                #unused
                ::classy_test::IntoCompletion::into_completion(#call)
            })
        }
    }
}

fn registration_tokens(step: &Step) -> TokenStream2 {
    let method = &step.method;
    let name = method.to_string();
    let fn_name = step_ident(method);

    match name.as_str() {
        "set_up" => quote! { .set_up_step(::classy_test::step_fn(#fn_name)) },
        "tear_down" => quote! { .tear_down_step(::classy_test::step_fn(#fn_name)) },
        _ => {
            let context = step
                .context
                .clone()
                .unwrap_or_else(|| quote!(::classy_test::Context::Both));
            quote! { .test_step_in(#context, #name, ::classy_test::step_fn(#fn_name)) }
        }
    }
}

fn type_ident(ty: &Type) -> syn::Result<Ident> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.arguments.is_empty() {
                return Ok(segment.ident.clone());
            }
        }
    }
    Err(syn::Error::new_spanned(
        ty,
        "#[test_case] expects a plain struct or enum type",
    ))
}

/// Convert a type name to snake_case for generated function names
fn to_snake_case(name: &str) -> String {
    let mut result = String::new();
    let mut prev_is_uppercase = false;

    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !prev_is_uppercase && !result.ends_with('_') {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_is_uppercase = true;
        } else {
            result.push(c);
            prev_is_uppercase = false;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(attr: TokenStream2, input: TokenStream2) -> String {
        expand(attr, input).unwrap().to_string()
    }

    fn expand_err(attr: TokenStream2, input: TokenStream2) -> String {
        match expand(attr, input) {
            Ok(_) => panic!("expected expansion to fail"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("MathTests"), "math_tests");
        assert_eq!(to_snake_case("ServerOnly"), "server_only");
        assert_eq!(to_snake_case("HTTPTests"), "httptests");
    }

    #[test]
    fn test_methods_become_tests_and_hooks() {
        let out = expand_str(
            quote!(name = "Math"),
            quote! {
                impl MathTests {
                    fn new() -> Self { MathTests }
                    fn set_up(&mut self) {}
                    fn add(&mut self, test: &Reporter) {}
                    async fn subtract(&self, test: &Reporter) {}
                    #[helper]
                    fn lhs(&self) -> i32 { 1 }
                }
            },
        );

        assert!(out.contains("set_up_step"));
        assert!(out.contains("\"add\""));
        assert!(out.contains("\"subtract\""));
        assert!(out.contains("this . subtract (test) . await"));
        assert!(!out.contains("\"new\""));
        assert!(!out.contains("\"lhs\""));
        assert!(!out.contains("# [helper]"));
        assert!(out.contains("__classy_register_math_tests"));
        assert!(out.contains("inventory :: submit !"));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let out = expand_str(
            quote!(name = "Order"),
            quote! {
                impl Order {
                    fn zebra(&mut self) {}
                    fn apple(&mut self) {}
                }
            },
        );

        let zebra = out.find("\"zebra\"").unwrap();
        let apple = out.find("\"apple\"").unwrap();
        assert!(zebra < apple);
    }

    #[test]
    fn test_missing_name_is_a_compile_error() {
        let err = expand_err(quote!(), quote!(impl Unnamed { fn a(&mut self) {} }));
        assert!(err.contains("requires a name"));
    }

    #[test]
    fn test_empty_name_is_a_compile_error() {
        let err = expand_err(quote!(name = " "), quote!(impl Blank { fn a(&mut self) {} }));
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_context_and_scope() {
        let out = expand_str(
            quote!(name = "ServerOnly", context = "server", scope = "suite"),
            quote!(impl ServerOnly { fn query(&mut self) {} }),
        );

        assert!(out.contains(". context (:: classy_test :: Context :: Server)"));
        assert!(out.contains(". scope (:: classy_test :: Scope :: Suite)"));
    }

    #[test]
    fn test_invalid_context_is_rejected() {
        let err = expand_err(
            quote!(name = "Odd", context = "browser"),
            quote!(impl Odd { fn a(&mut self) {} }),
        );
        assert!(err.contains("context must be"));
    }

    #[test]
    fn test_per_test_context_markers() {
        let out = expand_str(
            quote!(name = "Mixed"),
            quote! {
                impl Mixed {
                    #[client]
                    fn render(&mut self) {}
                    #[server]
                    fn persist(&mut self) {}
                }
            },
        );

        assert!(out.contains("test_step_in (:: classy_test :: Context :: Client , \"render\""));
        assert!(out.contains("test_step_in (:: classy_test :: Context :: Server , \"persist\""));
        assert!(!out.contains("# [client]"));
    }

    #[test]
    fn test_context_marker_on_hook_is_rejected() {
        let err = expand_err(
            quote!(name = "Hooked"),
            quote! {
                impl Hooked {
                    #[server]
                    fn set_up(&mut self) {}
                    fn a(&mut self) {}
                }
            },
        );
        assert!(err.contains("apply to tests"));
    }

    #[test]
    fn test_by_value_receiver_is_rejected() {
        let err = expand_err(quote!(name = "Owned"), quote!(impl Owned { fn a(self) {} }));
        assert!(err.contains("`&self` or `&mut self`"));
    }

    #[test]
    fn test_too_many_arguments_are_rejected() {
        let err = expand_err(
            quote!(name = "Wide"),
            quote!(impl Wide { fn a(&mut self, test: &Reporter, extra: u32) {} }),
        );
        assert!(err.contains("at most one argument"));
    }

    #[test]
    fn test_parent_requires_via() {
        let err = expand_err(
            quote!(name = "Child", parent = Base),
            quote!(impl Child { fn a(&mut self) {} }),
        );
        assert!(err.contains("needs 'via"));
    }

    #[test]
    fn test_inherit_comes_before_own_tests() {
        let out = expand_str(
            quote!(name = "Child", parent = Base, via = base),
            quote!(impl Child { fn own(&mut self) {} }),
        );

        let inherit = out.find(". inherit").unwrap();
        let own = out.find("\"own\"").unwrap();
        assert!(inherit < own);
        assert!(out.contains("& mut this . base"));
    }

    #[test]
    fn test_trait_impl_is_rejected() {
        let err = expand_err(
            quote!(name = "Traits"),
            quote!(impl Default for Traits { fn default() -> Self { Traits } }),
        );
        assert!(err.contains("inherent impl block"));
    }

    #[test]
    fn test_factory_and_try_factory_are_exclusive() {
        let err = expand_err(
            quote!(name = "Both", factory = Both::new, try_factory = Both::connect),
            quote!(impl Both { fn a(&mut self) {} }),
        );
        assert!(err.contains("either 'factory' or 'try_factory'"));
    }
}
