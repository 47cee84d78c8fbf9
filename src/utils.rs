use proc_macro2::{Ident, Span, TokenStream};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::Type;

use crate::error::{GeneratorError, GeneratorResult};

pub(crate) fn get_crate_name() -> TokenStream {
    let name = match crate_name("poem-kit") {
        Ok(FoundCrate::Name(name)) => name,
        Ok(FoundCrate::Itself) | Err(_) => "poem_kit".to_string(),
    };
    let name = Ident::new(&name, Span::call_site());
    quote!(#name)
}

/// Formats generated items with `prettyplease`.
pub(crate) fn unparse(tokens: TokenStream) -> GeneratorResult<String> {
    let file = syn::parse2::<syn::File>(tokens.clone())
        .map_err(|err| GeneratorError::syn("generated code", tokens.to_string(), err))?;
    Ok(prettyplease::unparse(&file))
}

pub(crate) fn parse_type(ty: &str) -> GeneratorResult<Type> {
    syn::parse_str::<Type>(ty).map_err(|err| GeneratorError::syn("type", ty, err))
}

/// The identifier of a method, keeping the `r#` prefix of raw identifiers.
pub(crate) fn method_ident(name: &str) -> GeneratorResult<Ident> {
    syn::parse_str::<Ident>(name).map_err(|err| GeneratorError::syn("method name", name, err))
}

/// The identifier of a service with `suffix` appended, e.g. `GreeterClient`.
pub(crate) fn service_ident(name: &str, suffix: &str) -> GeneratorResult<Ident> {
    syn::parse_str::<Ident>(&format!("{name}{suffix}"))
        .map_err(|err| GeneratorError::syn("service name", name, err))
}

/// An identifier derived from a method name, e.g. `make_say_hello_endpoint`.
pub(crate) fn derived_ident(prefix: &str, name: &str, suffix: &str) -> Ident {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut ident = String::new();
    for part in [prefix, name, suffix] {
        if part.is_empty() {
            continue;
        }
        if !ident.is_empty() {
            ident.push('_');
        }
        ident.push_str(part);
    }
    format_ident!("{}", ident)
}

/// Doc attributes for schema comments.
pub(crate) fn doc_comments(comments: &[String]) -> TokenStream {
    let lines = comments.iter().map(|line| {
        let line = line.trim_end();
        quote!(#[doc = #line])
    });
    quote!(#(#lines)*)
}
