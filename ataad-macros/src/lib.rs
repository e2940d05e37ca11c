//! Procedural macros for Ataad.
//!
//! `#[resource]` turns a factory function into a maker collected at link
//! time. The function name becomes the resource id and the declaring
//! module (`module_path!()`) its origin, so
//! `Resources::register_mod(module_path!())` picks it up.
//!
//! ```rust,ignore
//! #[resource]
//! fn user(args: &Args, _: &Resources) -> Result<Setup<User>, BoxError> {
//!     Ok(Setup::new(User { name: args.text_or("name", "John Doe")? }))
//! }
//!
//! #[resource(id = "admin")]
//! fn admin_user(_: &Args, _: &Resources) -> Result<Setup<User>, BoxError> { ... }
//! ```

use darling::FromMeta;
use darling::ast::NestedMeta;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{ItemFn, parse_macro_input};

#[derive(Debug, Default, FromMeta)]
struct ResourceOptions {
    /// Overrides the id derived from the function name.
    #[darling(default)]
    id: Option<String>,
}

/// Registers a factory function as a resource maker.
///
/// The function must take `(&Args, &Resources)` and return
/// `Result<Setup<T>, BoxError>`.
#[proc_macro_attribute]
pub fn resource(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(args) => args,
        Err(err) => return darling::Error::from(err).write_errors().into(),
    };
    let options = match ResourceOptions::from_list(&attr_args) {
        Ok(options) => options,
        Err(err) => return err.write_errors().into(),
    };

    let func = parse_macro_input!(item as ItemFn);

    if let Err(err) = check_signature(&func) {
        return err.to_compile_error().into();
    }

    let ident = &func.sig.ident;
    let id = options.id.unwrap_or_else(|| ident.to_string());
    let erased = format_ident!("__ataad_erased_{}", ident);

    let expanded: proc_macro2::TokenStream = quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #erased(
            args: &::ataad::Args,
            resources: &::ataad::Resources,
        ) -> ::core::result::Result<::ataad::Setup<::ataad::Value>, ::ataad::BoxError> {
            #ident(args, resources).map(::ataad::Setup::erase)
        }

        ::ataad::__private::inventory::submit! {
            ::ataad::MakerEntry::new(#id, ::core::module_path!(), #erased)
        }
    };

    expanded.into()
}

fn check_signature(func: &ItemFn) -> syn::Result<()> {
    let sig = &func.sig;

    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "resource makers cannot be async"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "resource makers cannot be generic",
        ));
    }
    if sig.inputs.len() != 2 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "resource makers take exactly two arguments: (&Args, &Resources)",
        ));
    }
    Ok(())
}
