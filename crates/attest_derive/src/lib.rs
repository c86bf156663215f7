//! Derive macros for the attest inline test engine.
//!
//! - `Reflect`: implements `attest::reflect::Reflect`, exposing a struct's fields by name so that
//!   field expectations can read them after a unit has run.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, parse_macro_input};

/// Generates the `Reflect` trait implementation for a struct.
///
/// Every field type must implement `Clone` and convert into `attest::Value`. Fields marked
/// `#[reflect(skip)]` are left out of the reflection table.
///
/// # Example
/// ```ignore
/// #[derive(Default, Reflect)]
/// struct Counter {
///     value: i64,
///     #[reflect(skip)]
///     scratch: Vec<u8>,
/// }
///
/// // Generates:
/// impl attest::reflect::Reflect for Counter {
///     fn type_name() -> &'static str { "Counter" }
///     fn field_names() -> Vec<&'static str> { vec!["value"] }
///     fn field(&self, name: &str) -> Option<attest::Value> {
///         match name {
///             "value" => Some(attest::Value::from(Clone::clone(&self.value))),
///             _ => None,
///         }
///     }
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_reflect(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand_reflect(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Reflect can only be derived for structs",
        ));
    };

    // (field name as seen by expectations, accessor tokens)
    let mut fields: Vec<(String, TokenStream2)> = Vec::new();
    match &data.fields {
        // Named fields (e.g. `struct Input { value: i64 }`)
        Fields::Named(named) => {
            for field in &named.named {
                if is_skipped(&field.attrs)? {
                    continue;
                }
                if let Some(ident) = &field.ident {
                    fields.push((ident.to_string(), quote!(#ident)));
                }
            }
        }
        // Unnamed fields (e.g. `struct Pair(i64, i64)`) are addressed as "0", "1", ...
        Fields::Unnamed(unnamed) => {
            for (i, field) in unnamed.unnamed.iter().enumerate() {
                if is_skipped(&field.attrs)? {
                    continue;
                }
                let index = Index::from(i);
                fields.push((i.to_string(), quote!(#index)));
            }
        }
        Fields::Unit => {}
    }

    let field_names: Vec<&String> = fields.iter().map(|(n, _)| n).collect();
    let arms = fields.iter().map(|(field_name, accessor)| {
        quote! {
            #field_name => ::core::option::Option::Some(
                ::attest::Value::from(::core::clone::Clone::clone(&self.#accessor))
            ),
        }
    });

    Ok(quote! {
        impl #impl_generics ::attest::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name_str
            }

            fn field_names() -> ::std::vec::Vec<&'static str> {
                ::std::vec![#(#field_names),*]
            }

            fn field(&self, name: &str) -> ::core::option::Option<::attest::Value> {
                match name {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn is_skipped(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported reflect attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}
