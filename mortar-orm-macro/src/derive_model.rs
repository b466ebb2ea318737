//! # Model Derive Macro Implementation
//!
//! Expands `#[derive(Model)]` into an implementation of `mortar_orm::Reflect`
//! for a struct with named fields:
//!
//! ```rust,ignore
//! #[derive(Debug, Default, Model)]
//! struct DeptEmp {
//!     #[orm("typ=INT,notnull=t,pk=pk_dept_emp")]
//!     emp_no: i32,
//!     #[orm("typ=CHAR(4),notnull=t,pk=pk_dept_emp")]
//!     dept_no: String,
//! }
//!
//! // Generated:
//! impl ::mortar_orm::Reflect for DeptEmp {
//!     type Elem = Self;
//!     fn shape() -> Shape { Shape::Struct }
//!     fn fields() -> Vec<Field> { /* name, raw tag and shape per field */ }
//!     fn set_field(&mut self, index, raw, layout) -> Result<()> { /* match on index */ }
//!     fn field_value(&self, index) -> Result<Value> { /* match on index */ }
//!     fn elements(&self) -> &[Self] { std::slice::from_ref(self) }
//! }
//! ```
//!
//! The tag string is kept raw; the runtime tag parser reads it.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr};

/// Expands the derive, or returns the error to report at the offending span.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;
    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &ast.ident,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(&ast.ident, "Model can only be derived for structs")),
    };

    let mut descriptors = Vec::new();
    let mut setters = Vec::new();
    let mut getters = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        // Raw identifiers are reported without their `r#` prefix.
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
        let tag = field_tag(&field.attrs)?.unwrap_or_default();

        descriptors.push(quote! {
            ::mortar_orm::Field {
                name: #name,
                tag: #tag,
                shape: <#ty as ::mortar_orm::Reflect>::shape(),
            }
        });
        setters.push(quote! {
            #index => {
                self.#ident = <#ty as ::mortar_orm::Reflect>::decode(raw, layout)?;
                ::std::result::Result::Ok(())
            }
        });
        getters.push(quote! {
            #index => ::mortar_orm::Reflect::to_value(&self.#ident),
        });
    }

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::mortar_orm::Reflect for #struct_name #ty_generics #where_clause {
            type Elem = Self;

            fn shape() -> ::mortar_orm::Shape {
                ::mortar_orm::Shape::Struct
            }

            fn fields() -> ::std::vec::Vec<::mortar_orm::Field> {
                ::std::vec![#(#descriptors),*]
            }

            fn set_field(
                &mut self,
                index: usize,
                raw: &[u8],
                layout: ::std::option::Option<&str>,
            ) -> ::mortar_orm::Result<()> {
                match index {
                    #(#setters)*
                    _ => ::std::result::Result::Err(::mortar_orm::Error::invalid_value(::std::format!(
                        "{} has no field {}",
                        <Self as ::mortar_orm::Reflect>::type_name(),
                        index
                    ))),
                }
            }

            fn field_value(&self, index: usize) -> ::mortar_orm::Result<::mortar_orm::Value> {
                match index {
                    #(#getters)*
                    _ => ::std::result::Result::Err(::mortar_orm::Error::invalid_value(::std::format!(
                        "{} has no field {}",
                        <Self as ::mortar_orm::Reflect>::type_name(),
                        index
                    ))),
                }
            }

            fn elements(&self) -> &[Self] {
                ::std::slice::from_ref(self)
            }
        }
    })
}

/// Reads the string literal of `#[orm("...")]`, if present.
fn field_tag(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut tag = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("orm")) {
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[orm] attribute"));
        }
        let lit: LitStr = attr.parse_args()?;
        tag = Some(lit.value());
    }
    Ok(tag)
}
