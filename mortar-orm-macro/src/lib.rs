//! # Mortar ORM Procedural Macros
//!
//! Provides `#[derive(Model)]`, which lets a struct be used as a query
//! destination and as an insert, update or CREATE TABLE model.
//!
//! This crate is not meant to be used directly; `mortar-orm` re-exports the
//! derive:
//!
//! ```rust,ignore
//! use mortar_orm::Model;
//! use chrono::{DateTime, Utc};
//!
//! #[derive(Debug, Default, Model)]
//! struct Employee {
//!     #[orm("typ=INT,notnull=t,pk=pk_employees")]
//!     emp_no: i32,
//!     first_name: String,
//!     #[orm("hire_date,layout=DateOnly")]
//!     hired: DateTime<Utc>,
//! }
//! ```
//!
//! ## Field Tags
//!
//! `#[orm("...")]` takes a comma-separated list:
//!
//! - a bare token overrides the column name (default: snake_case field name)
//! - `typ=<SQL type>`, `notnull=t`, `default=<literal>`
//! - `pk=<group>`, `uc=<group>`, `fk=<group>:<table>(<column>)`
//! - `layout=<named layout or strftime pattern>` for time fields
//!
//! Every field type must itself implement `Reflect`, and the struct must
//! implement `Default`.

#![warn(missing_docs)]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive_model;

/// Derives `mortar_orm::Reflect` for a struct with named fields.
///
/// Malformed input (an enum, a tuple struct, a non-string `#[orm(..)]`
/// argument) is reported as a compile error on the offending item.
#[proc_macro_derive(Model, attributes(orm))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
