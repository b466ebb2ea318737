//! # Reflection Module
//!
//! The rows and model parsers work on destination types they know nothing
//! about at compile time. [`Reflect`] describes such a type at runtime:
//!
//! - its [`Shape`]: a scalar of some [`Kind`], a struct, a map or a vector
//! - for structs, the list of [`Field`]s with their raw `#[orm("...")]` tags,
//!   plus index-based field access
//! - for maps, keyed insertion and lookup
//! - for vectors, element access and appending
//!
//! The crate implements `Reflect` for every scalar kind, `HashMap<String, V>`
//! and `Vec<T>`. Structs get it from `#[derive(Model)]`:
//!
//! ```rust,ignore
//! use mortar_orm::Model;
//!
//! #[derive(Debug, Default, Model)]
//! struct Employee {
//!     #[orm("emp_no,typ=INT,notnull=t,pk=pk_employees")]
//!     emp_no: i32,
//!     first_name: String,
//!     #[orm("layout=DateOnly")]
//!     birth_date: chrono::DateTime<chrono::Utc>,
//! }
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::slice;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::temporal;
use crate::value::Value;

// ============================================================================
// Kind & Shape
// ============================================================================

/// The scalar kinds the coercion engine converts to and from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Bool,
    /// `DateTime<Utc>`
    Time,
    NaiveDateTime,
    NaiveDate,
    Uuid,
    /// A dynamic [`Value`], decoded as raw text.
    Value,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Bool => "bool",
            Kind::Time | Kind::NaiveDateTime | Kind::NaiveDate => "time",
            Kind::Uuid => "uuid",
            Kind::Value => "value",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of shapes the parsers dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar(Kind),
    Struct,
    /// `HashMap<String, V>`
    Map,
    /// `Vec<T>`; the element shape is `<T::Elem as Reflect>::shape()`.
    Slice,
}

/// A struct field as seen by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Declared field name, without any `r#` prefix.
    pub name: &'static str,
    /// Raw tag text from `#[orm("...")]`, empty when absent.
    pub tag: &'static str,
    pub shape: Shape,
}

// ============================================================================
// Reflect Trait
// ============================================================================

/// Runtime description of a destination or model type.
///
/// Every method except [`shape`](Reflect::shape) and
/// [`elements`](Reflect::elements) has a default that fails with
/// `InvalidType`, so an implementation only provides what its shape needs.
pub trait Reflect: Default + Sized {
    /// Element type. `Self` for everything except vectors.
    type Elem: Reflect;

    fn shape() -> Shape;

    fn type_name() -> &'static str {
        type_name::<Self>()
    }

    /// Parses a raw, non-empty cell into a scalar.
    fn decode(_raw: &[u8], _layout: Option<&str>) -> Result<Self> {
        Err(unsupported::<Self>("decoded from a column"))
    }

    /// Converts a scalar into a [`Value`].
    fn to_value(&self) -> Result<Value> {
        Err(unsupported::<Self>("converted to a value"))
    }

    /// Struct fields in declaration order.
    fn fields() -> Vec<Field> {
        Vec::new()
    }

    /// Decodes `raw` into the field at `index`.
    fn set_field(&mut self, _index: usize, _raw: &[u8], _layout: Option<&str>) -> Result<()> {
        Err(unsupported::<Self>("used as a struct"))
    }

    fn field_value(&self, _index: usize) -> Result<Value> {
        Err(unsupported::<Self>("used as a struct"))
    }

    /// Inserts a map entry; `None` stores the zero value.
    fn map_insert(&mut self, _key: &str, _raw: Option<&[u8]>) -> Result<()> {
        Err(unsupported::<Self>("used as a map"))
    }

    /// Looks up a map entry; `None` when the key is absent.
    fn map_value(&self, _key: &str) -> Option<Result<Value>> {
        None
    }

    /// The elements of a vector, or the value itself for any other shape.
    fn elements(&self) -> &[Self::Elem];

    fn push_element(&mut self, _elem: Self::Elem) -> Result<()> {
        Err(unsupported::<Self>("used as a vector"))
    }
}

fn unsupported<T>(what: &str) -> Error {
    Error::invalid_type(format!("{} cannot be {what}", type_name::<T>()))
}

fn cell_text(raw: &[u8], kind: Kind) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|_| Error::failed_parse(kind, String::from_utf8_lossy(raw)))
}

/// Boolean text: `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::failed_parse(Kind::Bool, text)),
    }
}

// ============================================================================
// Scalar Implementations
// ============================================================================

macro_rules! reflect_scalar {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                type Elem = Self;

                fn shape() -> Shape {
                    Shape::Scalar(Kind::$kind)
                }

                fn decode(raw: &[u8], _layout: Option<&str>) -> Result<Self> {
                    let text = cell_text(raw, Kind::$kind)?;
                    text.parse::<$t>().map_err(|_| Error::failed_parse(Kind::$kind, text))
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(Value::from(*self))
                }

                fn elements(&self) -> &[Self] {
                    slice::from_ref(self)
                }
            }
        )*
    };
}

reflect_scalar!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
);

impl Reflect for String {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::String)
    }

    fn decode(raw: &[u8], _layout: Option<&str>) -> Result<Self> {
        cell_text(raw, Kind::String).map(str::to_string)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for bool {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::Bool)
    }

    fn decode(raw: &[u8], _layout: Option<&str>) -> Result<Self> {
        parse_bool(cell_text(raw, Kind::Bool)?)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for DateTime<Utc> {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::Time)
    }

    fn decode(raw: &[u8], layout: Option<&str>) -> Result<Self> {
        temporal::parse_time(cell_text(raw, Kind::Time)?, layout)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Time(*self))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for NaiveDateTime {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::NaiveDateTime)
    }

    fn decode(raw: &[u8], layout: Option<&str>) -> Result<Self> {
        temporal::parse_time(cell_text(raw, Kind::NaiveDateTime)?, layout).map(|t| t.naive_utc())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Time(self.and_utc()))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for NaiveDate {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::NaiveDate)
    }

    fn decode(raw: &[u8], layout: Option<&str>) -> Result<Self> {
        temporal::parse_time(cell_text(raw, Kind::NaiveDate)?, layout).map(|t| t.date_naive())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::from(*self))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for Uuid {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::Uuid)
    }

    fn decode(raw: &[u8], _layout: Option<&str>) -> Result<Self> {
        let text = cell_text(raw, Kind::Uuid)?;
        Uuid::parse_str(text).map_err(|_| Error::failed_parse(Kind::Uuid, text))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::from(*self))
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl Reflect for Value {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Scalar(Kind::Value)
    }

    fn decode(raw: &[u8], _layout: Option<&str>) -> Result<Self> {
        Ok(Value::String(String::from_utf8_lossy(raw).into_owned()))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

// ============================================================================
// Container Implementations
// ============================================================================

impl<V: Reflect> Reflect for HashMap<String, V> {
    type Elem = Self;

    fn shape() -> Shape {
        Shape::Map
    }

    fn map_insert(&mut self, key: &str, raw: Option<&[u8]>) -> Result<()> {
        let value = match raw {
            Some(raw) if !raw.is_empty() => V::decode(raw, None)?,
            _ => V::default(),
        };
        self.insert(key.to_string(), value);
        Ok(())
    }

    fn map_value(&self, key: &str) -> Option<Result<Value>> {
        self.get(key).map(Reflect::to_value)
    }

    fn elements(&self) -> &[Self] {
        slice::from_ref(self)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    type Elem = T;

    fn shape() -> Shape {
        Shape::Slice
    }

    fn elements(&self) -> &[T] {
        self.as_slice()
    }

    fn push_element(&mut self, elem: T) -> Result<()> {
        self.push(elem);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_respect_target_width() {
        assert_eq!(i8::decode(b"-128", None).unwrap(), -128);
        let err = i8::decode(b"128", None).unwrap_err();
        assert_eq!(err.to_string(), "failed to parse \"128\" as i8");
        assert!(u32::decode(b"-1", None).is_err());
        assert_eq!(u64::decode(b"18446744073709551615", None).unwrap(), u64::MAX);
    }

    #[test]
    fn bools_follow_the_standard_set() {
        assert!(bool::decode(b"1", None).unwrap());
        assert!(bool::decode(b"True", None).unwrap());
        assert!(!bool::decode(b"F", None).unwrap());
        assert!(bool::decode(b"yes", None).is_err());
    }

    #[test]
    fn floats_and_strings() {
        assert_eq!(f64::decode(b"1.25", None).unwrap(), 1.25);
        assert_eq!(f32::decode(b"0.5", None).unwrap(), 0.5);
        assert_eq!(String::decode(b"Taro", None).unwrap(), "Taro");
    }

    #[test]
    fn shapes() {
        assert_eq!(i32::shape(), Shape::Scalar(Kind::I32));
        assert_eq!(<Vec<String>>::shape(), Shape::Slice);
        assert_eq!(<<Vec<String> as Reflect>::Elem as Reflect>::shape(), Shape::Scalar(Kind::String));
        assert_eq!(<HashMap<String, i64>>::shape(), Shape::Map);
    }

    #[test]
    fn containers_reject_scalar_operations() {
        let err = <Vec<i32>>::decode(b"1", None).unwrap_err();
        assert!(matches!(err, Error::InvalidType(msg) if msg.contains("alloc::vec::Vec<i32>")));
        assert!(<HashMap<String, i32>>::default().to_value().is_err());
    }

    #[test]
    fn maps_store_zero_values_for_empty_cells() {
        let mut m: HashMap<String, i32> = HashMap::new();
        m.map_insert("a", Some(b"7")).unwrap();
        m.map_insert("b", None).unwrap();
        assert_eq!(m["a"], 7);
        assert_eq!(m["b"], 0);
        assert_eq!(m.map_value("a").unwrap().unwrap(), Value::Int(7));
        assert!(m.map_value("c").is_none());
    }
}
