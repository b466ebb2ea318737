//! # Value Module
//!
//! [`Value`] is the dynamic scalar every clause argument and model field is
//! converted to before it is rendered. It has two textual forms:
//!
//! - the **SQL literal** ([`to_literal`]) inlined into generated statements:
//!   `'Taro'`, `10001`, `true`, `'2020-01-02 15:04:05'`
//! - the **argument form** ([`Value::to_arg_string`]) used in the
//!   function-call rendering of clauses: `"Taro"`, `10001`, `[1 2 3]`
//!
//! Values are never bound as parameters: every `?` placeholder in a clause
//! expression is replaced by the literal of the matching argument.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::temporal;

// ============================================================================
// Value
// ============================================================================

/// A dynamically typed scalar.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Time(DateTime<Utc>),
    /// Rendered as a comma separated list, e.g. for `IN (?)`.
    List(Vec<Value>),
}

impl Value {
    /// Renders the value the way it appears inside a clause's function-call form.
    pub fn to_arg_string(&self) -> String {
        match self {
            Value::Null => "<nil>".to_string(),
            Value::String(s) => format!("{s:?}"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::to_arg_string).collect();
                format!("[{}]", items.join(" "))
            }
            other => other.to_string(),
        }
    }
}

/// Plain rendering: unquoted strings, bare numbers, `nil` for null.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Time(t) => write!(f, "{t}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(Uint as u64: u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Time(v.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        match v.and_hms_opt(0, 0, 0) {
            Some(t) => Value::Time(t.and_utc()),
            None => Value::Null,
        }
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Argument Lists
// ============================================================================

/// Conversion of clause arguments into a list of values.
///
/// Implemented for single scalars, tuples of up to eight scalars, `()` and
/// `Vec<Value>`. A `Vec<T>` inside a tuple becomes one [`Value::List`]:
///
/// ```rust,ignore
/// stmt.where_clause("emp_no = ?", 10001);
/// stmt.where_clause("first_name = ? AND gender = ?", ("Taro", "M"));
/// stmt.where_clause("emp_no IN (?)", (vec![10001, 10002],));
/// ```
pub trait IntoValues {
    fn into_values(self) -> Vec<Value>;
}

impl IntoValues for () {
    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoValues for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

macro_rules! into_values_scalar {
    ($($t:ty),*) => {
        $(
            impl IntoValues for $t {
                fn into_values(self) -> Vec<Value> {
                    vec![Value::from(self)]
                }
            }
        )*
    };
}

into_values_scalar!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, &str, String, &String,
    DateTime<Utc>, NaiveDateTime, NaiveDate, Uuid, Value
);

macro_rules! into_values_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoValues for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

into_values_tuple!(A);
into_values_tuple!(A, B);
into_values_tuple!(A, B, C);
into_values_tuple!(A, B, C, D);
into_values_tuple!(A, B, C, D, E);
into_values_tuple!(A, B, C, D, E, F);
into_values_tuple!(A, B, C, D, E, F, G);
into_values_tuple!(A, B, C, D, E, F, G, H);

// ============================================================================
// SQL Literals
// ============================================================================

/// Options for [`to_literal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralOptions<'a> {
    /// Single-quote strings and times.
    pub quote: bool,
    /// Layout for time values; see [`temporal`].
    pub time_format: Option<&'a str>,
}

impl LiteralOptions<'_> {
    /// Quoted literals with the default time format.
    pub fn quoted() -> Self {
        LiteralOptions { quote: true, time_format: None }
    }
}

/// Renders a value as an SQL literal.
///
/// Embedded single quotes are doubled when quoting. Fails only when a time
/// layout is not a valid pattern.
pub fn to_literal(value: &Value, opts: LiteralOptions<'_>) -> Result<String> {
    let quote = |s: &str| {
        if opts.quote {
            format!("'{}'", s.replace('\'', "''"))
        } else {
            s.to_string()
        }
    };

    Ok(match value {
        Value::String(s) => quote(s),
        Value::Time(t) => quote(&temporal::format_time(t, opts.time_format)?),
        Value::List(items) => {
            let items = items.iter().map(|v| to_literal(v, opts)).collect::<Result<Vec<_>>>()?;
            items.join(", ")
        }
        other => other.to_string(),
    })
}

/// Replaces each `?` in `expr`, in order, by the quoted literal of the
/// matching value. Surplus placeholders are left as they are.
pub fn bind_placeholders(expr: &str, values: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(expr.len());
    let mut values = values.iter().peekable();
    for ch in expr.chars() {
        match (ch, values.next_if(|_| ch == '?')) {
            (_, Some(v)) => out.push_str(&to_literal(v, LiteralOptions::quoted())?),
            (c, None) => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn literal_formatting() {
        let q = LiteralOptions::quoted();
        assert_eq!(to_literal(&"Taro".into(), q).unwrap(), "'Taro'");
        assert_eq!(to_literal(&10001.into(), q).unwrap(), "10001");
        assert_eq!(to_literal(&true.into(), LiteralOptions::default()).unwrap(), "true");
        assert_eq!(to_literal(&"Taro".into(), LiteralOptions::default()).unwrap(), "Taro");
        assert_eq!(to_literal(&Value::Null, q).unwrap(), "nil");
    }

    #[test]
    fn floats_use_shortest_form() {
        let q = LiteralOptions::quoted();
        assert_eq!(to_literal(&1.5f64.into(), q).unwrap(), "1.5");
        assert_eq!(to_literal(&2.0f64.into(), q).unwrap(), "2");
        assert_eq!(to_literal(&0.1f32.into(), q).unwrap(), "0.1");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(to_literal(&"O'Brien".into(), LiteralOptions::quoted()).unwrap(), "'O''Brien'");
    }

    #[test]
    fn time_literals() {
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(to_literal(&t.into(), LiteralOptions::quoted()).unwrap(), "'2020-01-02 15:04:05'");
        let opts = LiteralOptions { quote: true, time_format: Some("DateOnly") };
        assert_eq!(to_literal(&t.into(), opts).unwrap(), "'2020-01-02'");
    }

    #[test]
    fn lists_are_comma_joined() {
        let v = Value::from(vec!["a", "b"]);
        assert_eq!(to_literal(&v, LiteralOptions::quoted()).unwrap(), "'a', 'b'");
        assert_eq!(v.to_arg_string(), "[\"a\" \"b\"]");
    }

    #[test]
    fn placeholders_are_bound_in_order() {
        let values = ("Taro", 3).into_values();
        assert_eq!(bind_placeholders("name = ? AND n > ?", &values).unwrap(), "name = 'Taro' AND n > 3");
        assert_eq!(bind_placeholders("a = ? OR b = ?", &1.into_values()).unwrap(), "a = 1 OR b = ?");
        let literal_with_mark = "what?".into_values();
        assert_eq!(bind_placeholders("q = ?", &literal_with_mark).unwrap(), "q = 'what?'");
    }

    #[test]
    fn argument_form() {
        assert_eq!(Value::from("x").to_arg_string(), "\"x\"");
        assert_eq!(Value::from(10).to_arg_string(), "10");
        assert_eq!(Value::Null.to_arg_string(), "<nil>");
    }
}
