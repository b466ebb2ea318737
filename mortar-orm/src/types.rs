//! # Type Mapping Module
//!
//! Default SQL column types for model-mode `CREATE TABLE`, used when a field's
//! tag carries no `typ=`.
//!
//! | Kind              | MySQL          | PostgreSQL         | SQLite    |
//! |-------------------|----------------|--------------------|-----------|
//! | `String`          | `VARCHAR(255)` | `TEXT`             | `TEXT`    |
//! | `i32`             | `INT`          | `INTEGER`          | `INTEGER` |
//! | `i64`             | `BIGINT`       | `BIGINT`           | `INTEGER` |
//! | `f64`             | `DOUBLE`       | `DOUBLE PRECISION` | `REAL`    |
//! | `bool`            | `BOOLEAN`      | `BOOLEAN`          | `BOOLEAN` |
//! | `DateTime<Utc>`   | `DATETIME`     | `TIMESTAMPTZ`      | `DATETIME`|
//! | `NaiveDate`       | `DATE`         | `DATE`             | `DATE`    |
//! | `Uuid`            | `CHAR(36)`     | `UUID`             | `TEXT`    |

use crate::database::Drivers;
use crate::reflect::Kind;

/// Maps a scalar kind to its default SQL type for a driver.
pub fn sql_type(kind: Kind, driver: Drivers) -> &'static str {
    match driver {
        Drivers::MySQL => match kind {
            Kind::String => "VARCHAR(255)",
            Kind::I8 => "TINYINT",
            Kind::I16 => "SMALLINT",
            Kind::I32 => "INT",
            Kind::I64 | Kind::Isize => "BIGINT",
            Kind::U8 => "TINYINT UNSIGNED",
            Kind::U16 => "SMALLINT UNSIGNED",
            Kind::U32 => "INT UNSIGNED",
            Kind::U64 | Kind::Usize => "BIGINT UNSIGNED",
            Kind::F32 => "FLOAT",
            Kind::F64 => "DOUBLE",
            Kind::Bool => "BOOLEAN",
            Kind::Time | Kind::NaiveDateTime => "DATETIME",
            Kind::NaiveDate => "DATE",
            Kind::Uuid => "CHAR(36)",
            Kind::Value => "TEXT",
        },
        Drivers::Postgres => match kind {
            Kind::String | Kind::Value => "TEXT",
            Kind::I8 | Kind::I16 | Kind::U8 => "SMALLINT",
            Kind::I32 | Kind::U16 => "INTEGER",
            Kind::I64 | Kind::Isize | Kind::U32 => "BIGINT",
            // u64 does not fit BIGINT.
            Kind::U64 | Kind::Usize => "NUMERIC(20)",
            Kind::F32 => "REAL",
            Kind::F64 => "DOUBLE PRECISION",
            Kind::Bool => "BOOLEAN",
            Kind::Time => "TIMESTAMPTZ",
            Kind::NaiveDateTime => "TIMESTAMP",
            Kind::NaiveDate => "DATE",
            Kind::Uuid => "UUID",
        },
        Drivers::SQLite => match kind {
            Kind::String | Kind::Uuid | Kind::Value => "TEXT",
            Kind::I8
            | Kind::I16
            | Kind::I32
            | Kind::I64
            | Kind::Isize
            | Kind::U8
            | Kind::U16
            | Kind::U32
            | Kind::U64
            | Kind::Usize => "INTEGER",
            Kind::F32 | Kind::F64 => "REAL",
            Kind::Bool => "BOOLEAN",
            Kind::Time | Kind::NaiveDateTime => "DATETIME",
            Kind::NaiveDate => "DATE",
        },
    }
}
