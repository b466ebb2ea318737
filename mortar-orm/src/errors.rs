//! # Error Handling Module
//!
//! This module defines the error type used throughout Mortar ORM.
//!
//! ## Error Kinds
//!
//! - **InvalidValue**: an argument has the wrong shape (e.g. an empty model slice)
//! - **InvalidType**: a type has no conversion for the requested operation
//! - **InvalidSyntax**: a statement cannot be assembled (missing map key, column count mismatch)
//! - **InvalidClause**: a clause was placed in a statement kind that does not render it
//! - **FailedParse**: a raw cell or literal could not be coerced into the target kind
//! - **Database**: wrapped sqlx errors (connection issues, query failures, etc.)
//! - **InvalidMockExpectation**: a mock connection saw an unexpected statement
//!
//! ## Deferred Errors
//!
//! Builder methods never return `Result`. The first error produced while a
//! statement is being chained is stored in the statement and returned by
//! `query`, `exec`, `migrate` and `build_sql`. This is why `Error` is `Clone`:
//! the same stored error can be handed out by every terminal call.
//!
//! ```rust,ignore
//! use mortar_orm::{Conn, Error};
//!
//! match db.insert("employees", &["emp_no"]).model(&bad).exec().await {
//!     Ok(res) => println!("inserted {}", res.rows_affected),
//!     Err(Error::InvalidSyntax(msg)) => eprintln!("cannot build insert: {msg}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

/// Result alias used by every fallible operation in the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Error Enum Definition
// ============================================================================

/// The main error type for Mortar ORM operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// An argument has an unusable value or shape.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A type has no defined conversion for the requested operation.
    ///
    /// The message always names the offending type.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// A statement or model fragment cannot be assembled.
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    /// A clause appeared in a statement kind that cannot render it.
    #[error("{clause} is not supported for {statement} statement")]
    InvalidClause {
        /// Name of the offending clause, e.g. `Where`.
        clause: String,
        /// Statement kind, e.g. `INSERT`.
        statement: String,
    },

    /// Raw text could not be coerced into the target kind.
    #[error("failed to parse {text:?} as {kind}")]
    FailedParse {
        /// The target kind, e.g. `i32` or `time`.
        kind: String,
        /// The offending text.
        text: String,
    },

    /// Database operation error.
    ///
    /// Wraps errors from the underlying sqlx library. The inner error sits
    /// behind an `Arc` so that the enum stays `Clone`; `?` converts a
    /// `sqlx::Error` directly.
    ///
    /// ```rust,ignore
    /// match db.ping().await {
    ///     Err(Error::Database(e)) => eprintln!("database unreachable: {e}"),
    ///     _ => {}
    /// }
    /// ```
    #[error("database error: {0}")]
    Database(Arc<sqlx::Error>),

    /// A mock connection received a call it did not expect, or was completed
    /// with expectations left over.
    #[error("invalid mock expectation: {0}")]
    InvalidMockExpectation(String),
}

// ============================================================================
// Error Conversion Implementations
// ============================================================================

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(Arc::new(err))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

impl Error {
    /// Creates an `InvalidValue` error.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Error::InvalidValue(msg.into())
    }

    /// Creates an `InvalidType` error.
    pub fn invalid_type(msg: impl Into<String>) -> Self {
        Error::InvalidType(msg.into())
    }

    /// Creates an `InvalidSyntax` error.
    pub fn invalid_syntax(msg: impl Into<String>) -> Self {
        Error::InvalidSyntax(msg.into())
    }

    /// Creates an `InvalidClause` error naming the clause and the statement kind.
    pub fn invalid_clause(clause: impl Into<String>, statement: impl Into<String>) -> Self {
        Error::InvalidClause { clause: clause.into(), statement: statement.into() }
    }

    /// Creates a `FailedParse` error naming the target kind and the offending text.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// fn parse_age(text: &str) -> Result<u8, Error> {
    ///     text.parse().map_err(|_| Error::failed_parse("u8", text))
    /// }
    /// ```
    pub fn failed_parse(kind: impl ToString, text: impl Into<String>) -> Self {
        Error::FailedParse { kind: kind.to_string(), text: text.into() }
    }

    /// Creates an `InvalidMockExpectation` error.
    pub fn invalid_mock(msg: impl Into<String>) -> Self {
        Error::InvalidMockExpectation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_clause_names_clause_and_statement() {
        let err = Error::invalid_clause("Where", "INSERT");
        assert_eq!(err.to_string(), "Where is not supported for INSERT statement");
    }

    #[test]
    fn failed_parse_quotes_text() {
        let err = Error::failed_parse("i32", "abc");
        assert_eq!(err.to_string(), "failed to parse \"abc\" as i32");
    }

    #[test]
    fn sqlx_errors_convert_and_clone() {
        let err: Error = sqlx::Error::RowNotFound.into();
        let copy = err.clone();
        assert!(matches!(copy, Error::Database(_)));
    }
}
