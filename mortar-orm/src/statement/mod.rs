//! # Statement Module
//!
//! A [`Statement`] is a command clause plus the ordered clauses chained
//! after it. The typed builders ([`SelectStmt`], [`InsertStmt`], ...) wrap a
//! statement with a phantom state parameter, so only the legal next clauses
//! can be called:
//!
//! ```rust,ignore
//! use mortar_orm::{Conn, MockDb};
//!
//! let db = MockDb::default();
//! let stmt = db
//!     .select(&["emp_no", "first_name"])
//!     .from(&["employees"])
//!     .where_clause("emp_no = ?", 10001)
//!     .and("first_name = ? OR first_name = ?", ("Taro", "Jiro"))
//!     .order_by(&["emp_no"])
//!     .limit(10);
//!
//! // .where_clause() after .order_by() would not compile.
//! assert_eq!(
//!     stmt.build_sql()?,
//!     "SELECT emp_no, first_name FROM employees WHERE emp_no = 10001 \
//!      AND (first_name = 'Taro' OR first_name = 'Jiro') ORDER BY emp_no LIMIT 10",
//! );
//! ```
//!
//! ## Deferred Errors
//!
//! Clause methods never fail. The first error hit while chaining (e.g. a
//! model that cannot be rendered) is stored in the statement; every terminal
//! call returns it before doing any I/O, and `Display` prints its message.
//!
//! ## Terminal Calls
//!
//! - `build_sql()` / `to_string()`: render, repeatable
//! - `query(&mut dest)`: SELECT, maps rows into `dest`
//! - `exec()`: INSERT / UPDATE / DELETE
//! - `migrate()`: DDL statements

use std::fmt;

use log::debug;

use crate::clause::Clause;
use crate::database::{Conn, Drivers, ExecResult, QueryOutput};
use crate::errors::{Error, Result};
use crate::reflect::Reflect;
use crate::rows::parse_rows;

pub mod delete;
pub mod insert;
pub mod migration;
pub mod select;
pub mod update;

pub use delete::{DeleteStmt, delete};
pub use insert::{InsertStmt, insert};
pub use migration::{
    AlterTableStmt, CreateIndexStmt, CreateTableStmt, DropIndexStmt, DropTableStmt, alter_table, create_index,
    create_table, create_unique_index, drop_index, drop_table,
};
pub use select::{SelectStmt, select};
pub use update::{UpdateStmt, update};

// ============================================================================
// Statement
// ============================================================================

/// Statement kinds, named the way they appear in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
    AlterTable,
    CreateIndex,
    DropIndex,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::DropTable => "DROP TABLE",
            StatementKind::AlterTable => "ALTER TABLE",
            StatementKind::CreateIndex => "CREATE INDEX",
            StatementKind::DropIndex => "DROP INDEX",
        })
    }
}

/// An accumulated statement.
///
/// Equality is structural: kind, command and clause sequence. The driver and
/// any deferred error are not compared.
#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    driver: Drivers,
    cmd: Clause,
    clauses: Vec<Clause>,
    err: Option<Error>,
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.cmd == other.cmd && self.clauses == other.clauses
    }
}

impl Statement {
    pub(crate) fn new(kind: StatementKind, driver: Drivers, cmd: Clause) -> Self {
        Statement { kind, driver, cmd, clauses: Vec::new(), err: None }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn command(&self) -> &Clause {
        &self.cmd
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The first error recorded while the statement was built.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Appends a clause without any ordering checks.
    ///
    /// The typed builders are the normal way to add clauses; a clause the
    /// statement kind cannot render is reported by [`build_sql`](Self::build_sql).
    pub fn push_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    // First error wins.
    pub(crate) fn record_error(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Renders the statement to SQL text.
    pub fn build_sql(&self) -> Result<String> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        match self.kind {
            StatementKind::Select => select::render(self),
            StatementKind::Insert => insert::render(self),
            StatementKind::Update => update::render(self),
            StatementKind::Delete => delete::render(self),
            StatementKind::CreateTable => migration::render_create_table(self),
            StatementKind::DropTable => migration::render_drop_table(self),
            StatementKind::AlterTable => migration::render_alter_table(self),
            StatementKind::CreateIndex => migration::render_create_index(self),
            StatementKind::DropIndex => migration::render_drop_index(self),
        }
    }

    /// Function-call form of the whole chain, e.g.
    /// `Select("emp_no").From("employees").Limit(1)`.
    pub fn to_func_string(&self) -> String {
        let mut out = self.cmd.to_func_string();
        for clause in &self.clauses {
            out.push('.');
            out.push_str(&clause.to_func_string());
        }
        out
    }

    pub(crate) fn unsupported(&self, clause: &Clause) -> Error {
        Error::invalid_clause(clause.name(), self.kind.to_string())
    }

    // Appends the SQL of every clause accepted by `allowed`, space separated.
    pub(crate) fn render_clauses(&self, mut sql: String, allowed: impl Fn(&Clause) -> bool) -> Result<String> {
        for clause in &self.clauses {
            if !allowed(clause) {
                return Err(self.unsupported(clause));
            }
            sql.push(' ');
            sql.push_str(&clause.to_sql(self.driver)?);
        }
        Ok(sql)
    }
}

/// Renders the SQL, or the deferred error's message.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build_sql() {
            Ok(sql) => f.write_str(&sql),
            Err(err) => write!(f, "{err}"),
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

fn unbound() -> Error {
    Error::invalid_value("statement is not bound to a connection")
}

pub(crate) async fn run_query<T>(stmt: Statement, conn: Option<&dyn Conn>, dest: &mut T) -> Result<()>
where
    T: Reflect + 'static,
{
    if let Some(err) = stmt.err {
        return Err(err);
    }
    let conn = conn.ok_or_else(unbound)?;
    match conn.query(&stmt).await? {
        QueryOutput::Rows(mut rows) => {
            debug!("mapping {} row(s) into {}", rows.len(), T::type_name());
            parse_rows(&mut rows, dest)
        }
        QueryOutput::Canned(canned) => canned.assign(dest),
        QueryOutput::Empty => Ok(()),
    }
}

pub(crate) async fn run_exec(stmt: Statement, conn: Option<&dyn Conn>) -> Result<ExecResult> {
    if let Some(err) = stmt.err {
        return Err(err);
    }
    let conn = conn.ok_or_else(unbound)?;
    conn.exec(&stmt).await
}

// ============================================================================
// Builder Scaffolding
// ============================================================================

/// Declares a typed builder: a [`Statement`], the connection it runs on and
/// a phantom state. Transitions go through `push`, which appends a clause and
/// changes the state.
macro_rules! builder {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[must_use]
        pub struct $name<'c, S> {
            stmt: $crate::statement::Statement,
            conn: Option<&'c dyn $crate::database::Conn>,
            _state: ::std::marker::PhantomData<S>,
        }

        impl<'c, S> $name<'c, S> {
            pub(crate) fn start(
                stmt: $crate::statement::Statement,
                conn: Option<&'c dyn $crate::database::Conn>,
            ) -> Self {
                $name { stmt, conn, _state: ::std::marker::PhantomData }
            }

            fn push<N>(mut self, clause: $crate::clause::Clause) -> $name<'c, N> {
                self.stmt.push_clause(clause);
                $name { stmt: self.stmt, conn: self.conn, _state: ::std::marker::PhantomData }
            }

            /// Renders the statement to SQL text.
            pub fn build_sql(&self) -> $crate::errors::Result<String> {
                self.stmt.build_sql()
            }

            pub fn statement(&self) -> &$crate::statement::Statement {
                &self.stmt
            }
        }

        impl<S> ::std::fmt::Display for $name<'_, S> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.stmt, f)
            }
        }

        impl<S> ::std::fmt::Debug for $name<'_, S> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.stmt.to_func_string())
            }
        }

        impl<S> From<$name<'_, S>> for $crate::statement::Statement {
            fn from(builder: $name<'_, S>) -> Self {
                builder.stmt
            }
        }
    };
}

pub(crate) use builder;

/// Column lists taken by the constructors and clause methods.
pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
