//! DELETE statement builder: `delete → from → where_clause → and | or → exec`.

use crate::clause::Clause;
use crate::database::{Conn, Drivers, ExecResult};
use crate::errors::Result;
use crate::value::IntoValues;

use super::{Statement, StatementKind, builder, run_exec, strings};

/// Marker: nothing but the command yet.
pub struct HasDelete;
/// Marker: FROM clause was added.
pub struct HasFrom;
/// Marker: WHERE, AND or OR was added.
pub struct HasWhere;

/// States in which the statement is complete.
pub trait CanExec {}
impl CanExec for HasFrom {}
impl CanExec for HasWhere {}

builder!(
    /// A DELETE statement under construction.
    DeleteStmt
);

/// Starts a DELETE not bound to any connection.
pub fn delete() -> DeleteStmt<'static, HasDelete> {
    DeleteStmt::new(Drivers::default(), None)
}

impl<'c> DeleteStmt<'c, HasDelete> {
    pub(crate) fn new(driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        DeleteStmt::start(Statement::new(StatementKind::Delete, driver, Clause::Delete), conn)
    }

    pub fn from(self, tables: &[&str]) -> DeleteStmt<'c, HasFrom> {
        self.push(Clause::From(strings(tables)))
    }
}

impl<'c> DeleteStmt<'c, HasFrom> {
    pub fn where_clause(self, expr: &str, values: impl IntoValues) -> DeleteStmt<'c, HasWhere> {
        self.push(Clause::Where { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c> DeleteStmt<'c, HasWhere> {
    pub fn and(self, expr: &str, values: impl IntoValues) -> DeleteStmt<'c, HasWhere> {
        self.push(Clause::And { expr: expr.to_string(), values: values.into_values() })
    }

    pub fn or(self, expr: &str, values: impl IntoValues) -> DeleteStmt<'c, HasWhere> {
        self.push(Clause::Or { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<S: CanExec> DeleteStmt<'_, S> {
    pub async fn exec(self) -> Result<ExecResult> {
        run_exec(self.stmt, self.conn).await
    }
}

pub(crate) fn render(stmt: &Statement) -> Result<String> {
    let sql = stmt.command().to_sql(stmt.driver())?;
    stmt.render_clauses(sql, |clause| {
        matches!(clause, Clause::From(_) | Clause::Where { .. } | Clause::And { .. } | Clause::Or { .. })
    })
}
