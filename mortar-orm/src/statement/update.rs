//! UPDATE statement builder.
//!
//! `update → set | model → where_clause → and | or → exec`; `exec` is also
//! legal right after `set` or `model`.

use std::fmt::Debug;

use crate::clause::{Clause, ModelRepr};
use crate::database::{Conn, Drivers, ExecResult};
use crate::errors::{Error, Result};
use crate::model::update_set;
use crate::reflect::Reflect;
use crate::value::{IntoValues, LiteralOptions, to_literal};

use super::{Statement, StatementKind, builder, run_exec, strings};

/// Marker: table and columns given.
pub struct HasUpdate;
/// Marker: new values given by `set` or `model`.
pub struct HasSet;
/// Marker: WHERE, AND or OR was added.
pub struct HasWhere;

/// States in which the statement is complete.
pub trait CanExec {}
impl CanExec for HasSet {}
impl CanExec for HasWhere {}

builder!(
    /// An UPDATE statement under construction.
    UpdateStmt
);

/// Starts an UPDATE not bound to any connection.
pub fn update(table: &str, columns: &[&str]) -> UpdateStmt<'static, HasUpdate> {
    UpdateStmt::new(table, columns, Drivers::default(), None)
}

impl<'c> UpdateStmt<'c, HasUpdate> {
    pub(crate) fn new(table: &str, columns: &[&str], driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::Update { table: table.to_string(), columns: strings(columns) };
        UpdateStmt::start(Statement::new(StatementKind::Update, driver, cmd), conn)
    }

    /// New values, paired in order with the update columns.
    pub fn set(self, values: impl IntoValues) -> UpdateStmt<'c, HasSet> {
        self.push(Clause::Set(values.into_values()))
    }

    /// Takes the new values from a struct or map.
    pub fn model<T: Reflect + Debug>(mut self, model: &T) -> UpdateStmt<'c, HasSet> {
        let repr = ModelRepr(format!("{model:?}"));
        let rendered = update_set(model, columns(&self.stmt));
        let sql = rendered.unwrap_or_else(|err| {
            self.stmt.record_error(err);
            String::new()
        });
        self.push(Clause::Model { repr, sql })
    }
}

impl<'c> UpdateStmt<'c, HasSet> {
    pub fn where_clause(self, expr: &str, values: impl IntoValues) -> UpdateStmt<'c, HasWhere> {
        self.push(Clause::Where { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c> UpdateStmt<'c, HasWhere> {
    pub fn and(self, expr: &str, values: impl IntoValues) -> UpdateStmt<'c, HasWhere> {
        self.push(Clause::And { expr: expr.to_string(), values: values.into_values() })
    }

    pub fn or(self, expr: &str, values: impl IntoValues) -> UpdateStmt<'c, HasWhere> {
        self.push(Clause::Or { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<S: CanExec> UpdateStmt<'_, S> {
    pub async fn exec(self) -> Result<ExecResult> {
        run_exec(self.stmt, self.conn).await
    }
}

fn columns(stmt: &Statement) -> &[String] {
    match stmt.command() {
        Clause::Update { columns, .. } => columns,
        _ => &[],
    }
}

pub(crate) fn render(stmt: &Statement) -> Result<String> {
    let mut sql = stmt.command().to_sql(stmt.driver())?;
    for clause in stmt.clauses() {
        sql.push(' ');
        match clause {
            Clause::Set(values) => sql.push_str(&set_pairs(columns(stmt), values)?),
            Clause::Model { sql: fragment, .. } => sql.push_str(fragment),
            Clause::Where { .. } | Clause::And { .. } | Clause::Or { .. } => {
                sql.push_str(&clause.to_sql(stmt.driver())?)
            }
            other => return Err(stmt.unsupported(other)),
        }
    }
    Ok(sql)
}

fn set_pairs(columns: &[String], values: &[crate::value::Value]) -> Result<String> {
    if columns.len() != values.len() {
        return Err(Error::invalid_syntax(format!(
            "{} update columns but {} values",
            columns.len(),
            values.len()
        )));
    }
    let pairs = columns
        .iter()
        .zip(values)
        .map(|(column, value)| Ok(format!("{column} = {}", to_literal(value, LiteralOptions::quoted())?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("SET {}", pairs.join(", ")))
}
