//! INSERT statement builder.
//!
//! `insert → values → values* → exec` or `insert → model → exec`.

use std::fmt::Debug;

use crate::clause::{Clause, ModelRepr};
use crate::database::{Conn, Drivers, ExecResult};
use crate::errors::Result;
use crate::model::insert_values;
use crate::reflect::Reflect;
use crate::value::IntoValues;

use super::{Statement, StatementKind, builder, run_exec, strings};

/// Marker: table and columns given.
pub struct HasInsert;
/// Marker: at least one VALUES tuple added.
pub struct HasValues;
/// Marker: rows rendered from a model.
pub struct HasModel;

/// States in which the statement is complete.
pub trait CanExec {}
impl CanExec for HasValues {}
impl CanExec for HasModel {}

builder!(
    /// An INSERT statement under construction.
    InsertStmt
);

/// Starts an INSERT not bound to any connection.
pub fn insert(table: &str, columns: &[&str]) -> InsertStmt<'static, HasInsert> {
    InsertStmt::new(table, columns, Drivers::default(), None)
}

impl<'c> InsertStmt<'c, HasInsert> {
    pub(crate) fn new(table: &str, columns: &[&str], driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::Insert { table: table.to_string(), columns: strings(columns) };
        InsertStmt::start(Statement::new(StatementKind::Insert, driver, cmd), conn)
    }

    /// Renders the rows from a struct, a map, a scalar or a `Vec` of them.
    ///
    /// Struct fields are matched to the insert columns by tag or snake_case
    /// name. A failure is deferred to the terminal call.
    pub fn model<T: Reflect + Debug>(mut self, model: &T) -> InsertStmt<'c, HasModel> {
        let repr = ModelRepr(format!("{model:?}"));
        let columns = match self.stmt.command() {
            Clause::Insert { columns, .. } => columns.clone(),
            _ => Vec::new(),
        };
        let sql = insert_values(model, &columns).unwrap_or_else(|err| {
            self.stmt.record_error(err);
            String::new()
        });
        self.push(Clause::Model { repr, sql })
    }
}

impl<'c, S> InsertStmt<'c, S>
where
    S: ValuesAllowed,
{
    /// One `(v1, v2, ...)` tuple; repeated calls add more rows.
    pub fn values(self, values: impl IntoValues) -> InsertStmt<'c, HasValues> {
        self.push(Clause::Values(values.into_values()))
    }
}

/// States after which `values` is legal.
pub trait ValuesAllowed {}
impl ValuesAllowed for HasInsert {}
impl ValuesAllowed for HasValues {}

impl<S: CanExec> InsertStmt<'_, S> {
    pub async fn exec(self) -> Result<ExecResult> {
        run_exec(self.stmt, self.conn).await
    }
}

pub(crate) fn render(stmt: &Statement) -> Result<String> {
    let mut sql = stmt.command().to_sql(stmt.driver())?;
    let mut in_values = false;
    for clause in stmt.clauses() {
        match clause {
            Clause::Values(_) => {
                sql.push_str(if in_values { ", " } else { " VALUES " });
                sql.push_str(&clause.to_sql(stmt.driver())?);
                in_values = true;
            }
            Clause::Model { sql: fragment, .. } => {
                sql.push(' ');
                sql.push_str(fragment);
                in_values = false;
            }
            other => return Err(stmt.unsupported(other)),
        }
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::Model;
    use crate::errors::Error;

    #[derive(Debug, Default, Model)]
    struct Employee {
        emp_no: i32,
        #[orm("first_name")]
        name: String,
    }

    #[test]
    fn renders_values_rows() {
        let stmt = insert("employees", &["emp_no", "first_name"]).values((1001, "Taro")).values((1002, "Jiro"));
        assert_eq!(
            stmt.build_sql().unwrap(),
            "INSERT INTO employees (emp_no, first_name) VALUES (1001, 'Taro'), (1002, 'Jiro')"
        );
        assert_eq!(
            format!("{stmt:?}"),
            "Insert(\"employees\", \"emp_no\", \"first_name\").Values(1001, \"Taro\").Values(1002, \"Jiro\")"
        );
    }

    #[test]
    fn renders_model_rows() {
        let rows = vec![Employee { emp_no: 1001, name: "Taro".into() }, Employee { emp_no: 1002, name: "Jiro".into() }];
        let stmt = insert("employees", &["emp_no", "first_name"]).model(&rows);
        assert_eq!(
            stmt.build_sql().unwrap(),
            "INSERT INTO employees (emp_no, first_name) VALUES (1001, 'Taro'), (1002, 'Jiro')"
        );
    }

    #[test]
    fn model_errors_are_deferred() {
        let stmt = insert("employees", &["emp_no", "gender"]).model(&Employee::default());
        let err = stmt.build_sql().unwrap_err();
        assert!(matches!(err, Error::InvalidSyntax(_)));
        assert_eq!(stmt.to_string(), err.to_string());
    }

    #[test]
    fn equal_maps_give_equal_statements() {
        const COLUMNS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let row = |scale: i64| -> HashMap<String, i64> {
            COLUMNS.iter().zip(1..).map(|(c, n)| (c.to_string(), n * scale)).collect()
        };

        // Each map gets its own hasher seed, so the Debug text can differ.
        for _ in 0..20 {
            let a = Statement::from(insert("t", &COLUMNS).model(&row(1)));
            let b = Statement::from(insert("t", &COLUMNS).model(&vec![row(1)]));
            let c = Statement::from(insert("t", &COLUMNS).model(&row(1)));
            assert_eq!(a, c);
            assert_eq!(a.build_sql().unwrap(), b.build_sql().unwrap());
        }
        let changed = Statement::from(insert("t", &COLUMNS).model(&row(2)));
        assert_ne!(Statement::from(insert("t", &COLUMNS).model(&row(1))), changed);
    }

    #[test]
    fn rejects_injected_clauses() {
        let mut stmt: Statement = insert("t", &["a"]).values(1).into();
        stmt.push_clause(Clause::Where { expr: "a = 1".into(), values: vec![] });
        assert_eq!(stmt.build_sql().unwrap_err().to_string(), "Where is not supported for INSERT statement");
    }
}
