//! # Clause Module
//!
//! One [`Clause`] per SQL fragment a statement accumulates. Each clause
//! knows two renderings:
//!
//! - its SQL fragment ([`Clause::to_sql`]), e.g. `WHERE emp_no = 10001`
//! - its function-call form ([`Clause::to_func_string`]), e.g.
//!   `Where("emp_no = ?", 10001)`, used for debugging and for mock
//!   expectation mismatch messages
//!
//! Clauses whose SQL depends on their neighbours (`Values`, `Set`, the
//! command clauses of DDL statements) are assembled by the statement
//! renderers instead.

use crate::database::Drivers;
use crate::errors::{Error, Result};
use crate::statement::Statement;
use crate::value::{LiteralOptions, Value, bind_placeholders, to_literal};

/// Kind of a `JOIN` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

/// Debug text of a model value, shown in function-call form.
///
/// Equality ignores it: a map model prints its entries in hash order, so two
/// equal maps can print differently. The rendered SQL next to it decides.
#[derive(Debug, Clone)]
pub struct ModelRepr(pub String);

impl PartialEq for ModelRepr {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// One fragment of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    // Commands
    Select(Vec<String>),
    Insert { table: String, columns: Vec<String> },
    Update { table: String, columns: Vec<String> },
    Delete,
    CreateTable(String),
    DropTable(String),
    AlterTable(String),
    CreateIndex { name: String, unique: bool },
    DropIndex(String),

    // Query clauses
    From(Vec<String>),
    Join { kind: JoinKind, table: String },
    On { expr: String, values: Vec<Value> },
    Where { expr: String, values: Vec<Value> },
    And { expr: String, values: Vec<Value> },
    Or { expr: String, values: Vec<Value> },
    GroupBy(Vec<String>),
    Having { expr: String, values: Vec<Value> },
    OrderBy(Vec<String>),
    Limit(u64),
    Offset(u64),
    Union { stmt: Box<Statement>, all: bool },
    Values(Vec<Value>),
    Set(Vec<Value>),
    /// A fragment rendered from a model value when it was attached.
    Model { repr: ModelRepr, sql: String },

    // Migration clauses
    IfNotExists,
    IfExists,
    Column { name: String, typ: String },
    NotNull,
    AutoIncrement,
    Default(Value),
    PrimaryKey { name: String, columns: Vec<String> },
    Unique { name: String, columns: Vec<String> },
    ForeignKey { name: String, columns: Vec<String> },
    References { table: String, columns: Vec<String> },
    Rename(String),
    AddColumn { name: String, typ: String },
    DropColumn(String),
    RenameColumn { from: String, to: String },
    DropPrimaryKey(String),
    DropUnique(String),
    DropForeignKey(String),
    /// `ON table (columns)` of index statements.
    OnTable { table: String, columns: Vec<String> },
}

impl Clause {
    /// Name used in the function-call form and in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Clause::Select(_) => "Select",
            Clause::Insert { .. } => "Insert",
            Clause::Update { .. } => "Update",
            Clause::Delete => "Delete",
            Clause::CreateTable(_) => "CreateTable",
            Clause::DropTable(_) => "DropTable",
            Clause::AlterTable(_) => "AlterTable",
            Clause::CreateIndex { unique: false, .. } => "CreateIndex",
            Clause::CreateIndex { unique: true, .. } => "CreateUniqueIndex",
            Clause::DropIndex(_) => "DropIndex",
            Clause::From(_) => "From",
            Clause::Join { kind: JoinKind::Inner, .. } => "Join",
            Clause::Join { kind: JoinKind::Left, .. } => "LeftJoin",
            Clause::Join { kind: JoinKind::Right, .. } => "RightJoin",
            Clause::Join { kind: JoinKind::Full, .. } => "FullJoin",
            Clause::On { .. } | Clause::OnTable { .. } => "On",
            Clause::Where { .. } => "Where",
            Clause::And { .. } => "And",
            Clause::Or { .. } => "Or",
            Clause::GroupBy(_) => "GroupBy",
            Clause::Having { .. } => "Having",
            Clause::OrderBy(_) => "OrderBy",
            Clause::Limit(_) => "Limit",
            Clause::Offset(_) => "Offset",
            Clause::Union { all: false, .. } => "Union",
            Clause::Union { all: true, .. } => "UnionAll",
            Clause::Values(_) => "Values",
            Clause::Set(_) => "Set",
            Clause::Model { .. } => "Model",
            Clause::IfNotExists => "IfNotExists",
            Clause::IfExists => "IfExists",
            Clause::Column { .. } => "Column",
            Clause::NotNull => "NotNull",
            Clause::AutoIncrement => "AutoIncrement",
            Clause::Default(_) => "Default",
            Clause::PrimaryKey { .. } => "PrimaryKey",
            Clause::Unique { .. } => "Unique",
            Clause::ForeignKey { .. } => "ForeignKey",
            Clause::References { .. } => "References",
            Clause::Rename(_) => "Rename",
            Clause::AddColumn { .. } => "AddColumn",
            Clause::DropColumn(_) => "DropColumn",
            Clause::RenameColumn { .. } => "RenameColumn",
            Clause::DropPrimaryKey(_) => "DropPrimaryKey",
            Clause::DropUnique(_) => "DropUnique",
            Clause::DropForeignKey(_) => "DropForeignKey",
        }
    }

    /// Function-call form, e.g. `Where("emp_no = ?", 10001)`.
    pub fn to_func_string(&self) -> String {
        let args: Vec<String> = match self {
            Clause::Delete
            | Clause::IfNotExists
            | Clause::IfExists
            | Clause::NotNull
            | Clause::AutoIncrement => Vec::new(),
            Clause::Select(items) | Clause::From(items) | Clause::GroupBy(items) | Clause::OrderBy(items) => {
                quoted(items)
            }
            Clause::Insert { table, columns } | Clause::Update { table, columns } => {
                let mut args = vec![format!("{table:?}")];
                args.extend(quoted(columns));
                args
            }
            Clause::CreateTable(name)
            | Clause::DropTable(name)
            | Clause::AlterTable(name)
            | Clause::CreateIndex { name, .. }
            | Clause::DropIndex(name)
            | Clause::Rename(name)
            | Clause::DropColumn(name)
            | Clause::DropPrimaryKey(name)
            | Clause::DropUnique(name)
            | Clause::DropForeignKey(name)
            | Clause::Join { table: name, .. } => vec![format!("{name:?}")],
            Clause::On { expr, values }
            | Clause::Where { expr, values }
            | Clause::And { expr, values }
            | Clause::Or { expr, values }
            | Clause::Having { expr, values } => {
                let mut args = vec![format!("{expr:?}")];
                args.extend(values.iter().map(Value::to_arg_string));
                args
            }
            Clause::Limit(n) | Clause::Offset(n) => vec![n.to_string()],
            Clause::Union { stmt, .. } => vec![stmt.to_func_string()],
            Clause::Values(values) | Clause::Set(values) => values.iter().map(Value::to_arg_string).collect(),
            Clause::Model { repr, .. } => vec![repr.0.clone()],
            Clause::Default(value) => vec![value.to_arg_string()],
            Clause::Column { name, typ } | Clause::AddColumn { name, typ } => {
                vec![format!("{name:?}"), format!("{typ:?}")]
            }
            Clause::PrimaryKey { name, columns }
            | Clause::Unique { name, columns }
            | Clause::ForeignKey { name, columns }
            | Clause::References { table: name, columns }
            | Clause::OnTable { table: name, columns } => {
                let mut args = vec![format!("{name:?}")];
                args.extend(quoted(columns));
                args
            }
            Clause::RenameColumn { from, to } => vec![format!("{from:?}"), format!("{to:?}")],
        };
        format!("{}({})", self.name(), args.join(", "))
    }

    /// SQL fragment of a self-contained clause.
    ///
    /// Fails with `InvalidSyntax` for clauses that only the statement
    /// renderers can place.
    pub fn to_sql(&self, driver: Drivers) -> Result<String> {
        let sql = match self {
            Clause::Select(columns) if columns.is_empty() => "SELECT *".to_string(),
            Clause::Select(columns) => format!("SELECT {}", identifiers(columns)),
            Clause::Insert { table, columns } if columns.is_empty() => format!("INSERT INTO {table}"),
            Clause::Insert { table, columns } => format!("INSERT INTO {table} ({})", columns.join(", ")),
            Clause::Update { table, .. } => format!("UPDATE {table}"),
            Clause::Delete => "DELETE".to_string(),
            Clause::From(tables) => format!("FROM {}", identifiers(tables)),
            Clause::Join { kind, table } => {
                let keyword = match kind {
                    JoinKind::Inner => "INNER JOIN",
                    JoinKind::Left => "LEFT JOIN",
                    JoinKind::Right => "RIGHT JOIN",
                    JoinKind::Full => "FULL OUTER JOIN",
                };
                format!("{keyword} {}", normalize_alias(table))
            }
            Clause::On { expr, values } => format!("ON {}", bind_placeholders(expr, values)?),
            Clause::Where { expr, values } => format!("WHERE {}", bind_placeholders(expr, values)?),
            Clause::And { expr, values } => format!("AND ({})", bind_placeholders(expr, values)?),
            Clause::Or { expr, values } => format!("OR ({})", bind_placeholders(expr, values)?),
            Clause::GroupBy(columns) => format!("GROUP BY {}", columns.join(", ")),
            Clause::Having { expr, values } => format!("HAVING {}", bind_placeholders(expr, values)?),
            Clause::OrderBy(columns) => format!("ORDER BY {}", columns.join(", ")),
            Clause::Limit(n) => format!("LIMIT {n}"),
            Clause::Offset(n) => format!("OFFSET {n}"),
            Clause::Union { stmt, all } => {
                let keyword = if *all { "UNION ALL" } else { "UNION" };
                format!("{keyword} {}", stmt.build_sql()?)
            }
            Clause::Values(values) => format!("({})", literals(values)?),
            Clause::Model { sql, .. } => sql.clone(),
            Clause::IfNotExists => "IF NOT EXISTS".to_string(),
            Clause::IfExists => "IF EXISTS".to_string(),
            Clause::Column { name, typ } => format!("{name} {typ}"),
            Clause::NotNull => "NOT NULL".to_string(),
            Clause::AutoIncrement => match driver {
                Drivers::MySQL => "AUTO_INCREMENT",
                Drivers::Postgres => "GENERATED BY DEFAULT AS IDENTITY",
                Drivers::SQLite => "AUTOINCREMENT",
            }
            .to_string(),
            Clause::Default(value) => format!("DEFAULT {}", to_literal(value, LiteralOptions::quoted())?),
            Clause::PrimaryKey { name, columns } => {
                format!("CONSTRAINT {name} PRIMARY KEY ({})", columns.join(", "))
            }
            Clause::Unique { name, columns } => format!("CONSTRAINT {name} UNIQUE ({})", columns.join(", ")),
            Clause::ForeignKey { name, columns } => {
                format!("CONSTRAINT {name} FOREIGN KEY ({})", columns.join(", "))
            }
            Clause::References { table, columns } => format!("REFERENCES {table}({})", columns.join(", ")),
            Clause::Rename(name) => format!("RENAME TO {name}"),
            Clause::AddColumn { name, typ } => format!("ADD COLUMN {name} {typ}"),
            Clause::DropColumn(name) => format!("DROP COLUMN {name}"),
            Clause::RenameColumn { from, to } => format!("RENAME COLUMN {from} TO {to}"),
            Clause::DropPrimaryKey(name) => match driver {
                Drivers::MySQL => "DROP PRIMARY KEY".to_string(),
                _ => format!("DROP CONSTRAINT {name}"),
            },
            Clause::DropUnique(name) => match driver {
                Drivers::MySQL => format!("DROP INDEX {name}"),
                _ => format!("DROP CONSTRAINT {name}"),
            },
            Clause::DropForeignKey(name) => match driver {
                Drivers::MySQL => format!("DROP FOREIGN KEY {name}"),
                _ => format!("DROP CONSTRAINT {name}"),
            },
            Clause::OnTable { table, columns } if columns.is_empty() => format!("ON {table}"),
            Clause::OnTable { table, columns } => format!("ON {table} ({})", columns.join(", ")),
            Clause::CreateTable(_)
            | Clause::DropTable(_)
            | Clause::AlterTable(_)
            | Clause::CreateIndex { .. }
            | Clause::DropIndex(_)
            | Clause::Set(_) => {
                return Err(Error::invalid_syntax(format!("{} cannot be rendered on its own", self.name())));
            }
        };
        Ok(sql)
    }
}

/// Upcases a lowercase ` as ` alias keyword.
pub fn normalize_alias(identifier: &str) -> String {
    identifier.replace(" as ", " AS ")
}

fn identifiers(items: &[String]) -> String {
    items.iter().map(|s| normalize_alias(s)).collect::<Vec<_>>().join(", ")
}

fn quoted(items: &[String]) -> Vec<String> {
    items.iter().map(|s| format!("{s:?}")).collect()
}

pub(crate) fn literals(values: &[Value]) -> Result<String> {
    let items = values.iter().map(|v| to_literal(v, LiteralOptions::quoted())).collect::<Result<Vec<_>>>()?;
    Ok(items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IntoValues;

    fn where_(expr: &str, values: impl IntoValues) -> Clause {
        Clause::Where { expr: expr.to_string(), values: values.into_values() }
    }

    #[test]
    fn function_call_forms() {
        assert_eq!(where_("col = ?", 10).to_func_string(), "Where(\"col = ?\", 10)");
        assert_eq!(
            Clause::Select(vec!["col1".into(), "col2".into()]).to_func_string(),
            "Select(\"col1\", \"col2\")"
        );
        assert_eq!(Clause::Limit(5).to_func_string(), "Limit(5)");
        assert_eq!(Clause::NotNull.to_func_string(), "NotNull()");
        assert_eq!(
            Clause::Join { kind: JoinKind::Left, table: "dept".into() }.to_func_string(),
            "LeftJoin(\"dept\")"
        );
        let list = where_("id IN (?)", (vec![1, 2],));
        assert_eq!(list.to_func_string(), "Where(\"id IN (?)\", [1 2])");
    }

    #[test]
    fn and_or_are_parenthesized() {
        let and = Clause::And { expr: "b = ? OR c = ?".into(), values: (2, 3).into_values() };
        assert_eq!(and.to_sql(Drivers::MySQL).unwrap(), "AND (b = 2 OR c = 3)");
        assert_eq!(where_("a = ?", 1).to_sql(Drivers::MySQL).unwrap(), "WHERE a = 1");
    }

    #[test]
    fn aliases_are_upcased() {
        let select = Clause::Select(vec!["e.emp_no as no".into()]);
        assert_eq!(select.to_sql(Drivers::MySQL).unwrap(), "SELECT e.emp_no AS no");
        let from = Clause::From(vec!["employees as e".into()]);
        assert_eq!(from.to_sql(Drivers::MySQL).unwrap(), "FROM employees AS e");
    }

    #[test]
    fn dialect_dependent_clauses() {
        assert_eq!(Clause::AutoIncrement.to_sql(Drivers::MySQL).unwrap(), "AUTO_INCREMENT");
        assert_eq!(
            Clause::AutoIncrement.to_sql(Drivers::Postgres).unwrap(),
            "GENERATED BY DEFAULT AS IDENTITY"
        );
        let drop = Clause::DropForeignKey("fk_emp".into());
        assert_eq!(drop.to_sql(Drivers::MySQL).unwrap(), "DROP FOREIGN KEY fk_emp");
        assert_eq!(drop.to_sql(Drivers::Postgres).unwrap(), "DROP CONSTRAINT fk_emp");
    }

    #[test]
    fn context_dependent_clauses_need_a_statement() {
        assert!(Clause::Set(vec![]).to_sql(Drivers::MySQL).is_err());
        assert!(Clause::CreateTable("t".into()).to_sql(Drivers::MySQL).is_err());
    }
}
