//! SELECT statement builder using the typestate pattern.
//!
//! | State        | Reached by            | Next                                                       |
//! |--------------|-----------------------|------------------------------------------------------------|
//! | `HasSelect`  | `select`              | `from`                                                     |
//! | `HasFrom`    | `from`, `on`          | `join`*, `where_clause`, `group_by`, `order_by`, `limit`, `union`, `query` |
//! | `HasJoin`    | `join`*               | `on`                                                       |
//! | `HasWhere`   | `where_clause`, `and`, `or` | `and`, `or`, `group_by`, `order_by`, `limit`, `union`, `query` |
//! | `HasGroupBy` | `group_by`            | `having`, `order_by`, `limit`, `union`, `query`            |
//! | `HasHaving`  | `having`              | `order_by`, `limit`, `union`, `query`                      |
//! | `HasOrderBy` | `order_by`            | `limit`, `union`, `query`                                  |
//! | `HasLimit`   | `limit`               | `offset`, `union`, `query`                                 |
//! | `HasOffset`  | `offset`              | `union`, `query`                                           |
//! | `HasUnion`   | `union`, `union_all`  | `union`, `order_by`, `limit`, `query`                      |

use crate::clause::{Clause, JoinKind};
use crate::database::{Conn, Drivers};
use crate::errors::Result;
use crate::reflect::Reflect;
use crate::value::IntoValues;

use super::{Statement, StatementKind, builder, run_query, strings};

// Typestate markers (zero-sized types)

/// Marker: columns selected, no FROM yet.
pub struct HasSelect;
/// Marker: FROM clause or a join condition was added.
pub struct HasFrom;
/// Marker: a JOIN waiting for its ON condition.
pub struct HasJoin;
/// Marker: WHERE, AND or OR was added.
pub struct HasWhere;
/// Marker: GROUP BY was added.
pub struct HasGroupBy;
/// Marker: HAVING was added.
pub struct HasHaving;
/// Marker: ORDER BY was added.
pub struct HasOrderBy;
/// Marker: LIMIT was added.
pub struct HasLimit;
/// Marker: OFFSET was added.
pub struct HasOffset;
/// Marker: UNION was added.
pub struct HasUnion;

/// States after which `group_by` is legal.
pub trait CanGroupBy {}
/// States after which `order_by` is legal.
pub trait CanOrderBy {}
/// States after which `limit` is legal.
pub trait CanLimit {}
/// States after which `union` is legal.
pub trait CanUnion {}
/// States in which the statement is complete.
pub trait CanQuery {}

macro_rules! allow {
    ($trait:ident: $($state:ty),*) => {
        $(impl $trait for $state {})*
    };
}

allow!(CanGroupBy: HasFrom, HasWhere);
allow!(CanOrderBy: HasFrom, HasWhere, HasGroupBy, HasHaving, HasUnion);
allow!(CanLimit: HasFrom, HasWhere, HasGroupBy, HasHaving, HasOrderBy, HasUnion);
allow!(CanUnion: HasFrom, HasWhere, HasGroupBy, HasHaving, HasOrderBy, HasLimit, HasOffset, HasUnion);
allow!(CanQuery: HasFrom, HasWhere, HasGroupBy, HasHaving, HasOrderBy, HasLimit, HasOffset, HasUnion);

builder!(
    /// A SELECT statement under construction.
    SelectStmt
);

/// Starts a SELECT not bound to any connection, e.g. for mock expectations.
/// An empty column list selects `*`.
pub fn select(columns: &[&str]) -> SelectStmt<'static, HasSelect> {
    SelectStmt::new(columns, Drivers::default(), None)
}

impl<'c> SelectStmt<'c, HasSelect> {
    pub(crate) fn new(columns: &[&str], driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::Select(strings(columns));
        SelectStmt::start(Statement::new(StatementKind::Select, driver, cmd), conn)
    }

    pub fn from(self, tables: &[&str]) -> SelectStmt<'c, HasFrom> {
        self.push(Clause::From(strings(tables)))
    }
}

impl<'c> SelectStmt<'c, HasFrom> {
    /// `INNER JOIN table`
    pub fn join(self, table: &str) -> SelectStmt<'c, HasJoin> {
        self.push(Clause::Join { kind: JoinKind::Inner, table: table.to_string() })
    }

    pub fn left_join(self, table: &str) -> SelectStmt<'c, HasJoin> {
        self.push(Clause::Join { kind: JoinKind::Left, table: table.to_string() })
    }

    pub fn right_join(self, table: &str) -> SelectStmt<'c, HasJoin> {
        self.push(Clause::Join { kind: JoinKind::Right, table: table.to_string() })
    }

    pub fn full_join(self, table: &str) -> SelectStmt<'c, HasJoin> {
        self.push(Clause::Join { kind: JoinKind::Full, table: table.to_string() })
    }

    /// `WHERE expr`, with each `?` replaced by the literal of the matching value.
    pub fn where_clause(self, expr: &str, values: impl IntoValues) -> SelectStmt<'c, HasWhere> {
        self.push(Clause::Where { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c> SelectStmt<'c, HasJoin> {
    pub fn on(self, expr: &str, values: impl IntoValues) -> SelectStmt<'c, HasFrom> {
        self.push(Clause::On { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c> SelectStmt<'c, HasWhere> {
    /// `AND (expr)`
    pub fn and(self, expr: &str, values: impl IntoValues) -> SelectStmt<'c, HasWhere> {
        self.push(Clause::And { expr: expr.to_string(), values: values.into_values() })
    }

    /// `OR (expr)`
    pub fn or(self, expr: &str, values: impl IntoValues) -> SelectStmt<'c, HasWhere> {
        self.push(Clause::Or { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c, S: CanGroupBy> SelectStmt<'c, S> {
    pub fn group_by(self, columns: &[&str]) -> SelectStmt<'c, HasGroupBy> {
        self.push(Clause::GroupBy(strings(columns)))
    }
}

impl<'c> SelectStmt<'c, HasGroupBy> {
    pub fn having(self, expr: &str, values: impl IntoValues) -> SelectStmt<'c, HasHaving> {
        self.push(Clause::Having { expr: expr.to_string(), values: values.into_values() })
    }
}

impl<'c, S: CanOrderBy> SelectStmt<'c, S> {
    /// Each entry may carry a direction, e.g. `"emp_no DESC"`.
    pub fn order_by(self, columns: &[&str]) -> SelectStmt<'c, HasOrderBy> {
        self.push(Clause::OrderBy(strings(columns)))
    }
}

impl<'c, S: CanLimit> SelectStmt<'c, S> {
    pub fn limit(self, n: u64) -> SelectStmt<'c, HasLimit> {
        self.push(Clause::Limit(n))
    }
}

impl<'c> SelectStmt<'c, HasLimit> {
    pub fn offset(self, n: u64) -> SelectStmt<'c, HasOffset> {
        self.push(Clause::Offset(n))
    }
}

impl<'c, S: CanUnion> SelectStmt<'c, S> {
    pub fn union<T: CanQuery>(self, other: SelectStmt<'_, T>) -> SelectStmt<'c, HasUnion> {
        self.push_union(other.stmt, false)
    }

    pub fn union_all<T: CanQuery>(self, other: SelectStmt<'_, T>) -> SelectStmt<'c, HasUnion> {
        self.push_union(other.stmt, true)
    }

    fn push_union(mut self, other: Statement, all: bool) -> SelectStmt<'c, HasUnion> {
        if let Some(err) = other.error() {
            self.stmt.record_error(err.clone());
        }
        self.push(Clause::Union { stmt: Box::new(other), all })
    }
}

impl<S: CanQuery> SelectStmt<'_, S> {
    /// Runs the statement and maps the result into `dest`.
    ///
    /// `dest` may be a scalar, a struct deriving `Model`, a
    /// `HashMap<String, V>` or a `Vec` of any of these.
    pub async fn query<T: Reflect + 'static>(self, dest: &mut T) -> Result<()> {
        run_query(self.stmt, self.conn, dest).await
    }
}

pub(crate) fn render(stmt: &Statement) -> Result<String> {
    let sql = stmt.command().to_sql(stmt.driver())?;
    stmt.render_clauses(sql, |clause| {
        matches!(
            clause,
            Clause::From(_)
                | Clause::Join { .. }
                | Clause::On { .. }
                | Clause::Where { .. }
                | Clause::And { .. }
                | Clause::Or { .. }
                | Clause::GroupBy(_)
                | Clause::Having { .. }
                | Clause::OrderBy(_)
                | Clause::Limit(_)
                | Clause::Offset(_)
                | Clause::Union { .. }
        )
    })
}
