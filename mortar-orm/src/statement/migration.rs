//! Schema statements: CREATE TABLE, DROP TABLE, ALTER TABLE, CREATE INDEX and
//! DROP INDEX. All of them end in `migrate()`.

use crate::clause::{Clause, ModelRepr};
use crate::database::{Conn, Drivers, ExecResult};
use crate::errors::{Error, Result};
use crate::model::create_table_body;
use crate::reflect::Reflect;
use crate::value::Value;

use super::{Statement, StatementKind, builder, run_exec, strings};

/// Marker: the command alone.
pub struct HasCommand;
/// Marker: IF NOT EXISTS / IF EXISTS was added.
pub struct HasIfExists;
/// Marker: a column definition is open for options.
pub struct HasColumn;
/// Marker: a table constraint was added.
pub struct HasConstraint;
/// Marker: a FOREIGN KEY waits for its REFERENCES.
pub struct HasForeignKey;
/// Marker: the table body was generated from a model.
pub struct HasModel;
/// Marker: ALTER TABLE ADD COLUMN is open for options.
pub struct HasAddColumn;
/// Marker: the single ALTER TABLE operation is complete.
pub struct HasOperation;
/// Marker: ON table was added to an index statement.
pub struct HasOn;

/// States in which `migrate` is legal.
pub trait CanMigrate {}

macro_rules! allow {
    ($tr:ident: $($state:ty),+) => {
        $(impl $tr for $state {})+
    };
}

allow!(CanMigrate: HasColumn, HasConstraint, HasModel, HasAddColumn, HasOperation, HasOn);

/// States in which a new column definition may start.
pub trait CanAddColumn {}
allow!(CanAddColumn: HasCommand, HasIfExists, HasColumn);

/// States in which a table constraint may be added.
pub trait CanConstrain {}
allow!(CanConstrain: HasColumn, HasConstraint);

/// States in which the body may come from a model.
pub trait CanModel {}
allow!(CanModel: HasCommand, HasIfExists);

async fn migrate(stmt: Statement, conn: Option<&dyn Conn>) -> Result<ExecResult> {
    run_exec(stmt, conn).await
}

// ============================================================================
// CREATE TABLE
// ============================================================================

builder!(
    /// A CREATE TABLE statement under construction.
    CreateTableStmt
);

/// Starts a CREATE TABLE not bound to any connection.
pub fn create_table(table: &str) -> CreateTableStmt<'static, HasCommand> {
    CreateTableStmt::new(table, Drivers::default(), None)
}

impl<'c> CreateTableStmt<'c, HasCommand> {
    pub(crate) fn new(table: &str, driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::CreateTable(table.to_string());
        CreateTableStmt::start(Statement::new(StatementKind::CreateTable, driver, cmd), conn)
    }

    pub fn if_not_exists(self) -> CreateTableStmt<'c, HasIfExists> {
        self.push(Clause::IfNotExists)
    }
}

impl<'c, S: CanAddColumn> CreateTableStmt<'c, S> {
    pub fn column(self, name: &str, typ: &str) -> CreateTableStmt<'c, HasColumn> {
        self.push(Clause::Column { name: name.to_string(), typ: typ.to_string() })
    }
}

impl<'c, S: CanModel> CreateTableStmt<'c, S> {
    /// Generates column definitions and constraints from the fields of `T`,
    /// with SQL types for the statement's driver unless a tag gives `typ`.
    pub fn model<T: Reflect>(mut self) -> CreateTableStmt<'c, HasModel> {
        let repr = ModelRepr(T::type_name().to_string());
        let sql = create_table_body::<T>(self.stmt.driver()).unwrap_or_else(|err| {
            self.stmt.record_error(err);
            String::new()
        });
        self.push(Clause::Model { repr, sql })
    }
}

impl<'c> CreateTableStmt<'c, HasColumn> {
    pub fn not_null(self) -> Self {
        self.push(Clause::NotNull)
    }

    pub fn auto_increment(self) -> Self {
        self.push(Clause::AutoIncrement)
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        self.push(Clause::Default(value.into()))
    }
}

impl<'c, S: CanConstrain> CreateTableStmt<'c, S> {
    pub fn primary_key(self, name: &str, columns: &[&str]) -> CreateTableStmt<'c, HasConstraint> {
        self.push(Clause::PrimaryKey { name: name.to_string(), columns: strings(columns) })
    }

    pub fn unique(self, name: &str, columns: &[&str]) -> CreateTableStmt<'c, HasConstraint> {
        self.push(Clause::Unique { name: name.to_string(), columns: strings(columns) })
    }

    pub fn foreign_key(self, name: &str, columns: &[&str]) -> CreateTableStmt<'c, HasForeignKey> {
        self.push(Clause::ForeignKey { name: name.to_string(), columns: strings(columns) })
    }
}

impl<'c> CreateTableStmt<'c, HasForeignKey> {
    pub fn references(self, table: &str, columns: &[&str]) -> CreateTableStmt<'c, HasConstraint> {
        self.push(Clause::References { table: table.to_string(), columns: strings(columns) })
    }
}

impl<S: CanMigrate> CreateTableStmt<'_, S> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

pub(crate) fn render_create_table(stmt: &Statement) -> Result<String> {
    let Clause::CreateTable(table) = stmt.command() else {
        return Err(stmt.unsupported(stmt.command()));
    };
    let driver = stmt.driver();
    let mut head = String::from("CREATE TABLE");
    let mut defs: Vec<String> = Vec::new();
    let mut body: Option<&str> = None;

    for clause in stmt.clauses() {
        match clause {
            Clause::IfNotExists if defs.is_empty() && body.is_none() => head.push_str(" IF NOT EXISTS"),
            Clause::Column { .. } | Clause::PrimaryKey { .. } | Clause::Unique { .. } | Clause::ForeignKey { .. }
                if body.is_none() =>
            {
                defs.push(clause.to_sql(driver)?)
            }
            // Options extend the definition opened before them.
            Clause::NotNull | Clause::AutoIncrement | Clause::Default(_) | Clause::References { .. } => {
                let def = defs.last_mut().ok_or_else(|| stmt.unsupported(clause))?;
                def.push(' ');
                def.push_str(&clause.to_sql(driver)?);
            }
            Clause::Model { sql, .. } if defs.is_empty() && body.is_none() => body = Some(sql.as_str()),
            other => return Err(stmt.unsupported(other)),
        }
    }

    match body {
        Some(body) => Ok(format!("{head} {table} {body}")),
        None if defs.is_empty() => Err(Error::invalid_syntax(format!("table {table} has no columns"))),
        None => Ok(format!("{head} {table} ({})", defs.join(", "))),
    }
}

// ============================================================================
// DROP TABLE
// ============================================================================

builder!(
    /// A DROP TABLE statement under construction.
    DropTableStmt
);

/// Starts a DROP TABLE not bound to any connection.
pub fn drop_table(table: &str) -> DropTableStmt<'static, HasOperation> {
    DropTableStmt::new(table, Drivers::default(), None)
}

impl<'c> DropTableStmt<'c, HasOperation> {
    pub(crate) fn new(table: &str, driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::DropTable(table.to_string());
        DropTableStmt::start(Statement::new(StatementKind::DropTable, driver, cmd), conn)
    }

    pub fn if_exists(self) -> DropTableStmt<'c, HasIfExists> {
        self.push(Clause::IfExists)
    }
}

impl DropTableStmt<'_, HasIfExists> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

impl DropTableStmt<'_, HasOperation> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

pub(crate) fn render_drop_table(stmt: &Statement) -> Result<String> {
    let Clause::DropTable(table) = stmt.command() else {
        return Err(stmt.unsupported(stmt.command()));
    };
    match stmt.clauses() {
        [] => Ok(format!("DROP TABLE {table}")),
        [Clause::IfExists] => Ok(format!("DROP TABLE IF EXISTS {table}")),
        [Clause::IfExists, other, ..] | [other, ..] => Err(stmt.unsupported(other)),
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

builder!(
    /// An ALTER TABLE statement carrying a single operation.
    AlterTableStmt
);

/// Starts an ALTER TABLE not bound to any connection.
pub fn alter_table(table: &str) -> AlterTableStmt<'static, HasCommand> {
    AlterTableStmt::new(table, Drivers::default(), None)
}

impl<'c> AlterTableStmt<'c, HasCommand> {
    pub(crate) fn new(table: &str, driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::AlterTable(table.to_string());
        AlterTableStmt::start(Statement::new(StatementKind::AlterTable, driver, cmd), conn)
    }

    pub fn rename(self, to: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::Rename(to.to_string()))
    }

    pub fn add_column(self, name: &str, typ: &str) -> AlterTableStmt<'c, HasAddColumn> {
        self.push(Clause::AddColumn { name: name.to_string(), typ: typ.to_string() })
    }

    pub fn drop_column(self, name: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::DropColumn(name.to_string()))
    }

    pub fn rename_column(self, from: &str, to: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::RenameColumn { from: from.to_string(), to: to.to_string() })
    }

    pub fn add_primary_key(self, name: &str, columns: &[&str]) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::PrimaryKey { name: name.to_string(), columns: strings(columns) })
    }

    pub fn add_unique(self, name: &str, columns: &[&str]) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::Unique { name: name.to_string(), columns: strings(columns) })
    }

    pub fn add_foreign_key(self, name: &str, columns: &[&str]) -> AlterTableStmt<'c, HasForeignKey> {
        self.push(Clause::ForeignKey { name: name.to_string(), columns: strings(columns) })
    }

    /// MySQL ignores the name and drops the table's primary key.
    pub fn drop_primary_key(self, name: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::DropPrimaryKey(name.to_string()))
    }

    pub fn drop_unique(self, name: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::DropUnique(name.to_string()))
    }

    pub fn drop_foreign_key(self, name: &str) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::DropForeignKey(name.to_string()))
    }
}

impl AlterTableStmt<'_, HasAddColumn> {
    pub fn not_null(self) -> Self {
        self.push(Clause::NotNull)
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        self.push(Clause::Default(value.into()))
    }
}

impl<'c> AlterTableStmt<'c, HasForeignKey> {
    pub fn references(self, table: &str, columns: &[&str]) -> AlterTableStmt<'c, HasOperation> {
        self.push(Clause::References { table: table.to_string(), columns: strings(columns) })
    }
}

impl<S: CanMigrate> AlterTableStmt<'_, S> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

pub(crate) fn render_alter_table(stmt: &Statement) -> Result<String> {
    let Clause::AlterTable(table) = stmt.command() else {
        return Err(stmt.unsupported(stmt.command()));
    };
    let driver = stmt.driver();
    let mut sql = format!("ALTER TABLE {table}");
    let mut operations = 0;

    for clause in stmt.clauses() {
        match clause {
            Clause::Rename(_)
            | Clause::AddColumn { .. }
            | Clause::DropColumn(_)
            | Clause::RenameColumn { .. }
            | Clause::DropPrimaryKey(_)
            | Clause::DropUnique(_)
            | Clause::DropForeignKey(_)
                if operations == 0 =>
            {
                sql.push(' ');
                operations += 1;
            }
            Clause::PrimaryKey { .. } | Clause::Unique { .. } | Clause::ForeignKey { .. } if operations == 0 => {
                sql.push_str(" ADD ");
                operations += 1;
            }
            Clause::NotNull | Clause::Default(_) | Clause::References { .. } if operations == 1 => sql.push(' '),
            other => return Err(stmt.unsupported(other)),
        }
        sql.push_str(&clause.to_sql(driver)?);
    }

    if operations == 0 {
        return Err(Error::invalid_syntax(format!("no operation given to alter table {table}")));
    }
    Ok(sql)
}

// ============================================================================
// CREATE INDEX / DROP INDEX
// ============================================================================

builder!(
    /// A CREATE [UNIQUE] INDEX statement under construction.
    CreateIndexStmt
);

/// Starts a CREATE INDEX not bound to any connection.
pub fn create_index(name: &str) -> CreateIndexStmt<'static, HasCommand> {
    CreateIndexStmt::new(name, false, Drivers::default(), None)
}

/// Starts a CREATE UNIQUE INDEX not bound to any connection.
pub fn create_unique_index(name: &str) -> CreateIndexStmt<'static, HasCommand> {
    CreateIndexStmt::new(name, true, Drivers::default(), None)
}

impl<'c> CreateIndexStmt<'c, HasCommand> {
    pub(crate) fn new(name: &str, unique: bool, driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::CreateIndex { name: name.to_string(), unique };
        CreateIndexStmt::start(Statement::new(StatementKind::CreateIndex, driver, cmd), conn)
    }

    pub fn on(self, table: &str, columns: &[&str]) -> CreateIndexStmt<'c, HasOn> {
        self.push(Clause::OnTable { table: table.to_string(), columns: strings(columns) })
    }
}

impl CreateIndexStmt<'_, HasOn> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

pub(crate) fn render_create_index(stmt: &Statement) -> Result<String> {
    let Clause::CreateIndex { name, unique } = stmt.command() else {
        return Err(stmt.unsupported(stmt.command()));
    };
    let keyword = if *unique { "CREATE UNIQUE INDEX" } else { "CREATE INDEX" };
    match stmt.clauses() {
        [on @ Clause::OnTable { columns, .. }] if !columns.is_empty() => {
            Ok(format!("{keyword} {name} {}", on.to_sql(stmt.driver())?))
        }
        [Clause::OnTable { table, .. }] => {
            Err(Error::invalid_syntax(format!("index {name} on {table} has no columns")))
        }
        [] => Err(Error::invalid_syntax(format!("index {name} has no table"))),
        [Clause::OnTable { .. }, other, ..] | [other, ..] => Err(stmt.unsupported(other)),
    }
}

builder!(
    /// A DROP INDEX statement under construction.
    DropIndexStmt
);

/// Starts a DROP INDEX not bound to any connection.
pub fn drop_index(name: &str) -> DropIndexStmt<'static, HasOperation> {
    DropIndexStmt::new(name, Drivers::default(), None)
}

impl<'c> DropIndexStmt<'c, HasOperation> {
    pub(crate) fn new(name: &str, driver: Drivers, conn: Option<&'c dyn Conn>) -> Self {
        let cmd = Clause::DropIndex(name.to_string());
        DropIndexStmt::start(Statement::new(StatementKind::DropIndex, driver, cmd), conn)
    }

    /// Table owning the index. Required by MySQL.
    pub fn on(self, table: &str) -> DropIndexStmt<'c, HasOn> {
        self.push(Clause::OnTable { table: table.to_string(), columns: Vec::new() })
    }
}

impl<S: CanMigrate> DropIndexStmt<'_, S> {
    pub async fn migrate(self) -> Result<ExecResult> {
        migrate(self.stmt, self.conn).await
    }
}

pub(crate) fn render_drop_index(stmt: &Statement) -> Result<String> {
    let Clause::DropIndex(name) = stmt.command() else {
        return Err(stmt.unsupported(stmt.command()));
    };
    match stmt.clauses() {
        [] if stmt.driver() == Drivers::MySQL => {
            Err(Error::invalid_syntax(format!("MySQL needs the table of index {name}")))
        }
        [] => Ok(format!("DROP INDEX {name}")),
        [on @ Clause::OnTable { columns, .. }] if columns.is_empty() => {
            Ok(format!("DROP INDEX {name} {}", on.to_sql(stmt.driver())?))
        }
        [Clause::OnTable { .. }] => {
            Err(Error::invalid_syntax(format!("columns cannot be given when dropping index {name}")))
        }
        [Clause::OnTable { .. }, other, ..] | [other, ..] => Err(stmt.unsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Model;

    #[derive(Debug, Default, Model)]
    struct Department {
        #[orm("typ=CHAR(4),pk=pk_departments")]
        dept_no: String,
        #[orm("typ=VARCHAR(40),notnull=t,uc=uc_dept_name")]
        dept_name: String,
    }

    #[test]
    fn create_table_with_columns() {
        let stmt = create_table("employees")
            .if_not_exists()
            .column("emp_no", "INT")
            .not_null()
            .auto_increment()
            .column("gender", "CHAR(1)")
            .default("M")
            .primary_key("pk_employees", &["emp_no"])
            .foreign_key("fk_dept", &["dept_no"])
            .references("departments", &["dept_no"]);
        assert_eq!(
            stmt.build_sql().unwrap(),
            "CREATE TABLE IF NOT EXISTS employees (emp_no INT NOT NULL AUTO_INCREMENT, gender CHAR(1) DEFAULT 'M', \
             CONSTRAINT pk_employees PRIMARY KEY (emp_no), \
             CONSTRAINT fk_dept FOREIGN KEY (dept_no) REFERENCES departments(dept_no))"
        );
    }

    #[test]
    fn create_table_from_model() {
        let stmt = create_table("departments").model::<Department>();
        assert_eq!(
            stmt.build_sql().unwrap(),
            "CREATE TABLE departments (dept_no CHAR(4), dept_name VARCHAR(40) NOT NULL, \
             CONSTRAINT uc_dept_name UNIQUE (dept_name), CONSTRAINT pk_departments PRIMARY KEY (dept_no))"
        );
    }

    #[test]
    fn create_table_model_errors_are_deferred() {
        let stmt = create_table("counters").model::<i64>();
        let err = stmt.build_sql().unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));
        assert_eq!(stmt.to_string(), err.to_string());
    }

    #[test]
    fn drop_table_statements() {
        assert_eq!(drop_table("employees").build_sql().unwrap(), "DROP TABLE employees");
        assert_eq!(drop_table("employees").if_exists().build_sql().unwrap(), "DROP TABLE IF EXISTS employees");
    }

    #[test]
    fn alter_table_statements() {
        assert_eq!(
            alter_table("employees").rename("staff").build_sql().unwrap(),
            "ALTER TABLE employees RENAME TO staff"
        );
        assert_eq!(
            alter_table("employees").add_column("nickname", "VARCHAR(16)").not_null().default("").build_sql().unwrap(),
            "ALTER TABLE employees ADD COLUMN nickname VARCHAR(16) NOT NULL DEFAULT ''"
        );
        assert_eq!(
            alter_table("dept_emp")
                .add_foreign_key("fk_emp", &["emp_no"])
                .references("employees", &["emp_no"])
                .build_sql()
                .unwrap(),
            "ALTER TABLE dept_emp ADD CONSTRAINT fk_emp FOREIGN KEY (emp_no) REFERENCES employees(emp_no)"
        );
        assert_eq!(
            alter_table("employees").rename_column("gender", "sex").build_sql().unwrap(),
            "ALTER TABLE employees RENAME COLUMN gender TO sex"
        );
        assert_eq!(
            alter_table("employees").drop_primary_key("pk_employees").build_sql().unwrap(),
            "ALTER TABLE employees DROP PRIMARY KEY"
        );
    }

    #[test]
    fn index_statements() {
        assert_eq!(
            create_unique_index("ix_name").on("employees", &["first_name", "last_name"]).build_sql().unwrap(),
            "CREATE UNIQUE INDEX ix_name ON employees (first_name, last_name)"
        );
        assert_eq!(drop_index("ix_name").on("employees").build_sql().unwrap(), "DROP INDEX ix_name ON employees");
        assert!(matches!(drop_index("ix_name").build_sql(), Err(Error::InvalidSyntax(_))));
    }

    #[test]
    fn rejects_injected_clauses() {
        let mut stmt: Statement = drop_table("t").into();
        stmt.push_clause(Clause::Limit(1));
        assert_eq!(stmt.build_sql().unwrap_err().to_string(), "Limit is not supported for DROP TABLE statement");
    }
}
