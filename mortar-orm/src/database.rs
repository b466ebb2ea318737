//! # Database Module
//!
//! Connection handling: the [`Conn`] trait statements execute against, the
//! live [`Database`] pool and its [`DatabaseBuilder`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use mortar_orm::{Conn, Database};
//!
//! let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
//!
//! db.create_table("employees")
//!     .column("emp_no", "INTEGER")
//!     .column("first_name", "TEXT")
//!     .migrate()
//!     .await?;
//!
//! db.insert("employees", &["emp_no", "first_name"]).values((1, "Taro")).exec().await?;
//!
//! let mut names: Vec<String> = Vec::new();
//! db.select(&["first_name"]).from(&["employees"]).query(&mut names).await?;
//! ```

use std::any::Any;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use sqlx::any::{AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::{AnyPool, Column, Connection, Row, ValueRef};

use crate::errors::{Error, Result};
use crate::rows::RowSet;
use crate::statement::delete::HasDelete;
use crate::statement::insert::HasInsert;
use crate::statement::migration::{HasCommand, HasOperation};
use crate::statement::select::HasSelect;
use crate::statement::update::HasUpdate;
use crate::statement::{
    AlterTableStmt, CreateIndexStmt, CreateTableStmt, DeleteStmt, DropIndexStmt, DropTableStmt, InsertStmt,
    SelectStmt, Statement, UpdateStmt,
};
use crate::transaction::Transaction;

// ============================================================================
// Drivers
// ============================================================================

/// SQL dialects the statement renderer knows about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Drivers {
    /// PostgreSQL driver.
    Postgres,
    /// SQLite driver.
    SQLite,
    /// MySQL driver. Statements built without a connection use it.
    #[default]
    MySQL,
}

impl Drivers {
    /// Detects the driver from a connection URL scheme. Unknown schemes are
    /// treated as SQLite.
    pub fn from_url(url: &str) -> Self {
        let (scheme, _) = url.split_once(':').unwrap_or(("sqlite", ""));
        match scheme {
            "postgresql" | "postgres" => Drivers::Postgres,
            "mysql" | "mariadb" => Drivers::MySQL,
            _ => Drivers::SQLite,
        }
    }
}

// ============================================================================
// Execution Results
// ============================================================================

/// Summary of an INSERT, UPDATE, DELETE or schema statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl From<AnyQueryResult> for ExecResult {
    fn from(result: AnyQueryResult) -> Self {
        ExecResult { rows_affected: result.rows_affected(), last_insert_id: result.last_insert_id() }
    }
}

/// What a connection hands back for a SELECT.
#[derive(Debug)]
pub enum QueryOutput {
    /// Raw rows for the rows parser.
    Rows(RowSet),
    /// A prepared value moved straight into the destination.
    Canned(Canned),
    /// Nothing to assign; the destination keeps its value.
    Empty,
}

/// A type-erased value returned by a mock expectation.
pub struct Canned {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Canned {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Canned { value: Box::new(value), type_name: std::any::type_name::<T>() }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Moves the value into `dest` if both have the same type.
    pub fn assign<T: 'static>(self, dest: &mut T) -> Result<()> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => {
                *dest = *value;
                Ok(())
            }
            Err(_) => Err(Error::invalid_mock(format!(
                "return value is {type_name} but the destination is {}",
                std::any::type_name::<T>()
            ))),
        }
    }
}

impl fmt::Debug for Canned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canned").field("type_name", &self.type_name).finish_non_exhaustive()
    }
}

// ============================================================================
// Conn Trait
// ============================================================================

/// Something statements can run on: a pool, a transaction or a mock.
///
/// The provided constructor methods start a statement bound to `self`, using
/// its driver for dialect-specific rendering.
#[async_trait]
pub trait Conn: Send + Sync {
    fn driver(&self) -> Drivers;

    async fn query(&self, stmt: &Statement) -> Result<QueryOutput>;

    async fn exec(&self, stmt: &Statement) -> Result<ExecResult>;

    fn select<'c>(&'c self, columns: &[&str]) -> SelectStmt<'c, HasSelect>
    where
        Self: Sized,
    {
        SelectStmt::new(columns, self.driver(), Some(self))
    }

    fn insert<'c>(&'c self, table: &str, columns: &[&str]) -> InsertStmt<'c, HasInsert>
    where
        Self: Sized,
    {
        InsertStmt::new(table, columns, self.driver(), Some(self))
    }

    fn update<'c>(&'c self, table: &str, columns: &[&str]) -> UpdateStmt<'c, HasUpdate>
    where
        Self: Sized,
    {
        UpdateStmt::new(table, columns, self.driver(), Some(self))
    }

    fn delete<'c>(&'c self) -> DeleteStmt<'c, HasDelete>
    where
        Self: Sized,
    {
        DeleteStmt::new(self.driver(), Some(self))
    }

    fn create_table<'c>(&'c self, table: &str) -> CreateTableStmt<'c, HasCommand>
    where
        Self: Sized,
    {
        CreateTableStmt::new(table, self.driver(), Some(self))
    }

    fn drop_table<'c>(&'c self, table: &str) -> DropTableStmt<'c, HasOperation>
    where
        Self: Sized,
    {
        DropTableStmt::new(table, self.driver(), Some(self))
    }

    fn alter_table<'c>(&'c self, table: &str) -> AlterTableStmt<'c, HasCommand>
    where
        Self: Sized,
    {
        AlterTableStmt::new(table, self.driver(), Some(self))
    }

    fn create_index<'c>(&'c self, name: &str) -> CreateIndexStmt<'c, HasCommand>
    where
        Self: Sized,
    {
        CreateIndexStmt::new(name, false, self.driver(), Some(self))
    }

    fn create_unique_index<'c>(&'c self, name: &str) -> CreateIndexStmt<'c, HasCommand>
    where
        Self: Sized,
    {
        CreateIndexStmt::new(name, true, self.driver(), Some(self))
    }

    fn drop_index<'c>(&'c self, name: &str) -> DropIndexStmt<'c, HasOperation>
    where
        Self: Sized,
    {
        DropIndexStmt::new(name, self.driver(), Some(self))
    }
}

// ============================================================================
// Database
// ============================================================================

/// A pooled connection to a live database.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) pool: AnyPool,
    pub(crate) driver: Drivers,
}

impl Database {
    /// Connects with default pool settings. The driver is detected from the
    /// URL prefix.
    pub async fn connect(url: &str) -> Result<Self> {
        Database::builder().connect(url).await
    }

    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Checks that a connection can be acquired and answers.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    /// Starts a transaction on one pooled connection.
    pub async fn begin(&self) -> Result<Transaction> {
        let tx = self.pool.begin().await?;
        debug!("transaction started");
        Ok(Transaction::new(tx, self.driver))
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Conn for Database {
    fn driver(&self) -> Drivers {
        self.driver
    }

    async fn query(&self, stmt: &Statement) -> Result<QueryOutput> {
        let sql = stmt.build_sql()?;
        debug!("query: {sql}");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(QueryOutput::Rows(row_set(&rows)?))
    }

    async fn exec(&self, stmt: &Statement) -> Result<ExecResult> {
        let sql = stmt.build_sql()?;
        debug!("exec: {sql}");
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.into())
    }
}

// ============================================================================
// DatabaseBuilder
// ============================================================================

/// Pool settings applied when connecting.
#[derive(Clone, Debug)]
pub struct DatabaseBuilder {
    max_connections: u32,
    min_connections: u32,
    acquire_timeout: Duration,
    idle_timeout: Option<Duration>,
    max_lifetime: Option<Duration>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        DatabaseBuilder {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl DatabaseBuilder {
    /// Upper bound of pooled connections. Use 1 for `sqlite::memory:`, where
    /// every connection opens its own database.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.idle_timeout = timeout.into();
        self
    }

    pub fn max_lifetime(mut self, lifetime: impl Into<Option<Duration>>) -> Self {
        self.max_lifetime = lifetime.into();
        self
    }

    pub async fn connect(self, url: &str) -> Result<Database> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(url)
            .await?;
        let driver = Drivers::from_url(url);
        debug!("connected to {driver:?} database");
        Ok(Database { pool, driver })
    }
}

// ============================================================================
// Row Conversion
// ============================================================================

/// Copies driver rows into an owned [`RowSet`] of text cells.
pub(crate) fn row_set(rows: &[AnyRow]) -> Result<RowSet> {
    let Some(first) = rows.first() else {
        return Ok(RowSet::default());
    };
    let mut set = RowSet::new(first.columns().iter().map(|c| c.name().to_string()));
    for row in rows {
        let cells = (0..row.len()).map(|index| cell(row, index)).collect::<Result<Vec<_>>>()?;
        set.push_row(cells);
    }
    Ok(set)
}

fn cell(row: &AnyRow, index: usize) -> Result<Option<Vec<u8>>> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(None);
    }
    if let Ok(text) = row.try_get::<String, _>(index) {
        return Ok(Some(text.into_bytes()));
    }
    if let Ok(n) = row.try_get::<i64, _>(index) {
        return Ok(Some(n.to_string().into_bytes()));
    }
    if let Ok(n) = row.try_get::<i32, _>(index) {
        return Ok(Some(n.to_string().into_bytes()));
    }
    if let Ok(n) = row.try_get::<i16, _>(index) {
        return Ok(Some(n.to_string().into_bytes()));
    }
    if let Ok(x) = row.try_get::<f64, _>(index) {
        return Ok(Some(x.to_string().into_bytes()));
    }
    if let Ok(x) = row.try_get::<f32, _>(index) {
        return Ok(Some(x.to_string().into_bytes()));
    }
    if let Ok(b) = row.try_get::<bool, _>(index) {
        return Ok(Some(b.to_string().into_bytes()));
    }
    Ok(Some(row.try_get::<Vec<u8>, _>(index)?))
}
