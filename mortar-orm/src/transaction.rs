//! # Transaction Module
//!
//! A [`Transaction`] runs statements on a single pooled connection inside
//! `BEGIN`/`COMMIT`. It implements [`Conn`], so every statement constructor
//! available on [`Database`](crate::Database) works on it too.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use mortar_orm::Conn;
//!
//! let tx = db.begin().await?;
//!
//! tx.insert("employees", &["emp_no", "first_name"]).values((1, "Taro")).exec().await?;
//! tx.update("employees", &["first_name"]).set("Jiro").where_clause("emp_no = ?", 1).exec().await?;
//!
//! tx.commit().await?;
//! ```
//!
//! Dropping a transaction without calling `commit` rolls it back.

use async_trait::async_trait;
use log::debug;
use sqlx::Any;
use tokio::sync::Mutex;

use crate::database::{Conn, Drivers, ExecResult, QueryOutput, row_set};
use crate::errors::Result;
use crate::statement::Statement;

/// A database transaction.
///
/// Statements only borrow the transaction, so the underlying sqlx
/// transaction sits behind an async mutex.
#[derive(Debug)]
pub struct Transaction {
    tx: Mutex<sqlx::Transaction<'static, Any>>,
    driver: Drivers,
}

impl Transaction {
    pub(crate) fn new(tx: sqlx::Transaction<'static, Any>, driver: Drivers) -> Self {
        Transaction { tx: Mutex::new(tx), driver }
    }

    /// Persists every change made in the transaction.
    pub async fn commit(self) -> Result<()> {
        self.tx.into_inner().commit().await?;
        debug!("transaction committed");
        Ok(())
    }

    /// Reverts every change made in the transaction.
    pub async fn rollback(self) -> Result<()> {
        self.tx.into_inner().rollback().await?;
        debug!("transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl Conn for Transaction {
    fn driver(&self) -> Drivers {
        self.driver
    }

    async fn query(&self, stmt: &Statement) -> Result<QueryOutput> {
        let sql = stmt.build_sql()?;
        debug!("query (tx): {sql}");
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;
        Ok(QueryOutput::Rows(row_set(&rows)?))
    }

    async fn exec(&self, stmt: &Statement) -> Result<ExecResult> {
        let sql = stmt.build_sql()?;
        debug!("exec (tx): {sql}");
        let mut tx = self.tx.lock().await;
        let result = sqlx::query(&sql).execute(&mut **tx).await?;
        Ok(result.into())
    }
}
