//! # Mock Module
//!
//! Connections that compare statements instead of running them. Each mock
//! holds a FIFO of expectations; every executed statement must structurally
//! equal the expectation at the head of the queue.
//!
//! ```rust,ignore
//! use mortar_orm::{Conn, MockDb, select};
//!
//! let db = MockDb::default();
//! db.expect_with_return(
//!     select(&["first_name"]).from(&["employees"]),
//!     vec!["Taro".to_string()],
//! );
//!
//! let mut names: Vec<String> = Vec::new();
//! db.select(&["first_name"]).from(&["employees"]).query(&mut names).await?;
//! assert_eq!(names, ["Taro"]);
//!
//! db.complete()?;
//! ```
//!
//! A canned return value is moved into the query destination as is, so its
//! type must be exactly the destination type.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{trace, warn};

use crate::database::{Canned, Conn, Drivers, ExecResult, QueryOutput};
use crate::errors::{Error, Result};
use crate::statement::Statement;

enum Expectation {
    Statement { stmt: Statement, ret: Option<Canned> },
    Begin(Arc<MockTx>),
    Commit,
    Rollback,
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Statement { stmt, .. } => stmt.to_func_string(),
            Expectation::Begin(_) => "Begin()".to_string(),
            Expectation::Commit => "Commit()".to_string(),
            Expectation::Rollback => "Rollback()".to_string(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Queue(Mutex<VecDeque<Expectation>>);

// Lists the pending expectations in function-call form.
impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(lock(&self.0).iter().map(Expectation::describe)).finish()
    }
}

impl Queue {
    fn push(&self, expectation: Expectation) {
        lock(&self.0).push_back(expectation);
    }

    // Pops the head and checks it against what was actually run.
    fn next(&self, actual: &str, matches: impl FnOnce(&Expectation) -> bool) -> Result<Expectation> {
        let head = lock(&self.0).pop_front();
        let Some(head) = head else {
            trace!("mock: unexpected {actual}");
            return Err(Error::invalid_mock(format!("{actual} was executed but not expected")));
        };
        if !matches(&head) {
            let expected = head.describe();
            trace!("mock: expected {expected}, got {actual}");
            return Err(Error::invalid_mock(format!("comparison failed: expected: {expected}, actual: {actual}")));
        }
        trace!("mock: matched {actual}");
        Ok(head)
    }

    fn statement(&self, stmt: &Statement) -> Result<Option<Canned>> {
        let actual = stmt.to_func_string();
        let matched = self.next(&actual, |head| {
            matches!(head, Expectation::Statement { stmt: expected, .. } if expected == stmt)
        })?;
        match matched {
            Expectation::Statement { ret, .. } => Ok(ret),
            _ => Ok(None),
        }
    }

    fn complete(&self, owner: &str) -> Result<()> {
        let queue = lock(&self.0);
        match queue.front() {
            None => Ok(()),
            Some(head) => {
                warn!("{owner} completed with {} pending expectation(s)", queue.len());
                Err(Error::invalid_mock(format!("{} was expected but not executed", head.describe())))
            }
        }
    }
}

fn exec_result(ret: Option<Canned>) -> Result<ExecResult> {
    let mut result = ExecResult::default();
    if let Some(canned) = ret {
        canned.assign(&mut result)?;
    }
    Ok(result)
}

fn query_output(ret: Option<Canned>) -> QueryOutput {
    ret.map_or(QueryOutput::Empty, QueryOutput::Canned)
}

// ============================================================================
// MockDb
// ============================================================================

/// A mock database connection.
#[derive(Debug)]
pub struct MockDb {
    driver: Drivers,
    queue: Queue,
    transactions: Mutex<Vec<Arc<MockTx>>>,
}

impl Default for MockDb {
    fn default() -> Self {
        MockDb::new(Drivers::default())
    }
}

impl MockDb {
    /// A mock rendering statements for `driver`.
    pub fn new(driver: Drivers) -> Self {
        MockDb { driver, queue: Queue::default(), transactions: Mutex::new(Vec::new()) }
    }

    /// Expects `stmt` to be executed next. A query on it leaves the
    /// destination untouched; an exec returns an empty [`ExecResult`].
    pub fn expect(&self, stmt: impl Into<Statement>) -> &Self {
        self.queue.push(Expectation::Statement { stmt: stmt.into(), ret: None });
        self
    }

    /// Expects `stmt` and answers it with `value`: moved into the query
    /// destination, or returned by `exec` when `value` is an [`ExecResult`].
    pub fn expect_with_return<T: Any + Send>(&self, stmt: impl Into<Statement>, value: T) -> &Self {
        self.queue.push(Expectation::Statement { stmt: stmt.into(), ret: Some(Canned::new(value)) });
        self
    }

    /// Expects a transaction to begin and returns the mock that will stand
    /// in for it.
    pub fn expect_begin(&self) -> Arc<MockTx> {
        let tx = Arc::new(MockTx::new(self.driver));
        lock(&self.transactions).push(Arc::clone(&tx));
        self.queue.push(Expectation::Begin(Arc::clone(&tx)));
        tx
    }

    /// Starts the transaction registered by the matching
    /// [`expect_begin`](Self::expect_begin).
    pub fn begin(&self) -> Result<Arc<MockTx>> {
        match self.queue.next("Begin()", |head| matches!(head, Expectation::Begin(_)))? {
            Expectation::Begin(tx) => Ok(tx),
            _ => Err(Error::invalid_mock("begin matched a non-begin expectation")),
        }
    }

    /// Fails with the first expectation that was never consumed, here or in
    /// any transaction mock handed out by `expect_begin`.
    pub fn complete(&self) -> Result<()> {
        self.queue.complete("mock database")?;
        for tx in lock(&self.transactions).iter() {
            tx.complete()?;
        }
        Ok(())
    }
}

#[async_trait]
impl Conn for MockDb {
    fn driver(&self) -> Drivers {
        self.driver
    }

    async fn query(&self, stmt: &Statement) -> Result<QueryOutput> {
        self.queue.statement(stmt).map(query_output)
    }

    async fn exec(&self, stmt: &Statement) -> Result<ExecResult> {
        exec_result(self.queue.statement(stmt)?)
    }
}

// ============================================================================
// MockTx
// ============================================================================

/// A mock transaction, created by [`MockDb::expect_begin`].
#[derive(Debug)]
pub struct MockTx {
    driver: Drivers,
    queue: Queue,
}

impl MockTx {
    fn new(driver: Drivers) -> Self {
        MockTx { driver, queue: Queue::default() }
    }

    pub fn expect(&self, stmt: impl Into<Statement>) -> &Self {
        self.queue.push(Expectation::Statement { stmt: stmt.into(), ret: None });
        self
    }

    pub fn expect_with_return<T: Any + Send>(&self, stmt: impl Into<Statement>, value: T) -> &Self {
        self.queue.push(Expectation::Statement { stmt: stmt.into(), ret: Some(Canned::new(value)) });
        self
    }

    pub fn expect_commit(&self) -> &Self {
        self.queue.push(Expectation::Commit);
        self
    }

    pub fn expect_rollback(&self) -> &Self {
        self.queue.push(Expectation::Rollback);
        self
    }

    pub fn commit(&self) -> Result<()> {
        self.queue.next("Commit()", |head| matches!(head, Expectation::Commit)).map(drop)
    }

    pub fn rollback(&self) -> Result<()> {
        self.queue.next("Rollback()", |head| matches!(head, Expectation::Rollback)).map(drop)
    }

    pub fn complete(&self) -> Result<()> {
        self.queue.complete("mock transaction")
    }
}

#[async_trait]
impl Conn for MockTx {
    fn driver(&self) -> Drivers {
        self.driver
    }

    async fn query(&self, stmt: &Statement) -> Result<QueryOutput> {
        self.queue.statement(stmt).map(query_output)
    }

    async fn exec(&self, stmt: &Statement) -> Result<ExecResult> {
        exec_result(self.queue.statement(stmt)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{insert, select};

    #[test]
    fn debug_lists_pending_expectations() {
        let db = MockDb::default();
        let tx = db.expect_begin();
        tx.expect(select(&["emp_no"]).from(&["employees"])).expect_commit();

        let shown = format!("{tx:?}");
        assert!(shown.starts_with("MockTx { driver: MySQL"));
        assert!(shown.contains("[\"Select(\\\"emp_no\\\").From(\\\"employees\\\")\", \"Commit()\"]"));
        assert!(format!("{db:?}").contains("queue: [\"Begin()\"]"));
    }

    #[tokio::test]
    async fn matching_statements_are_consumed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let db = MockDb::default();
        db.expect(insert("employees", &["emp_no"]).values(1))
            .expect_with_return(select(&["emp_no"]).from(&["employees"]), vec![1i64]);

        db.insert("employees", &["emp_no"]).values(1).exec().await?;
        let mut numbers: Vec<i64> = Vec::new();
        db.select(&["emp_no"]).from(&["employees"]).query(&mut numbers).await?;

        assert_eq!(numbers, [1]);
        db.complete()?;
        Ok(())
    }

    #[tokio::test]
    async fn unexpected_statement() {
        let db = MockDb::default();
        let err = db.delete().from(&["employees"]).exec().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mock expectation: Delete().From(\"employees\") was executed but not expected"
        );
    }

    #[tokio::test]
    async fn mismatch_reports_both_sides() {
        let db = MockDb::default();
        db.expect(select(&["a"]).from(&["t"]).limit(1));
        let mut dest: Vec<String> = Vec::new();
        let err = db.select(&["a"]).from(&["t"]).limit(2).query(&mut dest).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mock expectation: comparison failed: \
             expected: Select(\"a\").From(\"t\").Limit(1), actual: Select(\"a\").From(\"t\").Limit(2)"
        );
    }

    #[test]
    fn transaction_expectations() {
        let db = MockDb::default();
        let tx = db.expect_begin();
        tx.expect_commit();

        let began = db.begin().unwrap();
        assert!(matches!(db.complete(), Err(Error::InvalidMockExpectation(_))));
        began.commit().unwrap();
        db.complete().unwrap();
        assert!(began.rollback().is_err());
    }
}
