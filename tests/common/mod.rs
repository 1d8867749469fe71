// ==============================================
// SHARED MOCK DRIVER GRAPH (integration support)
// ==============================================
//
// A minimal in-memory driver: data sources hand out connections, connections
// hand out statements, statements hand out result sets. Every object records
// whether it was closed so tests can check that calls reach the real object.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use probekit::driver::{
    CachedRowSet, CallableStatement, CommonDataSource, Connection, DataSource, FilteredRowSet,
    JoinRowSet, PooledConnection, PreparedStatement, ResultSet, RowSet, Statement, WebRowSet,
    Wrapper, XaConnection, XaDataSource, XaResource,
};
use probekit::driver_url::Driver;
use probekit::error::{DriverError, DriverResult};

/// Which result-set shape statements produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowsKind {
    Plain,
    Join,
    Filtered,
}

/// Shared log of the SQL the real objects executed.
#[derive(Debug, Default, Clone)]
pub struct Journal {
    executed: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl Journal {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str) {
        self.executed.lock().push(sql.to_owned());
    }

    fn closed(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn rows_for(kind: RowsKind, journal: &Journal) -> Arc<dyn ResultSet> {
    match kind {
        RowsKind::Plain => Arc::new(MockRows::new(journal.clone())),
        RowsKind::Join => Arc::new(MockJoinRows::new(journal.clone())),
        RowsKind::Filtered => Arc::new(MockFilteredRows::new(journal.clone())),
    }
}

// ----------------------------------------------
// Data sources
// ----------------------------------------------

#[derive(Debug)]
pub struct MockDataSource {
    pub journal: Journal,
    pub rows: RowsKind,
}

impl MockDataSource {
    pub fn new(rows: RowsKind) -> Self {
        Self {
            journal: Journal::default(),
            rows,
        }
    }
}

impl Wrapper for MockDataSource {}
impl CommonDataSource for MockDataSource {}

impl DataSource for MockDataSource {
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>> {
        Ok(Arc::new(MockConnection::new(self.journal.clone(), self.rows)))
    }
}

#[derive(Debug, Default)]
pub struct MockXaDataSource {
    pub journal: Journal,
}

impl Wrapper for MockXaDataSource {}
impl CommonDataSource for MockXaDataSource {}

impl XaDataSource for MockXaDataSource {
    fn get_xa_connection(&self) -> DriverResult<Arc<dyn XaConnection>> {
        Ok(Arc::new(MockXaConnection::new(self.journal.clone())))
    }
}

// ----------------------------------------------
// Pooled / XA connections
// ----------------------------------------------

#[derive(Debug)]
pub struct MockXaConnection {
    journal: Journal,
    closed: AtomicBool,
}

impl MockXaConnection {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Wrapper for MockXaConnection {}

impl PooledConnection for MockXaConnection {
    fn get_connection(&self) -> DriverResult<Arc<dyn Connection>> {
        Ok(Arc::new(MockConnection::new(self.journal.clone(), RowsKind::Plain)))
    }

    fn close(&self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.journal.closed();
        Ok(())
    }
}

impl XaConnection for MockXaConnection {
    fn get_xa_resource(&self) -> DriverResult<Arc<dyn XaResource>> {
        Ok(Arc::new(MockXaResource))
    }
}

#[derive(Debug)]
pub struct MockXaResource;

impl XaResource for MockXaResource {
    fn prepare(&self, _xid: &str) -> DriverResult<i32> {
        Ok(0)
    }

    fn commit(&self, _xid: &str, _one_phase: bool) -> DriverResult<()> {
        Ok(())
    }

    fn rollback(&self, _xid: &str) -> DriverResult<()> {
        Ok(())
    }
}

// ----------------------------------------------
// Connections
// ----------------------------------------------

#[derive(Debug)]
pub struct MockConnection {
    journal: Journal,
    rows: RowsKind,
    closed: AtomicBool,
    auto_commit: AtomicBool,
}

impl MockConnection {
    pub fn new(journal: Journal, rows: RowsKind) -> Self {
        Self {
            journal,
            rows,
            closed: AtomicBool::new(false),
            auto_commit: AtomicBool::new(true),
        }
    }
}

impl Wrapper for MockConnection {}

impl Connection for MockConnection {
    fn create_statement(&self) -> DriverResult<Arc<dyn Statement>> {
        Ok(Arc::new(MockStatement::new(self.journal.clone(), self.rows, None)))
    }

    fn prepare_statement(&self, sql: &str) -> DriverResult<Arc<dyn PreparedStatement>> {
        if sql.trim().is_empty() {
            return Err(DriverError::sql("empty statement", Some("42000")));
        }
        Ok(Arc::new(MockStatement::new(
            self.journal.clone(),
            self.rows,
            Some(sql.to_owned()),
        )))
    }

    fn prepare_call(&self, sql: &str) -> DriverResult<Arc<dyn CallableStatement>> {
        Ok(Arc::new(MockStatement::new(
            self.journal.clone(),
            self.rows,
            Some(sql.to_owned()),
        )))
    }

    fn set_auto_commit(&self, auto_commit: bool) -> DriverResult<()> {
        self.auto_commit.store(auto_commit, Ordering::SeqCst);
        Ok(())
    }

    fn auto_commit(&self) -> DriverResult<bool> {
        Ok(self.auto_commit.load(Ordering::SeqCst))
    }

    fn close(&self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.journal.closed();
        Ok(())
    }

    fn is_closed(&self) -> DriverResult<bool> {
        Ok(self.closed.load(Ordering::SeqCst))
    }
}

// ----------------------------------------------
// Statements (one type serves all three kinds)
// ----------------------------------------------

#[derive(Debug)]
pub struct MockStatement {
    journal: Journal,
    rows: RowsKind,
    prepared: Option<String>,
    closed: AtomicBool,
}

impl MockStatement {
    pub fn new(journal: Journal, rows: RowsKind, prepared: Option<String>) -> Self {
        Self {
            journal,
            rows,
            prepared,
            closed: AtomicBool::new(false),
        }
    }

    fn run(&self, sql: &str) -> DriverResult<()> {
        if sql.contains("missing_table") {
            return Err(DriverError::sql("table not found", Some("42S02")));
        }
        self.journal.record(sql);
        Ok(())
    }

    fn prepared_sql(&self) -> DriverResult<String> {
        self.prepared
            .clone()
            .ok_or_else(|| DriverError::sql("statement was not prepared", Some("HY000")))
    }
}

impl Wrapper for MockStatement {}

impl Statement for MockStatement {
    fn execute(&self, sql: &str) -> DriverResult<bool> {
        self.run(sql)?;
        Ok(true)
    }

    fn execute_query(&self, sql: &str) -> DriverResult<Arc<dyn ResultSet>> {
        self.run(sql)?;
        Ok(rows_for(self.rows, &self.journal))
    }

    fn execute_update(&self, sql: &str) -> DriverResult<i64> {
        self.run(sql)?;
        Ok(1)
    }

    fn close(&self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.journal.closed();
        Ok(())
    }

    fn is_closed(&self) -> DriverResult<bool> {
        Ok(self.closed.load(Ordering::SeqCst))
    }
}

impl PreparedStatement for MockStatement {
    fn execute_prepared(&self) -> DriverResult<bool> {
        self.run(&self.prepared_sql()?)?;
        Ok(true)
    }

    fn execute_query_prepared(&self) -> DriverResult<Arc<dyn ResultSet>> {
        self.run(&self.prepared_sql()?)?;
        Ok(rows_for(self.rows, &self.journal))
    }

    fn execute_update_prepared(&self) -> DriverResult<i64> {
        self.run(&self.prepared_sql()?)?;
        Ok(1)
    }
}

impl CallableStatement for MockStatement {
    fn get_out_string(&self, _index: i32) -> DriverResult<Option<String>> {
        Ok(Some("out".to_owned()))
    }
}

// ----------------------------------------------
// Result sets
// ----------------------------------------------

macro_rules! mock_rows {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name {
            journal: Journal,
            cursor: AtomicUsize,
            closed: AtomicBool,
        }

        impl $name {
            pub fn new(journal: Journal) -> Self {
                Self {
                    journal,
                    cursor: AtomicUsize::new(0),
                    closed: AtomicBool::new(false),
                }
            }
        }

        impl Wrapper for $name {}
    };
}

macro_rules! mock_result_set_methods {
    () => {
        fn next(&self) -> DriverResult<bool> {
            Ok(self.cursor.fetch_add(1, Ordering::SeqCst) < 2)
        }

        fn get_string(&self, column: i32) -> DriverResult<Option<String>> {
            Ok(Some(format!(
                "row{}col{column}",
                self.cursor.load(Ordering::SeqCst)
            )))
        }

        fn close(&self) -> DriverResult<()> {
            self.closed.store(true, Ordering::SeqCst);
            self.journal.closed();
            Ok(())
        }

        fn is_closed(&self) -> DriverResult<bool> {
            Ok(self.closed.load(Ordering::SeqCst))
        }
    };
}

macro_rules! mock_web_row_set {
    ($name:ident) => {
        impl RowSet for $name {
            fn command(&self) -> DriverResult<Option<String>> {
                Ok(None)
            }

            fn set_command(&self, _command: &str) -> DriverResult<()> {
                Ok(())
            }

            fn execute_row_set(&self) -> DriverResult<()> {
                Ok(())
            }
        }

        impl CachedRowSet for $name {
            fn size(&self) -> DriverResult<usize> {
                Ok(2)
            }
        }

        impl WebRowSet for $name {
            fn write_xml(&self) -> DriverResult<String> {
                Ok("<webRowSet/>".to_owned())
            }
        }
    };
}

mock_rows!(MockRows);

impl ResultSet for MockRows {
    mock_result_set_methods!();
}

mock_rows!(MockJoinRows);

impl ResultSet for MockJoinRows {
    mock_result_set_methods!();

    fn into_row_set(self: Arc<Self>) -> Option<Arc<dyn RowSet>> {
        Some(self)
    }

    fn into_cached_row_set(self: Arc<Self>) -> Option<Arc<dyn CachedRowSet>> {
        Some(self)
    }

    fn into_web_row_set(self: Arc<Self>) -> Option<Arc<dyn WebRowSet>> {
        Some(self)
    }

    fn into_join_row_set(self: Arc<Self>) -> Option<Arc<dyn JoinRowSet>> {
        Some(self)
    }
}

mock_web_row_set!(MockJoinRows);

impl JoinRowSet for MockJoinRows {
    fn join_type(&self) -> DriverResult<i32> {
        Ok(1)
    }

    fn where_clause(&self) -> DriverResult<String> {
        Ok("a.id = b.id".to_owned())
    }
}

mock_rows!(MockFilteredRows);

impl ResultSet for MockFilteredRows {
    mock_result_set_methods!();

    fn into_row_set(self: Arc<Self>) -> Option<Arc<dyn RowSet>> {
        Some(self)
    }

    fn into_cached_row_set(self: Arc<Self>) -> Option<Arc<dyn CachedRowSet>> {
        Some(self)
    }

    fn into_web_row_set(self: Arc<Self>) -> Option<Arc<dyn WebRowSet>> {
        Some(self)
    }

    fn into_filtered_row_set(self: Arc<Self>) -> Option<Arc<dyn FilteredRowSet>> {
        Some(self)
    }
}

mock_web_row_set!(MockFilteredRows);

impl FilteredRowSet for MockFilteredRows {
    fn set_filter(&self, _predicate: &str) -> DriverResult<()> {
        Ok(())
    }

    fn filter(&self) -> DriverResult<Option<String>> {
        Ok(None)
    }
}

// ----------------------------------------------
// Driver
// ----------------------------------------------

/// Real driver accepting `jdbc:mock:` URLs; remembers what it was asked.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub journal: Journal,
    pub last_connect: Mutex<Option<(String, HashMap<String, String>)>>,
}

impl Driver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("jdbc:mock:")
    }

    fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> DriverResult<Arc<dyn Connection>> {
        *self.last_connect.lock() = Some((url.to_owned(), properties.clone()));
        Ok(Arc::new(MockConnection::new(self.journal.clone(), RowsKind::Plain)))
    }
}
