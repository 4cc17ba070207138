use async_trait::async_trait;
use std::time::Duration;

use crate::context::Context;
use crate::core::{ExecResult, Result, TxOptions, Value};

/// Opens one physical database for a data source name.
///
/// Driver lookup lives behind this trait: `driver_name` is handed over
/// untouched, exactly as the caller passed it to [`LogicalDb::open`].
///
/// [`LogicalDb::open`]: crate::LogicalDb::open
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Db: PhysicalDb;

    async fn open(&self, driver_name: &str, data_source_name: &str) -> Result<Self::Db>;
}

/// A single physical database handle, usually backed by its own connection pool.
///
/// This is the surface a logical database routes into. Implement it over a
/// real client (Postgres, MySQL, ...) or over a test double.
#[async_trait]
pub trait PhysicalDb: Send + Sync + 'static {
    type Tx: Send + 'static;
    type Rows: Send + 'static;
    type Row: Send + 'static;
    type Stmt: PhysicalStmt<Rows = Self::Rows, Row = Self::Row>;

    /// Name of the driver this handle was opened with.
    fn driver(&self) -> &str;

    async fn close(&self) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    async fn ping_with(&self, ctx: &Context) -> Result<()>;

    async fn begin(&self) -> Result<Self::Tx>;

    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Self::Tx>;

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    async fn execute_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<ExecResult>;

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Self::Rows>;

    async fn query_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<Self::Rows>;

    async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Self::Row>;

    async fn query_row_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<Self::Row>;

    async fn prepare(&self, sql: &str) -> Result<Self::Stmt>;

    async fn prepare_with(&self, ctx: &Context, sql: &str) -> Result<Self::Stmt>;

    /// Idle connections kept in the pool. `0` retains none.
    fn set_max_idle_conns(&self, n: usize);

    /// Open connections allowed at once. `0` means unlimited.
    fn set_max_open_conns(&self, n: usize);

    /// How long a connection may be reused. `None` reuses forever.
    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>);
}

/// A statement prepared on one physical database.
#[async_trait]
pub trait PhysicalStmt: Send + Sync + 'static {
    type Rows: Send + 'static;
    type Row: Send + 'static;

    async fn execute(&self, params: &[Value]) -> Result<ExecResult>;

    async fn execute_with(&self, ctx: &Context, params: &[Value]) -> Result<ExecResult>;

    async fn query(&self, params: &[Value]) -> Result<Self::Rows>;

    async fn query_with(&self, ctx: &Context, params: &[Value]) -> Result<Self::Rows>;

    async fn query_row(&self, params: &[Value]) -> Result<Self::Row>;

    async fn query_row_with(&self, ctx: &Context, params: &[Value]) -> Result<Self::Row>;

    async fn close(&self) -> Result<()>;
}
