use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::core::{ExecResult, Result, Value};
use crate::interface::PhysicalStmt;
use crate::routing::{ReplicaSelector, scatter};

/// A statement prepared on every physical database of a [`LogicalDb`].
///
/// Executions follow the same routing as the logical database: `execute`
/// runs on the primary's statement, `query` and `query_row` on a replica's,
/// sharing the database's round-robin counter.
///
/// [`LogicalDb`]: crate::LogicalDb
pub struct Stmt<S: PhysicalStmt> {
    stmts: Vec<Arc<S>>,
    selector: Arc<ReplicaSelector>,
}

impl<S: PhysicalStmt> Stmt<S> {
    pub(crate) fn new(stmts: Vec<S>, selector: Arc<ReplicaSelector>) -> Self {
        Self {
            stmts: stmts.into_iter().map(Arc::new).collect(),
            selector,
        }
    }

    /// Close the statement on every physical database.
    ///
    /// Every slot is attempted; failures are reported together.
    pub async fn close(&self) -> Result<()> {
        scatter(self.stmts.len(), |i| {
            let stmt = Arc::clone(&self.stmts[i]);
            async move { stmt.close().await }
        })
        .await
        .map(drop)
    }

    /// Execute on the primary.
    pub async fn execute(&self, params: &[Value]) -> Result<ExecResult> {
        self.primary().execute(params).await
    }

    pub async fn execute_with(&self, ctx: &Context, params: &[Value]) -> Result<ExecResult> {
        self.primary().execute_with(ctx, params).await
    }

    /// Query on a replica.
    pub async fn query(&self, params: &[Value]) -> Result<S::Rows> {
        self.replica().query(params).await
    }

    pub async fn query_with(&self, ctx: &Context, params: &[Value]) -> Result<S::Rows> {
        self.replica().query_with(ctx, params).await
    }

    pub async fn query_row(&self, params: &[Value]) -> Result<S::Row> {
        self.replica().query_row(params).await
    }

    pub async fn query_row_with(&self, ctx: &Context, params: &[Value]) -> Result<S::Row> {
        self.replica().query_row_with(ctx, params).await
    }

    /// Per-slot statements, primary first.
    pub fn statements(&self) -> &[Arc<S>] {
        &self.stmts
    }

    pub fn slot_count(&self) -> usize {
        self.stmts.len()
    }

    fn primary(&self) -> &S {
        &self.stmts[0]
    }

    fn replica(&self) -> &S {
        let slot = self.selector.select(self.stmts.len());
        debug!(slot, "statement read routed");
        &self.stmts[slot]
    }
}

impl<S: PhysicalStmt> fmt::Debug for Stmt<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stmt")
            .field("slots", &self.stmts.len())
            .finish()
    }
}
