use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{ClusterConfig, redact_dsn, split_data_source_names};
use crate::context::Context;
use crate::core::{DbError, ExecResult, Result, TxOptions, Value};
use crate::facade::Stmt;
use crate::interface::{Connector, PhysicalDb};
use crate::routing::{ReplicaSelector, scatter, scatter_all, split};

/// A logical database backed by one primary and any number of replicas.
///
/// Slot 0 is the primary. Writes and transactions go there, reads go to a
/// replica picked round-robin, and lifecycle calls (close, ping, prepare)
/// fan out to every slot concurrently.
///
/// `LogicalDb` is `Send + Sync`; share it behind an `Arc`.
pub struct LogicalDb<C: PhysicalDb> {
    slots: Vec<Arc<C>>,
    selector: Arc<ReplicaSelector>,
}

impl<C: PhysicalDb> LogicalDb<C> {
    /// Open every physical database concurrently.
    ///
    /// `data_source_names` is a `;`-separated list; the first entry is the
    /// primary and the rest are replicas, in order. If any of them fails to
    /// open, the ones that did open are closed again and the error is returned.
    ///
    /// ```ignore
    /// let db = LogicalDb::open(connector, "postgres", "primary-dsn;replica-1;replica-2").await?;
    /// ```
    pub async fn open<K>(connector: Arc<K>, driver_name: &str, data_source_names: &str) -> Result<Self>
    where
        K: Connector<Db = C>,
    {
        Self::open_targets(connector, driver_name, split_data_source_names(data_source_names)).await
    }

    /// Open from a validated [`ClusterConfig`] and apply its pool tuning.
    pub async fn open_with_config<K>(connector: Arc<K>, config: &ClusterConfig) -> Result<Self>
    where
        K: Connector<Db = C>,
    {
        config.validate()?;

        let db = Self::open_targets(connector, &config.driver_name, config.data_sources.clone()).await?;

        if let Some(n) = config.max_idle_conns {
            db.set_max_idle_conns(n);
        }
        if let Some(n) = config.max_open_conns {
            db.set_max_open_conns(n);
        }
        if config.conn_max_lifetime.is_some() {
            db.set_conn_max_lifetime(config.conn_max_lifetime);
        }

        Ok(db)
    }

    /// Wrap physical databases that are already open. The first one is the primary.
    pub fn from_physical(dbs: Vec<C>) -> Result<Self> {
        if dbs.is_empty() {
            return Err(DbError::NoSlots);
        }

        Ok(Self {
            slots: dbs.into_iter().map(Arc::new).collect(),
            selector: Arc::new(ReplicaSelector::new()),
        })
    }

    async fn open_targets<K>(connector: Arc<K>, driver_name: &str, targets: Vec<String>) -> Result<Self>
    where
        K: Connector<Db = C>,
    {
        let driver: Arc<str> = Arc::from(driver_name);
        let targets = Arc::new(targets);

        let results = scatter_all(targets.len(), |i| {
            let connector = Arc::clone(&connector);
            let driver = Arc::clone(&driver);
            let targets = Arc::clone(&targets);
            async move { connector.open(&driver, &targets[i]).await }
        })
        .await;

        let (opened, err) = split(results);
        if let Some(err) = err {
            warn!(
                driver = driver_name,
                opened = opened.len(),
                total = targets.len(),
                "failed to open logical database"
            );
            if !opened.is_empty() {
                let leftover: Vec<Arc<C>> = opened.into_iter().map(Arc::new).collect();
                let closed = scatter(leftover.len(), |i| {
                    let db = Arc::clone(&leftover[i]);
                    async move { db.close().await }
                })
                .await;
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "failed to close physical databases after open failure");
                }
            }
            return Err(err);
        }

        let db = Self::from_physical(opened)?;
        info!(
            driver = driver_name,
            primary = %redact_dsn(&targets[0]),
            replicas = db.replica_count(),
            "opened logical database"
        );
        Ok(db)
    }

    /// Close every physical database concurrently.
    pub async fn close(&self) -> Result<()> {
        scatter(self.slots.len(), |i| {
            let db = Arc::clone(&self.slots[i]);
            async move { db.close().await }
        })
        .await?;

        info!(slots = self.slots.len(), "closed logical database");
        Ok(())
    }

    /// The primary's driver name.
    pub fn driver(&self) -> &str {
        self.primary().driver()
    }

    /// Begin a transaction on the primary. The isolation level is up to the driver.
    pub async fn begin(&self) -> Result<C::Tx> {
        self.primary().begin().await
    }

    /// Begin a transaction on the primary with explicit options.
    pub async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<C::Tx> {
        self.primary().begin_tx(ctx, opts).await
    }

    /// Run a statement that returns no rows on the primary.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.primary().execute(sql, params).await
    }

    pub async fn execute_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.primary().execute_with(ctx, sql, params).await
    }

    /// Check that every physical database is reachable, connecting if needed.
    pub async fn ping(&self) -> Result<()> {
        scatter(self.slots.len(), |i| {
            let db = Arc::clone(&self.slots[i]);
            async move { db.ping().await }
        })
        .await
        .map(drop)
    }

    pub async fn ping_with(&self, ctx: &Context) -> Result<()> {
        scatter(self.slots.len(), |i| {
            let db = Arc::clone(&self.slots[i]);
            let ctx = ctx.clone();
            async move { db.ping_with(&ctx).await }
        })
        .await
        .map(drop)
    }

    /// Prepare `sql` on every physical database concurrently.
    ///
    /// All-or-nothing: when a slot fails, statements already prepared on the
    /// other slots are closed and the failure is returned.
    pub async fn prepare(&self, sql: &str) -> Result<Stmt<C::Stmt>> {
        self.prepare_on_all(None, sql).await
    }

    /// Like [`prepare`](Self::prepare). `ctx` covers the preparation only,
    /// not later executions of the statement.
    pub async fn prepare_with(&self, ctx: &Context, sql: &str) -> Result<Stmt<C::Stmt>> {
        self.prepare_on_all(Some(ctx), sql).await
    }

    async fn prepare_on_all(&self, ctx: Option<&Context>, sql: &str) -> Result<Stmt<C::Stmt>> {
        let sql: Arc<str> = Arc::from(sql);

        let results = scatter_all(self.slots.len(), |i| {
            let db = Arc::clone(&self.slots[i]);
            let sql = Arc::clone(&sql);
            let ctx = ctx.cloned();
            async move {
                match ctx {
                    Some(ctx) => db.prepare_with(&ctx, &sql).await,
                    None => db.prepare(&sql).await,
                }
            }
        })
        .await;

        let (prepared, err) = split(results);
        if let Some(err) = err {
            if !prepared.is_empty() {
                debug!(prepared = prepared.len(), "closing statements left by failed prepare");
                let leftover = Stmt::new(prepared, Arc::clone(&self.selector));
                if let Err(close_err) = leftover.close().await {
                    warn!(error = %close_err, "failed to close statements after prepare failure");
                }
            }
            return Err(err);
        }

        Ok(Stmt::new(prepared, Arc::clone(&self.selector)))
    }

    /// Run a row-returning query on a replica.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<C::Rows> {
        self.replica().query(sql, params).await
    }

    pub async fn query_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<C::Rows> {
        self.replica().query_with(ctx, sql, params).await
    }

    /// Run a query expected to return at most one row on a replica.
    pub async fn query_row(&self, sql: &str, params: &[Value]) -> Result<C::Row> {
        self.replica().query_row(sql, params).await
    }

    pub async fn query_row_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<C::Row> {
        self.replica().query_row_with(ctx, sql, params).await
    }

    /// Set the idle pool size of every physical database.
    /// `0` keeps no idle connections.
    pub fn set_max_idle_conns(&self, n: usize) {
        for db in &self.slots {
            db.set_max_idle_conns(n);
        }
    }

    /// Set the open-connection limit of every physical database.
    /// `0` means unlimited.
    pub fn set_max_open_conns(&self, n: usize) {
        for db in &self.slots {
            db.set_max_open_conns(n);
        }
    }

    /// Set how long connections may be reused on every physical database.
    /// `None` reuses them forever.
    pub fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        for db in &self.slots {
            db.set_conn_max_lifetime(lifetime);
        }
    }

    pub fn primary(&self) -> &Arc<C> {
        &self.slots[0]
    }

    /// The next replica in round-robin order, or the primary when there are no replicas.
    pub fn replica(&self) -> &Arc<C> {
        let slot = self.selector.select(self.slots.len());
        debug!(slot, "read routed");
        &self.slots[slot]
    }

    #[deprecated(since = "0.1.0", note = "use `primary` instead")]
    pub fn master(&self) -> &Arc<C> {
        self.primary()
    }

    #[deprecated(since = "0.1.0", note = "use `replica` instead")]
    pub fn slave(&self) -> &Arc<C> {
        self.replica()
    }

    /// Physical databases in slot order, primary first.
    pub fn slots(&self) -> &[Arc<C>] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn replica_count(&self) -> usize {
        self.slots.len() - 1
    }
}

impl<C: PhysicalDb> fmt::Debug for LogicalDb<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalDb")
            .field("driver", &self.driver())
            .field("replicas", &self.replica_count())
            .field("reads", &self.selector.count())
            .finish()
    }
}
