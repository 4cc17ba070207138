//! Recording test double for the physical database traits.
//!
//! A data source name is `<name>` or `<name>?fail=<op>,<op>`; every listed
//! operation fails on that slot. Every call is recorded in a shared
//! [`CallLog`] as `(name, op)`.

#![allow(dead_code)]

use async_trait::async_trait;
use replidb::{
    Connector, Context, DbError, ExecResult, PhysicalDb, PhysicalStmt, Result, TxOptions, Value,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl CallLog {
    pub fn record(&self, target: &str, op: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), op.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Targets that saw `op`, in call order.
    pub fn targets_for(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, o)| o == op)
            .map(|(t, _)| t)
            .collect()
    }

    pub fn count(&self, target: &str, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(t, o)| t == target && o == op)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn parse_dsn(dsn: &str) -> (String, HashSet<String>) {
    match dsn.split_once("?fail=") {
        Some((name, ops)) => (
            name.to_string(),
            ops.split(',').map(str::to_string).collect(),
        ),
        None => (dsn.to_string(), HashSet::new()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub log: CallLog,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Db = FakeDb;

    async fn open(&self, driver_name: &str, data_source_name: &str) -> Result<FakeDb> {
        let (name, fails) = parse_dsn(data_source_name);
        self.log.record(&name, "open");

        if fails.contains("open") {
            return Err(DbError::Connection(format!("{}: open refused", name)));
        }

        Ok(FakeDb::new(driver_name, &name, fails, self.log.clone()))
    }
}

/// What a fake query or execution ran and where.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub target: String,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeTx {
    pub target: String,
    pub opts: Option<TxOptions>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuning {
    pub max_idle_conns: Option<usize>,
    pub max_open_conns: Option<usize>,
    pub conn_max_lifetime: Option<Option<Duration>>,
}

#[derive(Debug)]
pub struct FakeDb {
    driver: String,
    name: String,
    fails: HashSet<String>,
    log: CallLog,
    tuning: Mutex<Tuning>,
}

impl FakeDb {
    pub fn new(driver: &str, name: &str, fails: HashSet<String>, log: CallLog) -> Self {
        Self {
            driver: driver.to_string(),
            name: name.to_string(),
            fails,
            log,
            tuning: Mutex::new(Tuning::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning.lock().unwrap().clone()
    }

    fn hit(&self, op: &str) -> Result<()> {
        self.log.record(&self.name, op);
        if self.fails.contains(op) {
            return Err(DbError::Execution(format!("{}: {} failed", self.name, op)));
        }
        Ok(())
    }

    fn hit_with(&self, ctx: &Context, op: &str) -> Result<()> {
        self.hit(op)?;
        match ctx.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn served(&self, sql: &str, params: &[Value]) -> Served {
        Served {
            target: self.name.clone(),
            sql: sql.to_string(),
            params: params.to_vec(),
        }
    }

    fn stmt(&self, sql: &str) -> FakeStmt {
        FakeStmt {
            target: self.name.clone(),
            sql: sql.to_string(),
            fails: self.fails.clone(),
            log: self.log.clone(),
        }
    }
}

#[async_trait]
impl PhysicalDb for FakeDb {
    type Tx = FakeTx;
    type Rows = Served;
    type Row = Served;
    type Stmt = FakeStmt;

    fn driver(&self) -> &str {
        &self.driver
    }

    async fn close(&self) -> Result<()> {
        self.hit("close")
    }

    async fn ping(&self) -> Result<()> {
        self.hit("ping")
    }

    async fn ping_with(&self, ctx: &Context) -> Result<()> {
        self.hit_with(ctx, "ping_with")
    }

    async fn begin(&self) -> Result<FakeTx> {
        self.hit("begin")?;
        Ok(FakeTx {
            target: self.name.clone(),
            opts: None,
        })
    }

    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<FakeTx> {
        self.hit_with(ctx, "begin_tx")?;
        Ok(FakeTx {
            target: self.name.clone(),
            opts: Some(*opts),
        })
    }

    async fn execute(&self, _sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.hit("execute")?;
        Ok(ExecResult::new(params.len() as u64))
    }

    async fn execute_with(&self, ctx: &Context, _sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.hit_with(ctx, "execute_with")?;
        Ok(ExecResult::new(params.len() as u64))
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Served> {
        self.hit("query")?;
        Ok(self.served(sql, params))
    }

    async fn query_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<Served> {
        self.hit_with(ctx, "query_with")?;
        Ok(self.served(sql, params))
    }

    async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Served> {
        self.hit("query_row")?;
        Ok(self.served(sql, params))
    }

    async fn query_row_with(&self, ctx: &Context, sql: &str, params: &[Value]) -> Result<Served> {
        self.hit_with(ctx, "query_row_with")?;
        Ok(self.served(sql, params))
    }

    async fn prepare(&self, sql: &str) -> Result<FakeStmt> {
        self.hit("prepare")?;
        Ok(self.stmt(sql))
    }

    async fn prepare_with(&self, ctx: &Context, sql: &str) -> Result<FakeStmt> {
        self.hit_with(ctx, "prepare_with")?;
        Ok(self.stmt(sql))
    }

    fn set_max_idle_conns(&self, n: usize) {
        self.log.record(&self.name, "set_max_idle_conns");
        self.tuning.lock().unwrap().max_idle_conns = Some(n);
    }

    fn set_max_open_conns(&self, n: usize) {
        self.log.record(&self.name, "set_max_open_conns");
        self.tuning.lock().unwrap().max_open_conns = Some(n);
    }

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        self.log.record(&self.name, "set_conn_max_lifetime");
        self.tuning.lock().unwrap().conn_max_lifetime = Some(lifetime);
    }
}

#[derive(Debug)]
pub struct FakeStmt {
    target: String,
    sql: String,
    fails: HashSet<String>,
    log: CallLog,
}

impl FakeStmt {
    fn hit(&self, op: &str) -> Result<()> {
        self.log.record(&self.target, op);
        if self.fails.contains(op) {
            return Err(DbError::Execution(format!("{}: {} failed", self.target, op)));
        }
        Ok(())
    }

    fn served(&self, params: &[Value]) -> Served {
        Served {
            target: self.target.clone(),
            sql: self.sql.clone(),
            params: params.to_vec(),
        }
    }
}

#[async_trait]
impl PhysicalStmt for FakeStmt {
    type Rows = Served;
    type Row = Served;

    async fn execute(&self, params: &[Value]) -> Result<ExecResult> {
        self.hit("stmt_execute")?;
        Ok(ExecResult::new(params.len() as u64))
    }

    async fn execute_with(&self, ctx: &Context, params: &[Value]) -> Result<ExecResult> {
        self.hit("stmt_execute_with")?;
        ctx.err().map_or(Ok(ExecResult::new(params.len() as u64)), Err)
    }

    async fn query(&self, params: &[Value]) -> Result<Served> {
        self.hit("stmt_query")?;
        Ok(self.served(params))
    }

    async fn query_with(&self, ctx: &Context, params: &[Value]) -> Result<Served> {
        self.hit("stmt_query_with")?;
        ctx.err().map_or(Ok(self.served(params)), Err)
    }

    async fn query_row(&self, params: &[Value]) -> Result<Served> {
        self.hit("stmt_query_row")?;
        Ok(self.served(params))
    }

    async fn query_row_with(&self, ctx: &Context, params: &[Value]) -> Result<Served> {
        self.hit("stmt_query_row_with")?;
        ctx.err().map_or(Ok(self.served(params)), Err)
    }

    async fn close(&self) -> Result<()> {
        self.hit("stmt_close")
    }
}
