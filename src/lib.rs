// ============================================================================
// replidb Library
// ============================================================================

//! One logical database handle over a primary and its replicas.
//!
//! Writes and transactions go to the primary, reads rotate across the
//! replicas, and lifecycle calls fan out to every physical database at once.
//! The physical databases themselves are supplied through the
//! [`Connector`] / [`PhysicalDb`] / [`PhysicalStmt`] traits.

pub mod config;
pub mod context;
pub mod core;
pub mod facade;
pub mod interface;
pub mod routing;

// Re-export main types for convenience
pub use config::ClusterConfig;
pub use context::{CancelHandle, Context};
pub use crate::core::{DbError, ExecResult, IsolationLevel, MultiError, Result, TxOptions, Value};
pub use facade::{LogicalDb, Stmt};
pub use interface::{Connector, PhysicalDb, PhysicalStmt};
pub use routing::ReplicaSelector;
