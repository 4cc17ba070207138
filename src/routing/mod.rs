//! Slot routing primitives shared by the logical database and its statements.

pub mod scatter;
pub mod selector;

pub use scatter::{collect, scatter, scatter_all, split};
pub use selector::ReplicaSelector;
