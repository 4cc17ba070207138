pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, MultiError, Result};
pub use types::{ExecResult, IsolationLevel, TxOptions};
pub use value::Value;
