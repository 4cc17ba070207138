pub mod database;
pub mod statement;

pub use database::LogicalDb;
pub use statement::Stmt;
