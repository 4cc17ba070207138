use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Prepare error: {0}")]
    Prepare(String),

    #[error("Database is closed")]
    Closed,

    #[error("Context cancelled")]
    Cancelled,

    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logical database needs at least one physical database")]
    NoSlots,

    #[error("Slot {slot} task failed: {reason}")]
    TaskFailed { slot: usize, reason: String },

    #[error(transparent)]
    Multi(MultiError),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True when this error aggregates failures from more than one physical database.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Every underlying cause, in slot order.
    ///
    /// A plain error is its own single cause.
    pub fn causes(&self) -> &[DbError] {
        match self {
            Self::Multi(multi) => multi.errors(),
            other => std::slice::from_ref(other),
        }
    }

    /// Fold a list of failures into one error.
    ///
    /// Returns `None` for an empty list, the error itself for a single failure,
    /// and `Multi` otherwise.
    pub fn combine(mut errors: Vec<DbError>) -> Option<DbError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multi(MultiError { errors })),
        }
    }
}

/// Failures collected from several physical databases during one fan-out call.
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<DbError>,
}

impl MultiError {
    pub fn errors(&self) -> &[DbError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<DbError> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
