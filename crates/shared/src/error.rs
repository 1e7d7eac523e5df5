use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("unknown appointment status '{0}', expected one of PENDING, CONFIRMED, COMPLETED, CANCELLED")]
    UnknownStatus(String),
    #[error("unknown status filter '{0}', expected one of all, pending, confirmed, completed, cancelled")]
    UnknownStatusSelector(String),
    #[error("unknown time window '{0}', expected one of all, today, week, month")]
    UnknownTimeWindow(String),
}
