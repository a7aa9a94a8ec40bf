//! Runtime errors.

use prox_broker::BrokerError;
use prox_history::HistoryError;
use prox_jobs::JobError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("body '{0}' is already registered")]
    DuplicateBody(String),

    #[error("body '{0}' is not present in the registry")]
    BodyNotFound(String),

    #[error(transparent)]
    Body(#[from] prox_body::BodyError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
