use molbench::core::models::collection::CollectionError;
use molbench::engine::error::EngineError;
use molbench::storage::error::StoreError;
use molbench::workflows::minimize::WorkflowError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
