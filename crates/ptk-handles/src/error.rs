use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("null or otherwise invalid object passed to make()")]
    InvalidParam,
    #[error("handle table is full")]
    NoResources,
    #[error("acquire timed out waiting for the slot's lock")]
    Timeout,
    #[error("stale or out-of-range handle")]
    Invalid,
}
