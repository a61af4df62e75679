use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("operation only valid while the thread descriptor is in NEW state")]
    InvalidState,
    #[error("OS thread spawn failed")]
    NoResources,
    #[error("run function already bound")]
    RunAlreadySet,
    #[error("signal bridge already installed for this root")]
    BridgeAlreadyInstalled,
}
