use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// The initial state dump lacks the `constants` entry; no meaningful
    /// snapshot can be built. Fatal at startup.
    #[error("required constants entry missing from initial state")]
    MissingConstants,

    /// No ledger state has been received yet.
    #[error("mirror not initialized")]
    NotInitialized,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
