use crate::engine::DiscoveryStatus;
use thiserror::Error;

/// Why a probe produced no result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("cannot initialize analysis engine")]
    EngineInitFailed,

    /// Message reported by the engine, verbatim.
    #[error("{0}")]
    Engine(String),

    #[error("analysis finished with status {0}")]
    ResultNotOk(DiscoveryStatus),

    #[error("cannot retrieve stream info")]
    NoStreamInfo,
}

/// Rejected before any background work is scheduled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("uri must not be empty")]
    EmptyUri,

    #[error("timeout must be at least one second")]
    ZeroTimeout,
}
