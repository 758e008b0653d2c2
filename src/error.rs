//! Crate-wide error type.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors reported by the control layer.
///
/// Native-engine failures are wrapped unmodified; the core adds no retry
/// logic on top of them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Indexed channel access outside `[0, count)`.
    #[error("channel index {index} out of range (node has {count} channels)")]
    ChannelOutOfRange { index: usize, count: usize },

    /// A parameter name no node variant knows about.
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    /// Control-rate value nodes only drive parameters; they never reach
    /// physical outputs.
    #[error("control-rate nodes cannot be routed to physical outputs")]
    NotRoutable,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("table data: {0}")]
    TableData(#[from] serde_json::Error),

    /// A table file that parsed but contained zero channel lists.
    #[error("table file contains no channel data")]
    EmptyTableData,
}

pub type Result<T> = std::result::Result<T, Error>;
