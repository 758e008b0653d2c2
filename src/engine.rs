//! Interface to the native stream engine.
//!
//! The engine itself is an external collaborator: a sample-accurate DSP
//! backend running its own audio callback thread. This crate never looks
//! inside it. Everything the control layer needs is expressed here as opaque
//! per-channel stream handles plus a small set of primitive operations.
//!
//! Engines are shared as [`EngineRef`] and passed explicitly into every
//! component that talks to them; there is no ambient global engine.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Opaque identifier for one per-channel stream inside the native engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StreamId(pub u64);

/// Opaque identifier for one sample buffer inside the native engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TableId(pub u64);

/// Shared handle to a stream engine.
pub type EngineRef = Arc<dyn StreamEngine>;

/// Elementwise binary operations the engine performs between streams.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        f.write_str(s)
    }
}

/// A resolved parameter operand: either a plain value or the live signal of
/// an existing stream.
///
/// Engine parameter setters accept both, so a node's `mul`/`add` can be
/// driven by another node's output without this layer touching samples.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Operand {
    Value(f64),
    Stream(StreamId),
}

impl Operand {
    /// Collapse to a plain value, reading the stream's current sample when
    /// the operand is a live signal.
    pub fn scalar(&self, engine: &dyn StreamEngine) -> Result<f64, EngineError> {
        match self {
            Operand::Value(v) => Ok(*v),
            Operand::Stream(s) => engine.get_value(*s),
        }
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Value(v)
    }
}

impl From<StreamId> for Operand {
    fn from(s: StreamId) -> Self {
        Operand::Stream(s)
    }
}

/// Primitive stream shapes the control layer asks the engine to construct.
#[derive(Clone, Debug)]
pub enum StreamSpec {
    /// Constant-valued signal (the `Sig` primitive).
    Const {
        value: Operand,
        mul: Operand,
        add: Operand,
    },
    /// Constant-valued signal whose value changes are smoothed over `time`
    /// seconds (the `SigTo` primitive).
    Ramped {
        value: Operand,
        time: f64,
        init: f64,
        mul: Operand,
        add: Operand,
    },
    /// Sum of existing streams (one mix bucket). The engine reads the input
    /// streams; ownership stays with the nodes that created them.
    Sum { inputs: Vec<StreamId> },
    /// Crossfading pass-through of another stream.
    Fader { input: StreamId },
}

/// Errors reported by the native engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown stream {0:?}")]
    UnknownStream(StreamId),
    #[error("unknown table {0:?}")]
    UnknownTable(TableId),
    #[error("engine backend: {0}")]
    Backend(String),
}

/// The native stream engine, as consumed by this crate.
///
/// Implementations must make every method safe to call from any thread; the
/// control layer relies on that contract instead of adding its own locking.
/// `play`/`stop` are idempotent. [`route_out`](StreamEngine::route_out) both
/// starts the stream and routes it to a physical output channel.
pub trait StreamEngine: Send + Sync {
    /// Build a new stream from one of the primitive shapes.
    fn construct(&self, spec: StreamSpec) -> Result<StreamId, EngineError>;

    /// Begin processing without routing to a physical output.
    fn play(&self, stream: StreamId) -> Result<(), EngineError>;

    /// Halt processing.
    fn stop(&self, stream: StreamId) -> Result<(), EngineError>;

    /// Begin processing and route the stream to physical output `channel`.
    fn route_out(&self, stream: StreamId, channel: usize) -> Result<(), EngineError>;

    /// Release a stream. Releasing an unknown id is a no-op; handles are
    /// released exactly once by their owner.
    fn delete_stream(&self, stream: StreamId);

    fn set_mul(&self, stream: StreamId, x: Operand) -> Result<(), EngineError>;
    fn set_add(&self, stream: StreamId, x: Operand) -> Result<(), EngineError>;

    /// Inverse-sense additive parameter: the engine computes `signal - x`.
    fn set_sub(&self, stream: StreamId, x: Operand) -> Result<(), EngineError>;

    /// Inverse-sense multiplicative parameter: the engine computes
    /// `signal / x`.
    fn set_div(&self, stream: StreamId, x: Operand) -> Result<(), EngineError>;

    /// Change the target value of a `Const` or `Ramped` stream.
    fn set_value(&self, stream: StreamId, x: Operand) -> Result<(), EngineError>;

    /// Change the ramp time of a `Ramped` stream.
    fn set_time(&self, stream: StreamId, seconds: f64) -> Result<(), EngineError>;

    /// Swap a `Fader` stream's input, crossfading over `fadetime` seconds.
    fn set_fader_input(
        &self,
        fader: StreamId,
        input: StreamId,
        fadetime: f64,
    ) -> Result<(), EngineError>;

    /// Current sample of a stream, as a synchronous read-back.
    fn get_value(&self, stream: StreamId) -> Result<f64, EngineError>;

    /// Build a new stream computing `lhs <op> rhs` elementwise.
    fn combine(&self, op: BinOp, lhs: StreamId, rhs: Operand) -> Result<StreamId, EngineError>;

    /// Number of physical output channels. Output routing wraps at this.
    fn output_channels(&self) -> usize;

    /// Allocate a zero-filled sample buffer of `size` frames.
    fn alloc_table(&self, size: usize) -> Result<TableId, EngineError>;

    /// Copy of a table's contents.
    fn table_data(&self, table: TableId) -> Result<Vec<f64>, EngineError>;

    /// Replace a table's contents, resizing it to `data.len()`.
    fn set_table_data(&self, table: TableId, data: &[f64]) -> Result<(), EngineError>;

    /// Scale a table's samples so the largest magnitude is 1.
    fn normalize_table(&self, table: TableId) -> Result<(), EngineError>;

    /// Release a table. Releasing an unknown id is a no-op.
    fn delete_table(&self, table: TableId);
}
