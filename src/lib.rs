//! regler - parameter control and signal composition over a native stream
//! engine.
//!
//! Design principles:
//! - The native engine is a black box behind [`StreamEngine`]: opaque
//!   per-channel stream handles, scalar-or-stream parameters, elementwise
//!   combination. Its DSP math and real-time scheduling never leak in here.
//! - Mixed scalar/list/node arguments broadcast into matched per-channel
//!   parameter sets with cyclic indexing, so one call builds N parallel
//!   units.
//! - Arithmetic composition never mutates its operands; in-place mutation
//!   is a separate, explicit entry point.
//! - Engine context is passed explicitly into every component; no ambient
//!   globals.
//!
//! # Example
//!
//! ```
//! use regler::{Arg, BinOp, EngineRef, OfflineEngine, Sig, SignalNode};
//!
//! let engine = OfflineEngine::new(2);
//! let eref: EngineRef = engine.clone();
//!
//! // One call, three channels: the list broadcasts.
//! let mut a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
//! a.play().unwrap();
//!
//! // Non-mutating composition: `b` is a new node, `a` is untouched.
//! let b = a.combine(BinOp::Mul, Arg::from(0.5)).unwrap();
//! assert_eq!(b.current_all().unwrap(), vec![0.5, 1.0, 1.5]);
//! assert_eq!(a.current_all().unwrap(), vec![1.0, 2.0, 3.0]);
//! ```

pub mod broadcast;
pub mod control;
pub mod engine;
pub mod map;
pub mod node;
pub mod nodes;
pub mod offline;
pub mod table;
pub mod teardown;

mod error;

pub use broadcast::{broadcast, Arg, NodeRef, Spread, Value};
pub use control::ControlBinding;
pub use engine::{
    BinOp, EngineError, EngineRef, Operand, StreamEngine, StreamId, StreamSpec, TableId,
};
pub use error::{Error, Result};
pub use map::{ControlMap, ParamMap, Resolution, Scale};
pub use node::{ChannelSet, Composite, SignalNode, Stream};
pub use nodes::{InputFader, Mix, Sig, SigTo};
pub use offline::OfflineEngine;
pub use table::{DataTable, Table, TableSet};
pub use teardown::Teardown;
