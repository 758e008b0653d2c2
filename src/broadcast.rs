//! Argument broadcasting: scalars, lists and nodes expanded into matched
//! per-channel parameter sets.
//!
//! Every constructor and setter in this crate accepts mixed arguments - a
//! plain number, a list of numbers, or another signal node - and builds one
//! processing unit per channel. [`broadcast`] normalizes the arguments and
//! reports the channel cardinality; [`Spread::wrap`] then resolves the
//! effective value for each channel with cyclic indexing, so shorter lists
//! repeat instead of erroring.

use crate::engine::{Operand, StreamId};

/// Read-only projection of a node's live channel signals.
///
/// Holds copies of the node's stream ids, never ownership: referencing a
/// node's values at the graph level is allowed, sharing its handles is not.
#[derive(Clone, PartialEq, Debug)]
pub struct NodeRef {
    ids: Vec<StreamId>,
}

impl NodeRef {
    pub(crate) fn new(ids: Vec<StreamId>) -> Self {
        debug_assert!(!ids.is_empty(), "a node always has at least one channel");
        NodeRef { ids }
    }

    pub fn channels(&self) -> usize {
        self.ids.len()
    }

    /// Stream carrying channel `i % channels`'s live signal.
    pub fn stream(&self, i: usize) -> StreamId {
        self.ids[i % self.ids.len()]
    }

    /// First-channel projection: the single stream a whole node reduces to
    /// when it appears as one scalar parameter.
    pub fn first(&self) -> StreamId {
        self.ids[0]
    }
}

/// One element of a broadcast list.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Num(f64),
    /// A node used as a per-channel scalar parameter; it is reduced to its
    /// first channel, not spread.
    Node(NodeRef),
}

impl Value {
    fn resolve(&self) -> Operand {
        match self {
            Value::Num(v) => Operand::Value(*v),
            Value::Node(r) => Operand::Stream(r.first()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<NodeRef> for Value {
    fn from(r: NodeRef) -> Self {
        Value::Node(r)
    }
}

/// A constructor or setter argument before broadcasting.
#[derive(Clone, PartialEq, Debug)]
pub enum Arg {
    Num(f64),
    List(Vec<Value>),
    /// A whole node: spreads across channels, one live signal per channel.
    Node(NodeRef),
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Num(v)
    }
}

impl From<Vec<f64>> for Arg {
    fn from(v: Vec<f64>) -> Self {
        Arg::List(v.into_iter().map(Value::Num).collect())
    }
}

impl From<&[f64]> for Arg {
    fn from(v: &[f64]) -> Self {
        Arg::List(v.iter().copied().map(Value::Num).collect())
    }
}

impl From<Vec<Value>> for Arg {
    fn from(v: Vec<Value>) -> Self {
        Arg::List(v)
    }
}

impl From<NodeRef> for Arg {
    fn from(r: NodeRef) -> Self {
        Arg::Node(r)
    }
}

/// One broadcast position: the resolved value list a channel index wraps
/// into.
#[derive(Clone, Debug)]
pub enum Spread {
    List(Vec<Value>),
    Node(NodeRef),
}

impl Spread {
    pub fn len(&self) -> usize {
        match self {
            Spread::List(vals) => vals.len(),
            Spread::Node(r) => r.channels(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Effective value for channel `i`: index `i % len`, never out of range
    /// for any non-empty list. Node elements reduce to their first channel's
    /// live signal; a whole-node spread yields channel `i % channels`.
    ///
    /// # Panics
    ///
    /// Panics on an empty list. An empty broadcast list is a caller contract
    /// violation (the wrap index is undefined), rejected here explicitly
    /// rather than left to a modulo-by-zero.
    pub fn wrap(&self, i: usize) -> Operand {
        match self {
            Spread::List(vals) => {
                assert!(!vals.is_empty(), "cannot broadcast over an empty list");
                vals[i % vals.len()].resolve()
            }
            Spread::Node(r) => Operand::Stream(r.stream(i)),
        }
    }
}

/// Normalize mixed arguments into per-argument spreads plus the maximum
/// length across them - the number of per-channel units to construct.
///
/// Plain numbers lift to one-element lists; lists and nodes pass through
/// unchanged (a node's length is its channel count).
///
/// # Panics
///
/// Panics when called with no arguments or with an empty list argument.
pub fn broadcast(args: Vec<Arg>) -> (Vec<Spread>, usize) {
    let spreads: Vec<Spread> = args
        .into_iter()
        .map(|arg| match arg {
            Arg::Num(v) => Spread::List(vec![Value::Num(v)]),
            Arg::List(vals) => {
                assert!(!vals.is_empty(), "cannot broadcast over an empty list");
                Spread::List(vals)
            }
            Arg::Node(r) => Spread::Node(r),
        })
        .collect();

    let max_len = spreads
        .iter()
        .map(Spread::len)
        .max()
        .expect("broadcast requires at least one argument");
    (spreads, max_len)
}
