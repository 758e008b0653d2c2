//! Signal node abstraction: stream ownership, lifecycle, parameter
//! broadcasting and the arithmetic composition algebra.
//!
//! Every composable object in this crate implements [`SignalNode`]: it owns
//! one [`ChannelSet`] - an ordered group of engine streams whose length
//! never changes after construction - plus the `mul`/`add` attributes
//! applied per channel. Nodes reference each other's *values* through
//! [`NodeRef`] projections, never each other's handles, so the dependency
//! graph needs no locking in this layer.
//!
//! Arithmetic composition comes in two deliberately distinct kinds:
//!
//! - [`combine`](SignalNode::combine) / [`combine_rev`](SignalNode::combine_rev)
//!   build a new [`Composite`] and leave both operands untouched;
//! - [`mutate`](SignalNode::mutate) replaces the receiver's own `mul`/`add`
//!   attribute in place (the `+=` family).

use std::any::type_name;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::broadcast::{broadcast, Arg, NodeRef};
use crate::engine::{BinOp, EngineRef, Operand, StreamId, StreamSpec};
use crate::error::{Error, Result};
use crate::nodes::Mix;

/// Exclusive ownership of one engine stream.
///
/// The stream is released exactly once, when the `Stream` drops, whether or
/// not it was ever played.
pub struct Stream {
    engine: EngineRef,
    id: StreamId,
}

impl Stream {
    pub(crate) fn new(engine: EngineRef, id: StreamId) -> Self {
        Stream { engine, id }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Current sample, read synchronously from the engine.
    pub fn value(&self) -> Result<f64> {
        Ok(self.engine.get_value(self.id)?)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.engine.delete_stream(self.id);
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Stream").field(&self.id).finish()
    }
}

/// The ordered per-channel streams owned by one signal node, plus its
/// `mul`/`add` attributes.
///
/// A channel set is exclusively owned: no two nodes ever share a stream
/// handle. Its length is fixed at construction; parameter updates replace
/// values stream by stream, never by resizing.
pub struct ChannelSet {
    engine: EngineRef,
    streams: Vec<Stream>,
    mul: Arg,
    add: Arg,
}

impl ChannelSet {
    pub fn new(engine: EngineRef, streams: Vec<Stream>) -> Self {
        Self::with_attrs(engine, streams, Arg::Num(1.0), Arg::Num(0.0))
    }

    pub fn with_attrs(engine: EngineRef, streams: Vec<Stream>, mul: Arg, add: Arg) -> Self {
        ChannelSet {
            engine,
            streams,
            mul,
            add,
        }
    }

    pub fn engine(&self) -> &EngineRef {
        &self.engine
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Indexed channel access; out-of-range indices are a reported error,
    /// not a crash.
    pub fn stream(&self, i: usize) -> Result<&Stream> {
        self.streams.get(i).ok_or(Error::ChannelOutOfRange {
            index: i,
            count: self.streams.len(),
        })
    }

    pub fn ids(&self) -> Vec<StreamId> {
        self.streams.iter().map(Stream::id).collect()
    }

    /// Read-only projection of the live channel signals.
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.ids())
    }

    /// The `mul` attribute as last set.
    pub fn mul(&self) -> &Arg {
        &self.mul
    }

    /// The `add` attribute as last set.
    pub fn add(&self) -> &Arg {
        &self.add
    }

    pub fn play_all(&mut self) -> Result<()> {
        for s in &self.streams {
            self.engine.play(s.id())?;
        }
        Ok(())
    }

    pub fn stop_all(&mut self) -> Result<()> {
        for s in &self.streams {
            self.engine.stop(s.id())?;
        }
        Ok(())
    }

    /// Route every channel to a physical output, starting at `chnl` and
    /// stepping by `inc`, wrapping at the engine's physical channel count.
    /// A negative `chnl` randomly permutes the channel-to-output assignment
    /// first, then assigns sequentially from 0.
    pub fn route_out(&mut self, chnl: i32, inc: usize) -> Result<()> {
        let physical = self.engine.output_channels().max(1);
        let mut order: Vec<usize> = (0..self.streams.len()).collect();
        if chnl < 0 {
            order.shuffle(&mut rand::thread_rng());
        }
        let first = chnl.max(0) as usize;
        for (i, si) in order.into_iter().enumerate() {
            let id = self.streams[si].id();
            self.engine.route_out(id, (first + i * inc) % physical)?;
        }
        debug!(
            channels = self.streams.len(),
            first, inc, "routed to physical outputs"
        );
        Ok(())
    }

    /// Replace the `mul` attribute, broadcasting across channels.
    pub fn set_mul(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for (i, s) in self.streams.iter().enumerate() {
            self.engine.set_mul(s.id(), spreads[0].wrap(i))?;
        }
        self.mul = x;
        Ok(())
    }

    /// Replace the `add` attribute, broadcasting across channels.
    pub fn set_add(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for (i, s) in self.streams.iter().enumerate() {
            self.engine.set_add(s.id(), spreads[0].wrap(i))?;
        }
        self.add = x;
        Ok(())
    }

    /// Replace the `add` attribute with subtract-from sense: the engine is
    /// told to compute `signal - x` instead of negating locally.
    pub fn set_sub(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for (i, s) in self.streams.iter().enumerate() {
            self.engine.set_sub(s.id(), spreads[0].wrap(i))?;
        }
        self.add = x;
        Ok(())
    }

    /// Replace the `mul` attribute with divide-into sense: the engine is
    /// told to compute `signal / x`.
    pub fn set_div(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for (i, s) in self.streams.iter().enumerate() {
            self.engine.set_div(s.id(), spreads[0].wrap(i))?;
        }
        self.mul = x;
        Ok(())
    }

    /// Current sample of channel `i`.
    pub fn current(&self, i: usize) -> Result<f64> {
        Ok(self.engine.get_value(self.stream(i)?.id())?)
    }

    /// Current sample of every channel.
    pub fn current_all(&self) -> Result<Vec<f64>> {
        self.streams.iter().map(Stream::value).collect()
    }
}

/// The contract every composable signal object implements.
///
/// Implementors expose their [`ChannelSet`]; everything else is provided.
/// Engine failures propagate unmodified through every method.
pub trait SignalNode {
    fn channels(&self) -> &ChannelSet;
    fn channels_mut(&mut self) -> &mut ChannelSet;

    /// Number of audio channels.
    fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Stream id of channel `i`; out of `[0, count)` is a reported error.
    fn channel(&self, i: usize) -> Result<StreamId> {
        Ok(self.channels().stream(i)?.id())
    }

    /// Read-only projection of this node's live channel signals.
    fn node_ref(&self) -> NodeRef {
        self.channels().node_ref()
    }

    /// This node as a broadcastable argument.
    fn as_arg(&self) -> Arg {
        Arg::Node(self.node_ref())
    }

    /// Whether this node's output may be routed to physical outputs.
    /// Control-rate value nodes override this to `false`.
    fn routable(&self) -> bool {
        true
    }

    /// Begin processing without routing to a physical output. Idempotent.
    fn play(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.channels_mut().play_all()?;
        Ok(self)
    }

    /// Halt processing. Idempotent.
    fn stop(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.channels_mut().stop_all()?;
        Ok(self)
    }

    /// Begin processing and route each channel to a physical output,
    /// starting at `chnl`, stepping by `inc`, wrapping at the engine's
    /// channel count. Negative `chnl` scrambles the assignment.
    fn out(&mut self, chnl: i32, inc: usize) -> Result<&mut Self>
    where
        Self: Sized,
    {
        if !self.routable() {
            return Err(Error::NotRoutable);
        }
        self.channels_mut().route_out(chnl, inc)?;
        Ok(self)
    }

    /// First sample of channel 0, read synchronously.
    fn current(&self) -> Result<f64> {
        self.channels().current(0)
    }

    /// First sample of every channel.
    fn current_all(&self) -> Result<Vec<f64>> {
        self.channels().current_all()
    }

    /// Mix this node's channels into `voices` channels (clamped to
    /// `[1, channel_count]`) and return the new [`Mix`] node.
    fn mix(&self, voices: usize) -> Result<Mix>
    where
        Self: Sized,
    {
        Mix::new(self, voices)
    }

    /// Replace the `mul` attribute, broadcasting `x` across channels.
    fn set_mul(&mut self, x: Arg) -> Result<()> {
        self.channels_mut().set_mul(x)
    }

    /// Replace the `add` attribute, broadcasting `x` across channels.
    fn set_add(&mut self, x: Arg) -> Result<()> {
        self.channels_mut().set_add(x)
    }

    /// Replace the `add` attribute with subtract-from sense.
    fn set_sub(&mut self, x: Arg) -> Result<()> {
        self.channels_mut().set_sub(x)
    }

    /// Replace the `mul` attribute with divide-into sense.
    fn set_div(&mut self, x: Arg) -> Result<()> {
        self.channels_mut().set_div(x)
    }

    /// Set a parameter by name. The base vocabulary is `mul` and `add`;
    /// node types with more parameters extend it.
    fn set_param(&mut self, name: &str, value: Arg) -> Result<()> {
        match name {
            "mul" => self.set_mul(value),
            "add" => self.set_add(value),
            _ => Err(Error::UnknownParam(name.to_string())),
        }
    }

    /// Non-mutating combination: a new [`Composite`] whose channel `i` is
    /// `self[i] <op> wrap(rhs, i)`, computed by the engine. Neither operand
    /// is modified.
    fn combine(&self, op: BinOp, rhs: Arg) -> Result<Composite> {
        let (spreads, _) = broadcast(vec![rhs]);
        let cs = self.channels();
        let engine = cs.engine().clone();
        let mut streams = Vec::with_capacity(cs.len());
        for i in 0..cs.len() {
            let id = engine.combine(op, cs.stream(i)?.id(), spreads[0].wrap(i))?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(Composite::new(ChannelSet::new(engine, streams), Vec::new()))
    }

    /// Reflected non-mutating combination: channel `i` is
    /// `wrap(lhs, i) <op> self[i]`. A plain number on the left is first
    /// lifted into a constant stream so the engine combines two operands of
    /// the same kind; the result owns the lifted streams.
    fn combine_rev(&self, op: BinOp, lhs: Arg) -> Result<Composite> {
        let (spreads, _) = broadcast(vec![lhs]);
        let cs = self.channels();
        let engine = cs.engine().clone();
        let mut streams = Vec::with_capacity(cs.len());
        let mut lifted = Vec::new();
        for i in 0..cs.len() {
            let left = match spreads[0].wrap(i) {
                Operand::Value(v) => {
                    let id = engine.construct(StreamSpec::Const {
                        value: Operand::Value(v),
                        mul: Operand::Value(1.0),
                        add: Operand::Value(0.0),
                    })?;
                    lifted.push(Stream::new(engine.clone(), id));
                    id
                }
                Operand::Stream(id) => id,
            };
            let rhs = Operand::Stream(cs.stream(i)?.id());
            let id = engine.combine(op, left, rhs)?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(Composite::new(ChannelSet::new(engine, streams), lifted))
    }

    /// In-place combination (the `+=` family). Unlike
    /// [`combine`](Self::combine) this *does* mutate the receiver: it
    /// replaces the `add` attribute for `Add`/`Sub` and the `mul` attribute
    /// for `Mul`/`Div`, with inverse sense for `Sub`/`Div`.
    fn mutate(&mut self, op: BinOp, x: Arg) -> Result<()> {
        match op {
            BinOp::Add => self.set_add(x),
            BinOp::Sub => self.set_sub(x),
            BinOp::Mul => self.set_mul(x),
            BinOp::Div => self.set_div(x),
        }
    }

    /// Human-readable status: type, channel count and attributes.
    fn dump(&self) -> String
    where
        Self: Sized,
    {
        let cs = self.channels();
        format!(
            "{}: {} channel(s), mul={:?}, add={:?}",
            type_name::<Self>(),
            cs.len(),
            cs.mul(),
            cs.add()
        )
    }
}

/// Signal node produced by a non-mutating arithmetic combination.
///
/// Owns the combined streams (and any constant streams lifted for reflected
/// forms); the operands keep their own channel sets untouched.
pub struct Composite {
    chans: ChannelSet,
    // Constant streams lifted for reflected combinations; they must live
    // exactly as long as the combined streams that read them.
    #[allow(dead_code)]
    lifted: Vec<Stream>,
}

impl Composite {
    pub(crate) fn new(chans: ChannelSet, lifted: Vec<Stream>) -> Self {
        Composite { chans, lifted }
    }
}

impl SignalNode for Composite {
    fn channels(&self) -> &ChannelSet {
        &self.chans
    }

    fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.chans
    }
}
