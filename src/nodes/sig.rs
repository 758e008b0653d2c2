//! Value nodes: constant and ramped control signals.
//!
//! `Sig` turns numbers into engine signals so they can drive other nodes'
//! parameters; `SigTo` does the same but smooths every value change over a
//! ramp time. Neither can be routed to physical outputs.

use crate::broadcast::{broadcast, Arg};
use crate::engine::{EngineRef, StreamSpec};
use crate::error::{Error, Result};
use crate::node::{ChannelSet, SignalNode, Stream};

/// Constant-valued signal node.
///
/// A scalar or broadcast list becomes one constant engine stream per
/// channel. Exists to feed other nodes' parameters; `out` is disallowed.
pub struct Sig {
    chans: ChannelSet,
    value: Arg,
}

impl Sig {
    pub fn new(engine: &EngineRef, value: impl Into<Arg>) -> Result<Self> {
        Self::with_attrs(engine, value.into(), Arg::Num(1.0), Arg::Num(0.0))
    }

    pub fn with_attrs(engine: &EngineRef, value: Arg, mul: Arg, add: Arg) -> Result<Self> {
        let (spreads, n) = broadcast(vec![value.clone(), mul.clone(), add.clone()]);
        let mut streams = Vec::with_capacity(n);
        for i in 0..n {
            let id = engine.construct(StreamSpec::Const {
                value: spreads[0].wrap(i),
                mul: spreads[1].wrap(i),
                add: spreads[2].wrap(i),
            })?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(Sig {
            chans: ChannelSet::with_attrs(engine.clone(), streams, mul, add),
            value,
        })
    }

    /// The `value` attribute as last set.
    pub fn value(&self) -> &Arg {
        &self.value
    }

    /// Replace the signal's value, broadcasting across channels.
    pub fn set_value(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for i in 0..self.chans.len() {
            let id = self.chans.stream(i)?.id();
            self.chans.engine().set_value(id, spreads[0].wrap(i))?;
        }
        self.value = x;
        Ok(())
    }
}

impl SignalNode for Sig {
    fn channels(&self) -> &ChannelSet {
        &self.chans
    }

    fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.chans
    }

    fn routable(&self) -> bool {
        false
    }

    fn set_param(&mut self, name: &str, value: Arg) -> Result<()> {
        match name {
            "value" => self.set_value(value),
            "mul" => self.set_mul(value),
            "add" => self.set_add(value),
            _ => Err(Error::UnknownParam(name.to_string())),
        }
    }
}

/// Ramped value node.
///
/// Like [`Sig`], but value changes glide from the current value to the new
/// target over `time` seconds instead of stepping; `init` seeds the
/// internal memory the first ramp starts from.
pub struct SigTo {
    chans: ChannelSet,
    value: Arg,
    time: Arg,
}

impl SigTo {
    pub fn new(
        engine: &EngineRef,
        value: impl Into<Arg>,
        time: impl Into<Arg>,
        init: impl Into<Arg>,
    ) -> Result<Self> {
        Self::with_attrs(
            engine,
            value.into(),
            time.into(),
            init.into(),
            Arg::Num(1.0),
            Arg::Num(0.0),
        )
    }

    pub fn with_attrs(
        engine: &EngineRef,
        value: Arg,
        time: Arg,
        init: Arg,
        mul: Arg,
        add: Arg,
    ) -> Result<Self> {
        let (spreads, n) = broadcast(vec![
            value.clone(),
            time.clone(),
            init,
            mul.clone(),
            add.clone(),
        ]);
        let mut streams = Vec::with_capacity(n);
        for i in 0..n {
            let id = engine.construct(StreamSpec::Ramped {
                value: spreads[0].wrap(i),
                time: spreads[1].wrap(i).scalar(engine.as_ref())?,
                init: spreads[2].wrap(i).scalar(engine.as_ref())?,
                mul: spreads[3].wrap(i),
                add: spreads[4].wrap(i),
            })?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(SigTo {
            chans: ChannelSet::with_attrs(engine.clone(), streams, mul, add),
            value,
            time,
        })
    }

    /// The target value as last set.
    pub fn value(&self) -> &Arg {
        &self.value
    }

    /// The ramp time as last set.
    pub fn time(&self) -> &Arg {
        &self.time
    }

    /// Change the target value; the engine ramps to it over the current
    /// ramp time.
    pub fn set_value(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for i in 0..self.chans.len() {
            let id = self.chans.stream(i)?.id();
            self.chans.engine().set_value(id, spreads[0].wrap(i))?;
        }
        self.value = x;
        Ok(())
    }

    /// Change the ramp time, broadcasting across channels.
    pub fn set_time(&mut self, x: Arg) -> Result<()> {
        let (spreads, _) = broadcast(vec![x.clone()]);
        for i in 0..self.chans.len() {
            let id = self.chans.stream(i)?.id();
            let seconds = spreads[0].wrap(i).scalar(self.chans.engine().as_ref())?;
            self.chans.engine().set_time(id, seconds)?;
        }
        self.time = x;
        Ok(())
    }
}

impl SignalNode for SigTo {
    fn channels(&self) -> &ChannelSet {
        &self.chans
    }

    fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.chans
    }

    fn routable(&self) -> bool {
        false
    }

    fn set_param(&mut self, name: &str, value: Arg) -> Result<()> {
        match name {
            "value" => self.set_value(value),
            "time" => self.set_time(value),
            "mul" => self.set_mul(value),
            "add" => self.set_add(value),
            _ => Err(Error::UnknownParam(name.to_string())),
        }
    }
}
