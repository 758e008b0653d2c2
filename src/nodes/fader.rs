//! Crossfading input swap.

use crate::engine::StreamSpec;
use crate::error::Result;
use crate::node::{ChannelSet, SignalNode, Stream};

/// Pass-through node whose input can be replaced under an engine-side
/// linear crossfade.
///
/// The fader's identity and channel count are fixed at construction; a new
/// input with a different channel count wraps cyclically across the fader's
/// channels.
pub struct InputFader {
    chans: ChannelSet,
}

impl InputFader {
    pub fn new(input: &dyn SignalNode) -> Result<Self> {
        let engine = input.channels().engine().clone();
        let nref = input.node_ref();
        let mut streams = Vec::with_capacity(nref.channels());
        for i in 0..nref.channels() {
            let id = engine.construct(StreamSpec::Fader {
                input: nref.stream(i),
            })?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(InputFader {
            chans: ChannelSet::new(engine, streams),
        })
    }

    /// Swap the input, crossfading from the old source to the new one over
    /// `fadetime` seconds.
    pub fn set_input(&mut self, input: &dyn SignalNode, fadetime: f64) -> Result<()> {
        let nref = input.node_ref();
        for i in 0..self.chans.len() {
            let fader = self.chans.stream(i)?.id();
            self.chans
                .engine()
                .set_fader_input(fader, nref.stream(i), fadetime)?;
        }
        Ok(())
    }
}

impl SignalNode for InputFader {
    fn channels(&self) -> &ChannelSet {
        &self.chans
    }

    fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.chans
    }
}
