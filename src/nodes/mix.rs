//! Fan-in reduction: many channels summed into fewer.

use crate::engine::{EngineRef, StreamId, StreamSpec};
use crate::error::Result;
use crate::node::{ChannelSet, SignalNode, Stream};

/// Mixes an input's channels down to `voices` output channels.
///
/// Input channels are partitioned round-robin - channel `i` lands in bucket
/// `i % voices` - and each bucket is summed by the engine into one output
/// channel. `voices` is clamped to `[1, input channels]`, so `mix(1)` sums
/// everything into a single channel and `mix(channel_count)` is a
/// channel-preserving copy.
pub struct Mix {
    chans: ChannelSet,
}

impl Mix {
    pub fn new(input: &dyn SignalNode, voices: usize) -> Result<Self> {
        let cs = input.channels();
        Self::from_streams(cs.engine().clone(), cs.ids(), voices)
    }

    /// Mix several nodes at once; their channels are concatenated in order
    /// before partitioning.
    ///
    /// # Panics
    ///
    /// Panics on an empty input slice.
    pub fn from_nodes(inputs: &[&dyn SignalNode], voices: usize) -> Result<Self> {
        assert!(!inputs.is_empty(), "Mix requires at least one input node");
        let engine = inputs[0].channels().engine().clone();
        let ids: Vec<StreamId> = inputs.iter().flat_map(|n| n.channels().ids()).collect();
        Self::from_streams(engine, ids, voices)
    }

    fn from_streams(engine: EngineRef, ids: Vec<StreamId>, voices: usize) -> Result<Self> {
        let voices = voices.max(1).min(ids.len().max(1));
        let mut buckets: Vec<Vec<StreamId>> = vec![Vec::new(); voices];
        for (i, id) in ids.into_iter().enumerate() {
            buckets[i % voices].push(id);
        }
        let mut streams = Vec::with_capacity(voices);
        for inputs in buckets {
            let id = engine.construct(StreamSpec::Sum { inputs })?;
            streams.push(Stream::new(engine.clone(), id));
        }
        Ok(Mix {
            chans: ChannelSet::new(engine, streams),
        })
    }
}

impl SignalNode for Mix {
    fn channels(&self) -> &ChannelSet {
        &self.chans
    }

    fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.chans
    }
}
