//! In-memory reference engine.
//!
//! `OfflineEngine` implements [`StreamEngine`] without any audio backend:
//! streams are evaluated on demand when their value is read, and play/route
//! state is just tracked. It exists so the control layer can be exercised
//! deterministically - in tests, or for offline graph inspection - and it
//! doubles as an executable description of what the native engine is
//! expected to do.
//!
//! Two simplifications: there is no clock, so ramps and crossfades collapse
//! to their target immediately; and evaluation assumes the stream graph is
//! acyclic, which the control layer guarantees for graphs it builds.

use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;

use crate::engine::{
    BinOp, EngineError, Operand, StreamEngine, StreamId, StreamSpec, TableId,
};

#[derive(Clone, Debug)]
enum Kind {
    Const { value: Operand },
    Ramped { value: Operand, time: f64 },
    Sum { inputs: Vec<StreamId> },
    Fader { input: StreamId },
    Combined { op: BinOp, lhs: StreamId, rhs: Operand },
}

/// A multiplicative or additive parameter, possibly with inverse sense
/// (divide-into / subtract-from).
#[derive(Clone, Copy, Debug)]
struct Attr {
    value: Operand,
    inverse: bool,
}

impl Attr {
    fn direct(value: Operand) -> Self {
        Attr {
            value,
            inverse: false,
        }
    }

    fn inverse(value: Operand) -> Self {
        Attr {
            value,
            inverse: true,
        }
    }
}

#[derive(Clone, Debug)]
struct StreamState {
    kind: Kind,
    mul: Attr,
    add: Attr,
    playing: bool,
    route: Option<usize>,
}

#[derive(Default)]
struct State {
    streams: HashMap<u64, StreamState>,
    tables: HashMap<u64, Vec<f64>>,
    next: u64,
    double_releases: u64,
}

/// See the [module documentation](self).
pub struct OfflineEngine {
    state: Mutex<State>,
    channels: usize,
}

impl OfflineEngine {
    pub fn new(output_channels: usize) -> Arc<Self> {
        Arc::new(OfflineEngine {
            state: Mutex::new(State::default()),
            channels: output_channels,
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("offline engine state poisoned")
    }

    /// Number of streams currently alive.
    pub fn live_streams(&self) -> usize {
        self.lock().streams.len()
    }

    /// Number of tables currently alive.
    pub fn live_tables(&self) -> usize {
        self.lock().tables.len()
    }

    /// How many times a stream or table was released more than once.
    pub fn double_releases(&self) -> u64 {
        self.lock().double_releases
    }

    pub fn is_playing(&self, stream: StreamId) -> bool {
        self.lock()
            .streams
            .get(&stream.0)
            .map_or(false, |s| s.playing)
    }

    /// Physical output channel a stream is routed to, if any.
    pub fn routing(&self, stream: StreamId) -> Option<usize> {
        self.lock().streams.get(&stream.0).and_then(|s| s.route)
    }

    /// Ramp time of a `Ramped` stream, if it is one.
    pub fn ramp_time(&self, stream: StreamId) -> Option<f64> {
        self.lock()
            .streams
            .get(&stream.0)
            .and_then(|s| match s.kind {
                Kind::Ramped { time, .. } => Some(time),
                _ => None,
            })
    }

    fn with_stream<T>(
        &self,
        stream: StreamId,
        f: impl FnOnce(&mut StreamState) -> T,
    ) -> Result<T, EngineError> {
        let mut state = self.lock();
        state
            .streams
            .get_mut(&stream.0)
            .map(f)
            .ok_or(EngineError::UnknownStream(stream))
    }
}

fn eval_operand(streams: &HashMap<u64, StreamState>, op: Operand) -> f64 {
    match op {
        Operand::Value(v) => v,
        Operand::Stream(s) => eval_stream(streams, s),
    }
}

fn eval_attr(streams: &HashMap<u64, StreamState>, raw: f64, attr: Attr, mul: bool) -> f64 {
    let v = eval_operand(streams, attr.value);
    match (mul, attr.inverse) {
        (true, false) => raw * v,
        (true, true) => raw / v,
        (false, false) => raw + v,
        (false, true) => raw - v,
    }
}

// References to already-released streams evaluate as silence; a Sum whose
// inputs are gone must not fail the streams still reading it.
fn eval_stream(streams: &HashMap<u64, StreamState>, id: StreamId) -> f64 {
    let st = match streams.get(&id.0) {
        Some(st) => st,
        None => return 0.0,
    };
    let raw = match &st.kind {
        Kind::Const { value } => eval_operand(streams, *value),
        // No clock: a ramp is always at its target.
        Kind::Ramped { value, .. } => eval_operand(streams, *value),
        Kind::Sum { inputs } => inputs.iter().map(|s| eval_stream(streams, *s)).sum(),
        Kind::Fader { input } => eval_stream(streams, *input),
        Kind::Combined { op, lhs, rhs } => {
            let l = eval_stream(streams, *lhs);
            let r = eval_operand(streams, *rhs);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
            }
        }
    };
    let scaled = eval_attr(streams, raw, st.mul, true);
    eval_attr(streams, scaled, st.add, false)
}

impl StreamEngine for OfflineEngine {
    fn construct(&self, spec: StreamSpec) -> Result<StreamId, EngineError> {
        let kind = match spec {
            StreamSpec::Const { value, mul, add } => {
                return self.insert(Kind::Const { value }, mul, add);
            }
            StreamSpec::Ramped {
                value,
                time,
                init: _,
                mul,
                add,
            } => {
                return self.insert(Kind::Ramped { value, time }, mul, add);
            }
            StreamSpec::Sum { inputs } => Kind::Sum { inputs },
            StreamSpec::Fader { input } => Kind::Fader { input },
        };
        self.insert(kind, Operand::Value(1.0), Operand::Value(0.0))
    }

    fn play(&self, stream: StreamId) -> Result<(), EngineError> {
        self.with_stream(stream, |s| s.playing = true)
    }

    fn stop(&self, stream: StreamId) -> Result<(), EngineError> {
        self.with_stream(stream, |s| {
            s.playing = false;
            s.route = None;
        })
    }

    fn route_out(&self, stream: StreamId, channel: usize) -> Result<(), EngineError> {
        self.with_stream(stream, |s| {
            s.playing = true;
            s.route = Some(channel);
        })
    }

    fn delete_stream(&self, stream: StreamId) {
        let mut state = self.lock();
        if state.streams.remove(&stream.0).is_none() {
            state.double_releases += 1;
        }
    }

    fn set_mul(&self, stream: StreamId, x: Operand) -> Result<(), EngineError> {
        self.with_stream(stream, |s| s.mul = Attr::direct(x))
    }

    fn set_add(&self, stream: StreamId, x: Operand) -> Result<(), EngineError> {
        self.with_stream(stream, |s| s.add = Attr::direct(x))
    }

    fn set_sub(&self, stream: StreamId, x: Operand) -> Result<(), EngineError> {
        self.with_stream(stream, |s| s.add = Attr::inverse(x))
    }

    fn set_div(&self, stream: StreamId, x: Operand) -> Result<(), EngineError> {
        self.with_stream(stream, |s| s.mul = Attr::inverse(x))
    }

    fn set_value(&self, stream: StreamId, x: Operand) -> Result<(), EngineError> {
        self.with_stream(stream, |s| match &mut s.kind {
            Kind::Const { value } => {
                *value = x;
                Ok(())
            }
            Kind::Ramped { value, .. } => {
                *value = x;
                Ok(())
            }
            _ => Err(EngineError::Backend(
                "stream has no value parameter".to_string(),
            )),
        })?
    }

    fn set_time(&self, stream: StreamId, seconds: f64) -> Result<(), EngineError> {
        self.with_stream(stream, |s| match &mut s.kind {
            Kind::Ramped { time, .. } => {
                *time = seconds;
                Ok(())
            }
            _ => Err(EngineError::Backend(
                "stream has no ramp time".to_string(),
            )),
        })?
    }

    fn set_fader_input(
        &self,
        fader: StreamId,
        input: StreamId,
        _fadetime: f64,
    ) -> Result<(), EngineError> {
        self.with_stream(fader, |s| match &mut s.kind {
            // No clock: the crossfade completes immediately.
            Kind::Fader { input: current } => {
                *current = input;
                Ok(())
            }
            _ => Err(EngineError::Backend("stream is not a fader".to_string())),
        })?
    }

    fn get_value(&self, stream: StreamId) -> Result<f64, EngineError> {
        let state = self.lock();
        if !state.streams.contains_key(&stream.0) {
            return Err(EngineError::UnknownStream(stream));
        }
        Ok(eval_stream(&state.streams, stream))
    }

    fn combine(&self, op: BinOp, lhs: StreamId, rhs: Operand) -> Result<StreamId, EngineError> {
        {
            let state = self.lock();
            if !state.streams.contains_key(&lhs.0) {
                return Err(EngineError::UnknownStream(lhs));
            }
        }
        self.insert(
            Kind::Combined { op, lhs, rhs },
            Operand::Value(1.0),
            Operand::Value(0.0),
        )
    }

    fn output_channels(&self) -> usize {
        self.channels
    }

    fn alloc_table(&self, size: usize) -> Result<TableId, EngineError> {
        let mut state = self.lock();
        let id = state.next;
        state.next += 1;
        state.tables.insert(id, vec![0.0; size]);
        Ok(TableId(id))
    }

    fn table_data(&self, table: TableId) -> Result<Vec<f64>, EngineError> {
        self.lock()
            .tables
            .get(&table.0)
            .cloned()
            .ok_or(EngineError::UnknownTable(table))
    }

    fn set_table_data(&self, table: TableId, data: &[f64]) -> Result<(), EngineError> {
        self.lock()
            .tables
            .get_mut(&table.0)
            .map(|t| *t = data.to_vec())
            .ok_or(EngineError::UnknownTable(table))
    }

    fn normalize_table(&self, table: TableId) -> Result<(), EngineError> {
        let mut state = self.lock();
        let t = state
            .tables
            .get_mut(&table.0)
            .ok_or(EngineError::UnknownTable(table))?;
        let peak = t.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if peak > 0.0 {
            for v in t.iter_mut() {
                *v /= peak;
            }
        }
        Ok(())
    }

    fn delete_table(&self, table: TableId) {
        let mut state = self.lock();
        if state.tables.remove(&table.0).is_none() {
            state.double_releases += 1;
        }
    }
}

impl OfflineEngine {
    fn insert(&self, kind: Kind, mul: Operand, add: Operand) -> Result<StreamId, EngineError> {
        let mut state = self.lock();
        let id = state.next;
        state.next += 1;
        state.streams.insert(
            id,
            StreamState {
                kind,
                mul: Attr::direct(mul),
                add: Attr::direct(add),
                playing: false,
                route: None,
            },
        );
        Ok(StreamId(id))
    }
}
