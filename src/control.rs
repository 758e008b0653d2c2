//! Binding between parameter maps, ramped value nodes and an external
//! control surface.
//!
//! The GUI itself lives outside this crate. What the core exposes per
//! controllable parameter is its [`ControlMap`] - everything a surface
//! needs to render one slider - plus [`set_norm`](ControlBinding::set_norm),
//! the callback the surface invokes with normalized positions. The binding
//! turns those into real values through the map and pushes them into a
//! ramped [`SigTo`] wired to the parameter at bind time, so slider moves
//! glide instead of stepping.

use hashbrown::HashMap;
use tracing::debug;

use crate::broadcast::Arg;
use crate::engine::EngineRef;
use crate::error::{Error, Result};
use crate::map::{ControlMap, Resolution};
use crate::node::SignalNode;
use crate::nodes::SigTo;

/// Live control-surface binding for one node.
///
/// Keep the binding alive for as long as the surface drives the node: the
/// ramped value nodes backing each parameter live here. Dropping it without
/// [`unbind`](Self::unbind) releases them while the node still references
/// their values.
pub struct ControlBinding {
    maps: HashMap<String, ControlMap>,
    sigs: HashMap<String, SigTo>,
    values: HashMap<String, Vec<f64>>,
}

impl ControlBinding {
    /// Wire one ramped value node per map into `node`'s named parameters,
    /// seeded at each map's initial value.
    pub fn bind(
        engine: &EngineRef,
        node: &mut dyn SignalNode,
        maps: Vec<ControlMap>,
    ) -> Result<Self> {
        let mut binding = ControlBinding {
            maps: HashMap::new(),
            sigs: HashMap::new(),
            values: HashMap::new(),
        };
        for m in maps {
            let init = m.init().to_vec();
            let sig = SigTo::new(
                engine,
                Arg::from(init.clone()),
                m.ramp(),
                Arg::from(init.clone()),
            )?;
            node.set_param(m.name(), sig.as_arg())?;
            debug!(param = m.name(), channels = init.len(), "bound control");
            binding.sigs.insert(m.name().to_string(), sig);
            binding.values.insert(m.name().to_string(), init);
            binding.maps.insert(m.name().to_string(), m);
        }
        Ok(binding)
    }

    /// The slider descriptors a surface renders, one per bound parameter.
    pub fn descriptors(&self) -> impl Iterator<Item = &ControlMap> {
        self.maps.values()
    }

    /// Last real-domain values pushed for a parameter.
    pub fn value(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Surface callback: one normalized position per channel (a single
    /// slider passes one). Values are mapped to the real domain - clamped
    /// to `[0, 1]` by the map, rounded for integer-resolution parameters -
    /// pushed into the bound ramped node, and returned for display.
    pub fn set_norm(&mut self, name: &str, xs: &[f64]) -> Result<Vec<f64>> {
        let m = self
            .maps
            .get(name)
            .ok_or_else(|| Error::UnknownParam(name.to_string()))?;
        let real: Vec<f64> = xs
            .iter()
            .map(|x| {
                let v = m.get(*x);
                match m.resolution() {
                    Resolution::Int => v.round(),
                    Resolution::Float => v,
                }
            })
            .collect();
        let sig = self
            .sigs
            .get_mut(name)
            .expect("bound map without backing signal");
        sig.set_value(Arg::from(real.clone()))?;
        self.values.insert(name.to_string(), real.clone());
        Ok(real)
    }

    /// Tear the binding down: every bound parameter is frozen at its last
    /// real values and the backing ramped nodes are released.
    pub fn unbind(self, node: &mut dyn SignalNode) -> Result<()> {
        for (name, values) in &self.values {
            node.set_param(name, Arg::from(values.clone()))?;
        }
        Ok(())
    }
}
