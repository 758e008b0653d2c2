//! Bidirectional scaling between a normalized control domain and a real
//! parameter domain.
//!
//! A [`ParamMap`] is the stateless value object external controls and
//! automation ramps go through: `get` maps a slider position in `[0, 1]` to
//! the parameter's real range, `set` is its exact inverse. A [`ControlMap`]
//! adds the descriptive metadata a control surface needs to render one
//! slider for one named parameter.
//!
//! # Example
//!
//! ```
//! use regler::{ParamMap, Scale};
//!
//! let freq = ParamMap::new(20.0, 20000.0, Scale::Log);
//! let hz = freq.get(0.5);
//! assert!((hz - 632.455532).abs() < 1e-6);
//! assert!((freq.set(hz) - 0.5).abs() < 1e-9);
//! ```

use serde::Serialize;

/// How a [`ParamMap`] spaces values across its range.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Scale {
    Lin,
    Log,
}

/// Slider resolution hint for control surfaces.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Resolution {
    Int,
    Float,
}

/// Stateless bidirectional mapping between `[0, 1]` and a real parameter
/// range, linear or logarithmic.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ParamMap {
    min: f64,
    max: f64,
    scale: Scale,
}

impl ParamMap {
    /// # Panics
    ///
    /// Panics unless `min < max`, and for [`Scale::Log`] unless `min > 0`:
    /// a logarithmic range must stay strictly positive, and violating that
    /// is a caller contract error, not a recoverable condition.
    pub fn new(min: f64, max: f64, scale: Scale) -> Self {
        assert!(
            min < max,
            "parameter range must satisfy min < max (got {}..{})",
            min,
            max
        );
        if scale == Scale::Log {
            assert!(
                min > 0.0,
                "logarithmic scale requires a strictly positive minimum (got {})",
                min
            );
        }
        ParamMap { min, max, scale }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Map a normalized value to the real domain.
    ///
    /// The input is silently clamped to `[0, 1]` first; control surfaces
    /// routinely overshoot by a pixel and that is not an error.
    pub fn get(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self.scale {
            Scale::Lin => (self.max - self.min) * x + self.min,
            Scale::Log => 10f64.powf(x * (self.max / self.min).log10() + self.min.log10()),
        }
    }

    /// Map a real value back to the normalized domain.
    ///
    /// Exact algebraic inverse of [`get`](Self::get), without clamping: a
    /// real value outside `[min, max]` yields a result outside `[0, 1]`
    /// rather than an error.
    pub fn set(&self, x: f64) -> f64 {
        match self.scale {
            Scale::Lin => (x - self.min) / (self.max - self.min),
            Scale::Log => (x / self.min).log10() / (self.max / self.min).log10(),
        }
    }
}

/// Descriptive metadata for one slider on an external control surface:
/// which parameter it drives, its range and scale, the real-domain initial
/// value (one entry per channel), resolution, and the ramp time used to
/// smooth incoming changes.
#[derive(Clone, Debug, Serialize)]
pub struct ControlMap {
    map: ParamMap,
    name: String,
    init: Vec<f64>,
    resolution: Resolution,
    ramp: f64,
}

impl ControlMap {
    pub fn new(
        min: f64,
        max: f64,
        scale: Scale,
        name: &str,
        init: Vec<f64>,
        resolution: Resolution,
        ramp: f64,
    ) -> Self {
        ControlMap {
            map: ParamMap::new(min, max, scale),
            name: name.to_string(),
            init,
            resolution,
            ramp,
        }
    }

    /// Single-channel float slider with the default 25 ms ramp.
    pub fn scalar(min: f64, max: f64, scale: Scale, name: &str, init: f64) -> Self {
        Self::new(min, max, scale, name, vec![init], Resolution::Float, 0.025)
    }

    /// Frequency slider, 20 Hz to 20 kHz, logarithmic.
    pub fn freq(init: f64) -> Self {
        Self::scalar(20.0, 20000.0, Scale::Log, "freq", init)
    }

    /// Amplitude slider, 0 to 2, linear.
    pub fn mul(init: f64) -> Self {
        Self::scalar(0.0, 2.0, Scale::Lin, "mul", init)
    }

    /// Phase slider, 0 to 1, linear.
    pub fn phase(init: f64) -> Self {
        Self::scalar(0.0, 1.0, Scale::Lin, "phase", init)
    }

    /// Pan slider, 0 to 1, linear.
    pub fn pan(init: f64) -> Self {
        Self::scalar(0.0, 1.0, Scale::Lin, "pan", init)
    }

    /// Filter-Q slider, 0.1 to 100, logarithmic.
    pub fn q(init: f64) -> Self {
        Self::scalar(0.1, 100.0, Scale::Log, "q", init)
    }

    /// Duration slider, 0 to 60 seconds, linear.
    pub fn dur(init: f64) -> Self {
        Self::scalar(0.0, 60.0, Scale::Lin, "dur", init)
    }

    pub fn map(&self) -> &ParamMap {
        &self.map
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init(&self) -> &[f64] {
        &self.init
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn ramp(&self) -> f64 {
        self.ramp
    }

    /// Forward of [`ParamMap::get`].
    pub fn get(&self, x: f64) -> f64 {
        self.map.get(x)
    }

    /// Forward of [`ParamMap::set`].
    pub fn set(&self, x: f64) -> f64 {
        self.map.set(x)
    }
}
