//! Smoothed control values
//!
//! A [`Parameter`] keeps a target set by control changes and a current value
//! that approaches the target exponentially, one step per
//! [`Parameter::next_value`] call. Both values always stay within the
//! declared range.

use std::ops::{Index, IndexMut};

const SMOOTHING_EPSILON: f32 = 1e-6;

/// Scalar control with exponential smoothing toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    current: f32,
    target: f32,
    min: f32,
    max: f32,
    frac: f32,
    smoothing: bool,
}

impl Parameter {
    /// Default smoothing coefficient (fraction of the remaining distance
    /// covered per step)
    pub const DEFAULT_SMOOTHING: f32 = 0.5;

    /// Create a settled parameter
    ///
    /// `min` and `max` are reordered if needed and `value` is clamped into
    /// the range.
    pub fn new(value: f32, min: f32, max: f32, smoothing: f32) -> Self {
        let (min, max) = (min.min(max), min.max(max));
        let value = value.clamp(min, max);
        Self {
            current: value,
            target: value,
            min,
            max,
            frac: smoothing.clamp(0.0, 1.0),
            smoothing: false,
        }
    }

    /// Set the target. With `force` the current value jumps there at once.
    pub fn set_value(&mut self, value: f32, force: bool) {
        self.target = value.clamp(self.min, self.max);
        if force {
            self.current = self.target;
            self.smoothing = false;
        } else {
            self.update_smoothing();
        }
    }

    /// Set the target and the smoothing coefficient together
    pub fn set_value_with_smoothing(&mut self, value: f32, smoothing: f32, force: bool) {
        self.set_smoothing(smoothing);
        self.set_value(value, force);
    }

    /// Change the smoothing coefficient, clamped to [0, 1]
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.frac = smoothing.clamp(0.0, 1.0);
    }

    /// Change the range; current and target are pulled inside it
    pub fn set_range(&mut self, min: f32, max: f32) {
        self.min = min.min(max);
        self.max = min.max(max);
        self.target = self.target.clamp(self.min, self.max);
        self.current = self.current.clamp(self.min, self.max);
        self.update_smoothing();
    }

    /// Set the target from a 7-bit controller value mapped linearly over
    /// the range
    pub fn set_normalized(&mut self, value: u8) {
        let t = (value & 0x7F) as f32 / 127.0;
        self.set_value(self.min + t * (self.max - self.min), false);
    }

    /// Advance one smoothing step and return the new current value
    pub fn next_value(&mut self) -> f32 {
        if self.smoothing {
            let next = self.target * self.frac + self.current * (1.0 - self.frac);
            // Rounding can pin the step one ulp short of the target
            self.current = if next == self.current && self.frac > 0.0 {
                self.target
            } else {
                next
            };
        }
        self.update_smoothing();
        self.current
    }

    /// Current (smoothed) value
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Target value
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Lower bound
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> f32 {
        self.max
    }

    /// True while the current value has not reached the target
    pub fn is_smoothing(&self) -> bool {
        self.smoothing
    }

    fn update_smoothing(&mut self) {
        let threshold = SMOOTHING_EPSILON * self.target.abs().max(1.0);
        self.smoothing = (self.current - self.target).abs() > threshold;
        if !self.smoothing {
            self.current = self.target;
        }
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, Self::DEFAULT_SMOOTHING)
    }
}

/// Fixed set of parameters addressed by index
///
/// Out-of-range indices resolve to an inert dummy parameter instead of
/// failing, so a bad controller mapping is silently ignored.
#[derive(Debug, Clone)]
pub struct ParameterPool {
    params: Vec<Parameter>,
    dummy: Parameter,
}

impl ParameterPool {
    /// Create `size` default parameters (value 0 in [0, 1])
    pub fn new(size: usize) -> Self {
        Self {
            params: vec![Parameter::default(); size],
            dummy: INERT_PARAMETER,
        }
    }

    /// Number of real parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if the pool has no real parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// True if `index` addresses a real parameter
    pub fn contains(&self, index: usize) -> bool {
        index < self.params.len()
    }

    /// Current value at `index`, 0 for an unknown index
    pub fn value(&self, index: usize) -> f32 {
        self[index].value()
    }

    /// Advance every parameter by one smoothing step
    pub fn advance(&mut self) {
        for param in self.params.iter_mut() {
            param.next_value();
        }
    }

    /// True if any parameter is still moving
    pub fn any_smoothing(&self) -> bool {
        self.params.iter().any(Parameter::is_smoothing)
    }

    /// Iterate over the real parameters
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }
}

impl Index<usize> for ParameterPool {
    type Output = Parameter;

    fn index(&self, index: usize) -> &Parameter {
        self.params.get(index).unwrap_or(&INERT_PARAMETER)
    }
}

impl IndexMut<usize> for ParameterPool {
    fn index_mut(&mut self, index: usize) -> &mut Parameter {
        if index < self.params.len() {
            &mut self.params[index]
        } else {
            self.dummy = INERT_PARAMETER;
            &mut self.dummy
        }
    }
}

static INERT_PARAMETER: Parameter = Parameter {
    current: 0.0,
    target: 0.0,
    min: 0.0,
    max: 1.0,
    frac: Parameter::DEFAULT_SMOOTHING,
    smoothing: false,
};
