use serde::{Deserialize, Serialize};

/// Number of axes per sensor family (x, y, z).
pub const AXES: usize = 3;

/// Largest channel count a single reading can contribute (linear + angular).
pub const MAX_CHANNELS: usize = AXES * 2;

/// One raw multi-axis sample as reported by the motion sensor.
///
/// Linear axes are in milli-g, angular axes in milli-degrees per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub linear: [i32; AXES],
    pub angular: [i32; AXES],
}

/// Divisors that bring raw sensor counts into the model's feature units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub linear: f32,
    pub angular: f32,
}

impl Reading {
    pub fn new(linear: [i32; AXES], angular: [i32; AXES]) -> Self {
        Self { linear, angular }
    }

    /// Write the first `out.len()` scaled channels, linear axes first.
    ///
    /// `out` must not be longer than [`MAX_CHANNELS`].
    pub fn write_scaled(&self, scale: &ScaleFactors, out: &mut [f32]) {
        let linear = self.linear.iter().map(|v| *v as f32 / scale.linear);
        let angular = self.angular.iter().map(|v| *v as f32 / scale.angular);

        for (slot, value) in out.iter_mut().zip(linear.chain(angular)) {
            *slot = value;
        }
    }
}
