use super::reading::{Reading, ScaleFactors, MAX_CHANNELS};

/// The single flat feature buffer shared by the collector and the classifier.
///
/// The buffer is allocated once. Every collection starts with [`reset`],
/// which rewinds the fill cursor, so a window is only ever readable as a
/// whole after all of its sample slots were written again.
///
/// [`reset`]: FeatureWindow::reset
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    values: Vec<f32>,
    samples_per_window: usize,
    channels_per_sample: usize,
    filled: usize,
}

impl FeatureWindow {
    pub fn new(samples_per_window: usize, channels_per_sample: usize) -> Self {
        debug_assert!(channels_per_sample <= MAX_CHANNELS);
        Self {
            values: vec![0.0; samples_per_window * channels_per_sample],
            samples_per_window,
            channels_per_sample,
            filled: 0,
        }
    }

    /// Total number of feature values (samples x channels).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn samples_per_window(&self) -> usize {
        self.samples_per_window
    }

    pub fn channels_per_sample(&self) -> usize {
        self.channels_per_sample
    }

    /// Samples written since the last reset.
    pub fn filled_samples(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.samples_per_window
    }

    /// Discard whatever the previous fill left behind.
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// Append one reading at the next sample offset.
    ///
    /// Returns `false` without writing when the window is already full.
    pub fn push_reading(&mut self, reading: &Reading, scale: &ScaleFactors) -> bool {
        if self.is_complete() {
            return false;
        }
        let start = self.filled * self.channels_per_sample;
        let end = start + self.channels_per_sample;
        reading.write_scaled(scale, &mut self.values[start..end]);
        self.filled += 1;
        true
    }

    /// The feature values, only if every sample slot was written in this fill.
    pub fn as_complete(&self) -> Option<&[f32]> {
        self.is_complete().then_some(self.values.as_slice())
    }
}
