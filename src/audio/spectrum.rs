//! Spectrum snapshots and the derived loudness signal.

/// Largest value a single frequency bin can hold.
pub const MAX_MAGNITUDE: u8 = 255;

/// One frame's worth of byte frequency magnitudes.
///
/// The bin count is fixed when the owning analysis graph is built; the
/// contents are overwritten in place every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spectrum {
    bins: Vec<u8>,
}

impl Spectrum {
    /// Create a silent snapshot with `bin_count` bins.
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    /// Wrap existing magnitudes.
    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// Snapshot where every bin holds `value`.
    pub fn filled(bin_count: usize, value: u8) -> Self {
        Self {
            bins: vec![value; bin_count],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Mutable access for the analyzer to refresh the snapshot in place.
    pub fn bins_mut(&mut self) -> &mut [u8] {
        &mut self.bins
    }

    /// Mean magnitude normalized to `[0, 1]`. Empty snapshots are silent.
    pub fn intensity(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.bins.iter().map(|&b| b as u32).sum();
        sum as f32 / self.bins.len() as f32 / MAX_MAGNITUDE as f32
    }

    /// Normalized magnitude of bin `index`, or 0 when out of range.
    pub fn amplitude(&self, index: usize) -> f32 {
        self.bins
            .get(index)
            .map(|&b| b as f32 / MAX_MAGNITUDE as f32)
            .unwrap_or(0.0)
    }

    /// Normalized magnitude for slot `i` of `count` evenly spread slots.
    ///
    /// Slot `i` reads bin `floor(i / count * len)`.
    pub fn amplitude_at(&self, i: usize, count: usize) -> f32 {
        if count == 0 || self.bins.is_empty() {
            return 0.0;
        }
        let index = (i as f32 / count as f32 * self.bins.len() as f32) as usize;
        self.amplitude(index.min(self.bins.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intensity_bounds() {
        assert_eq!(Spectrum::new(128).intensity(), 0.0);
        assert_relative_eq!(Spectrum::filled(128, 255).intensity(), 1.0);
        assert_eq!(Spectrum::from_bins(Vec::new()).intensity(), 0.0);
    }

    #[test]
    fn test_intensity_is_mean() {
        let spectrum = Spectrum::from_bins(vec![0, 255, 0, 255]);
        assert_relative_eq!(spectrum.intensity(), 0.5);
    }

    #[test]
    fn test_amplitude_at_spreads_slots_over_bins() {
        let bins: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
        let spectrum = Spectrum::from_bins(bins);

        // 32 slots over 128 bins reads every 4th bin
        assert_relative_eq!(spectrum.amplitude_at(1, 32), 8.0 / 255.0);
        assert_relative_eq!(spectrum.amplitude_at(31, 32), 248.0 / 255.0);
        assert_eq!(spectrum.amplitude_at(3, 0), 0.0);
    }

    #[test]
    fn test_amplitude_out_of_range_is_silent() {
        let spectrum = Spectrum::filled(4, 200);
        assert_eq!(spectrum.amplitude(10), 0.0);
    }
}
