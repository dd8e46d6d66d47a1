// Throughput, percentile and jitter derivations over bounded windows

/// Throughput figures for one closed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickThroughput {
    pub tps: u64,
    pub tps_max: u64,
    pub tps_avg: f64,
}

/// Session-long throughput statistics.
///
/// Holds only the running max and the `(ticks, sum)` pair; the latency derivations are
/// free functions recomputed from the window on every tick.
#[derive(Debug, Clone, Default)]
pub struct StreamingStats {
    tps_max: u64,
    ticks_observed: u64,
    tps_sum: u64,
}

impl StreamingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen since the last boundary are the tick's throughput.
    pub fn throughput_for_tick(&self, count: u64) -> u64 {
        count
    }

    pub fn running_max(&mut self, tps: u64) -> u64 {
        self.tps_max = self.tps_max.max(tps);
        self.tps_max
    }

    pub fn cumulative_average(&mut self, tps: u64) -> f64 {
        self.ticks_observed += 1;
        self.tps_sum = self.tps_sum.saturating_add(tps);
        self.tps_sum as f64 / self.ticks_observed as f64
    }

    /// Close a tick: convert the counter and fold it into max and average.
    pub fn observe_tick(&mut self, count: u64) -> TickThroughput {
        let tps = self.throughput_for_tick(count);
        TickThroughput {
            tps,
            tps_max: self.running_max(tps),
            tps_avg: self.cumulative_average(tps),
        }
    }

    #[cfg(test)]
    pub fn tps_max(&self) -> u64 {
        self.tps_max
    }

    #[cfg(test)]
    pub fn ticks_observed(&self) -> u64 {
        self.ticks_observed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Nearest-rank percentile: sort a copy and index `floor(p * (len - 1))`.
/// An empty window yields 0.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).floor() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Mean absolute difference between consecutive samples; 0 for fewer than two.
pub fn jitter(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let total: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (samples.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_nearest_rank() {
        let samples = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(percentile(&samples, 0.5), 3.0);
        assert_eq!(percentile(&samples, 0.0), 1.0);
        assert_eq!(percentile(&samples, 1.0), 5.0);
        // floor(0.95 * 4) = 3
        assert_eq!(percentile(&samples, 0.95), 4.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[], 0.95), 0.0);
    }

    #[test]
    fn test_percentile_does_not_reorder_input() {
        let samples = vec![3.0, 1.0, 2.0];
        percentile(&samples, 0.5);
        assert_eq!(samples, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_jitter() {
        assert_eq!(jitter(&[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(jitter(&[1.0, 3.0]), 2.0);
        assert_eq!(jitter(&[1.0, 3.0, 2.0]), 1.5);
        assert_eq!(jitter(&[7.0]), 0.0);
        assert_eq!(jitter(&[]), 0.0);
    }

    #[test]
    fn test_cumulative_average_and_max() {
        let mut stats = StreamingStats::new();
        let last = [10, 20, 30]
            .into_iter()
            .map(|count| stats.observe_tick(count))
            .last()
            .unwrap();

        assert_eq!(last.tps, 30);
        assert_eq!(last.tps_avg, 20.0);
        assert_eq!(last.tps_max, 30);
        assert_eq!(stats.ticks_observed(), 3);
    }

    #[test]
    fn test_running_max_never_decreases() {
        let mut stats = StreamingStats::new();
        let maxima: Vec<u64> = [4, 9, 2, 9, 0, 11]
            .into_iter()
            .map(|tps| stats.running_max(tps))
            .collect();
        assert_eq!(maxima, vec![4, 9, 9, 9, 9, 11]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut stats = StreamingStats::new();
        stats.observe_tick(50);
        stats.reset();

        assert_eq!(stats.tps_max(), 0);
        assert_eq!(stats.ticks_observed(), 0);
        assert_eq!(stats.observe_tick(6).tps_avg, 6.0);
    }
}
