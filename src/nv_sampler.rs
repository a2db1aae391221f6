use std::iter::{Copied, StepBy};
use std::slice::Iter;

use serde::Deserialize;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_interface::Tick;

/// Which ticks of the accuracy series get rendered
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// First tick eligible for rendering (inclusive)
    pub from_tick: Tick,

    /// Last tick eligible for rendering (inclusive)
    pub stop_tick: Tick,

    /// Render every `stride`-th eligible tick (1 = all of them)
    pub stride: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            from_tick: 0,
            stop_tick: 20_000,
            stride: 1,
        }
    }
}

/// Selects ticks to render from an ascending tick series
///
/// The sampler only borrows the series. `iter()` can be called any number of
/// times and each call starts over from the first eligible tick.
#[derive(Clone, Debug)]
pub struct TickSampler<'a> {
    eligible: &'a [Tick],
    stride: usize,
}

pub type SampledTicks<'a> = StepBy<Copied<Iter<'a, Tick>>>;

impl<'a> TickSampler<'a> {
    pub fn new(ticks: &'a [Tick], config: SamplingConfig) -> Result<Self> {
        if config.stride == 0 {
            return Err(ReplayError::configuration("stride must be at least 1"));
        }
        if let Some(pair) = ticks.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ReplayError::configuration(format!(
                "tick series must be strictly ascending ({} followed by {})",
                pair[0], pair[1]
            )));
        }

        let start = ticks.partition_point(|t| *t < config.from_tick);
        // from_tick > stop_tick leaves end below start
        let end = ticks.partition_point(|t| *t <= config.stop_tick).max(start);

        Ok(Self {
            eligible: &ticks[start..end],
            stride: config.stride,
        })
    }

    pub fn iter(&self) -> SampledTicks<'a> {
        self.eligible.iter().copied().step_by(self.stride)
    }

    /// Number of ticks `iter()` yields
    pub fn len(&self) -> usize {
        self.eligible.len().div_ceil(self.stride)
    }

    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

impl<'a> IntoIterator for &TickSampler<'a> {
    type Item = Tick;
    type IntoIter = SampledTicks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from_tick: Tick, stop_tick: Tick, stride: usize) -> SamplingConfig {
        SamplingConfig {
            from_tick,
            stop_tick,
            stride,
        }
    }

    #[test]
    fn test_stride_one_yields_every_eligible_tick() {
        let ticks: Vec<Tick> = (0..=10).collect();
        let sampler = TickSampler::new(&ticks, config(3, 7, 1)).unwrap();
        let sampled: Vec<Tick> = sampler.iter().collect();
        assert_eq!(sampled, vec![3, 4, 5, 6, 7]);
        assert_eq!(sampler.len(), 5);
    }

    #[test]
    fn test_stride_counts_in_index_not_tick_value() {
        // series sampled every 10 ticks
        let ticks: Vec<Tick> = (0..20).map(|i| i * 10).collect();
        let sampler = TickSampler::new(&ticks, config(15, 120, 3)).unwrap();
        let sampled: Vec<Tick> = sampler.iter().collect();
        // first eligible tick is 20, then every third entry
        assert_eq!(sampled, vec![20, 50, 80, 110]);
        assert_eq!(sampler.len(), sampled.len());
    }

    #[test]
    fn test_sample_size_bound() {
        let n: Tick = 100;
        let ticks: Vec<Tick> = (0..=n).collect();
        for stride in 1..12 {
            for (from, stop) in [(0, 100), (7, 93), (50, 50), (99, 150)] {
                let sampler = TickSampler::new(&ticks, config(from, stop, stride)).unwrap();
                let sampled: Vec<Tick> = sampler.iter().collect();
                let eligible = (stop.min(n) - from + 1) as usize;
                assert_eq!(sampled.len(), (eligible + stride - 1) / stride);
                assert_eq!(sampled[0], from);
                for pair in sampled.windows(2) {
                    assert_eq!(pair[1] - pair[0], stride as Tick);
                }
            }
        }
    }

    #[test]
    fn test_restartable() {
        let ticks: Vec<Tick> = vec![1, 2, 4, 8, 16];
        let sampler = TickSampler::new(&ticks, config(0, 100, 2)).unwrap();
        let first: Vec<Tick> = sampler.iter().collect();
        let second: Vec<Tick> = (&sampler).into_iter().collect();
        assert_eq!(first, vec![1, 4, 16]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_range_is_not_an_error() {
        let ticks: Vec<Tick> = vec![10, 20, 30];
        let sampler = TickSampler::new(&ticks, config(21, 29, 1)).unwrap();
        assert!(sampler.is_empty());
        assert_eq!(sampler.iter().count(), 0);

        let inverted = TickSampler::new(&ticks, config(30, 10, 1)).unwrap();
        assert!(inverted.is_empty());

        let none = TickSampler::new(&[], config(0, 10, 1)).unwrap();
        assert_eq!(none.len(), 0);
    }

    #[test]
    fn test_huge_stride_yields_first_tick_only() {
        let ticks: Vec<Tick> = vec![1, 2, 3];
        let sampler = TickSampler::new(&ticks, config(0, 10, usize::MAX)).unwrap();
        assert_eq!(sampler.len(), 1);
        assert_eq!(sampler.iter().count(), 1);
        assert_eq!(sampler.iter().next(), Some(1));
    }

    #[test]
    fn test_invalid_inputs() {
        let ticks: Vec<Tick> = vec![1, 2, 3];
        assert!(matches!(
            TickSampler::new(&ticks, config(0, 10, 0)),
            Err(ReplayError::Configuration { .. })
        ));
        assert!(matches!(
            TickSampler::new(&[3, 2, 5], config(0, 10, 1)),
            Err(ReplayError::Configuration { .. })
        ));
    }
}
