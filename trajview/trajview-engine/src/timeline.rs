use std::collections::BTreeSet;

use ordered_float::NotNan;

use trajview_types::Sample;

/// The distinct sample times of one stream, strictly ascending.
///
/// The position of a time in this sequence is its tick index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    times: Vec<f64>,
}

impl Timeline {
    /// Collect the distinct times of `samples`.
    ///
    /// Two times are the same tick only if they are the same floating point
    /// value. NaN times are skipped.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let distinct: BTreeSet<NotNan<f64>> = samples
            .iter()
            .filter_map(|s| NotNan::new(s.time).ok())
            .collect();
        Self {
            times: distinct.into_iter().map(NotNan::into_inner).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The time recorded at `tick`.
    pub fn time(&self, tick: usize) -> Option<f64> {
        self.times.get(tick).copied()
    }

    /// The tick at which exactly `time` was recorded.
    pub fn tick_of(&self, time: f64) -> Option<usize> {
        let time = NotNan::new(time).ok()?;
        self.times
            .binary_search_by(|t| NotNan::new(*t).map_or(std::cmp::Ordering::Less, |t| t.cmp(&time)))
            .ok()
    }
}
