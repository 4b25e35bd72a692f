use std::collections::BTreeMap;

use trajview_types::{Sample, TrajectoryId};

use crate::Timeline;

#[derive(Debug, Clone, Default)]
struct TickSamples {
    /// All rows at this tick, in input order.
    samples: Vec<Sample>,
    /// First row of each trajectory at this tick.
    by_id: BTreeMap<TrajectoryId, usize>,
}

/// The samples of one stream, grouped by tick.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    timeline: Timeline,
    ticks: Vec<TickSamples>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        let timeline = Timeline::from_samples(&samples);
        let mut ticks = vec![TickSamples::default(); timeline.len()];
        for sample in samples {
            let Some(tick) = timeline.tick_of(sample.time) else {
                continue;
            };
            let entry = &mut ticks[tick];
            entry
                .by_id
                .entry(sample.trajectory_id)
                .or_insert(entry.samples.len());
            entry.samples.push(sample);
        }
        Self { timeline, ticks }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Number of ticks.
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Every sample recorded at `tick`. Empty if `tick` is out of range.
    pub fn samples_at(&self, tick: usize) -> &[Sample] {
        self.ticks
            .get(tick)
            .map(|t| t.samples.as_slice())
            .unwrap_or(&[])
    }

    /// The sample of trajectory `id` at `tick`, if it was recorded.
    pub fn find(&self, tick: usize, id: TrajectoryId) -> Option<&Sample> {
        let entry = self.ticks.get(tick)?;
        entry.by_id.get(&id).map(|&i| &entry.samples[i])
    }
}
