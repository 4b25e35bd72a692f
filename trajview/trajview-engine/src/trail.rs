use trajview_types::Sample;

use crate::Dataset;

/// How much history is drawn behind an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailSpec {
    /// Maximum number of historical ticks scanned, and thus of points returned.
    pub length: usize,
    /// Ticks skipped between the current tick and the first scanned one.
    pub offset: usize,
}

/// The recent positions of `target`'s trajectory, nearest first.
///
/// Scans `spec.length` ticks starting `spec.offset` ticks before `tick`. Ticks
/// where the trajectory has no sample are skipped but still count against the
/// length, and the scan stops at tick 0.
pub fn resolve_trail(data: &Dataset, tick: usize, target: &Sample, spec: &TrailSpec) -> Vec<Sample> {
    let mut trail = Vec::new();
    for back in spec.offset..spec.offset.saturating_add(spec.length) {
        let Some(past) = tick.checked_sub(back) else {
            break;
        };
        if let Some(sample) = data.find(past, target.trajectory_id) {
            trail.push(*sample);
        }
    }
    trail
}
