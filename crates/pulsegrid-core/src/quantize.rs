use tracing::{debug, instrument};

use crate::{error::PulseError, grid::BeatGrid, observe::Stage, time::validate_timestamps};

pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.25;

#[instrument(skip(onsets, grid), fields(onset_count = onsets.len(), grid_points = grid.len()))]
pub fn quantize_onsets(
    onsets: &[f64],
    grid: &BeatGrid,
    tolerance_ratio: f64,
) -> Result<Vec<f64>, PulseError> {
    validate_timestamps(Stage::Quantize, "onsets", onsets)?;
    if onsets.is_empty() || grid.len() < 2 {
        return Ok(Vec::new());
    }

    let tolerance = grid.avg_interval() * tolerance_ratio;
    let points = grid.points();

    let mut quantized: Vec<f64> = onsets
        .iter()
        .filter_map(|onset| {
            let (index, distance) = nearest_point(points, *onset)?;
            (distance < tolerance).then_some(points[index])
        })
        .collect();

    quantized.sort_by(f64::total_cmp);
    quantized.dedup();

    debug!(
        accepted = quantized.len(),
        tolerance, "onset quantization completed"
    );
    Ok(quantized)
}

/// Index and distance of the grid point nearest to `time`.
///
/// Among equidistant points the earliest wins.
#[must_use]
pub fn nearest_point(points: &[f64], time: f64) -> Option<(usize, f64)> {
    let split = points.partition_point(|point| *point < time);

    let before = split
        .checked_sub(1)
        .map(|index| (index, (points[index] - time).abs()));
    let after = points
        .get(split)
        .map(|point| (split, (point - time).abs()));

    match (before, after) {
        (Some(left), Some(right)) => Some(if right.1 < left.1 { right } else { left }),
        (left, right) => left.or(right),
    }
}
