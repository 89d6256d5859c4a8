use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::PulseError,
    observe::Stage,
    time::{average_interval, validate_timestamps},
};

// Beyond this many points the period is treated as degenerate.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Strictly increasing points; `avg_interval` is the period they were extended with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    points: Vec<f64>,
    avg_interval: f64,
}

impl BeatGrid {
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    #[must_use]
    pub fn avg_interval(&self) -> f64 {
        self.avg_interval
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        self.points
            .binary_search_by(|point| point.total_cmp(&time))
            .is_ok()
    }

}

#[must_use]
pub fn coverage_end(beats: &[f64], onsets: &[f64], avg_interval: f64) -> f64 {
    let latest = beats
        .iter()
        .chain(onsets)
        .fold(0.0_f64, |latest, time| latest.max(*time));
    latest + avg_interval
}

#[instrument(skip(beats), fields(beat_count = beats.len(), coverage_end))]
pub fn build_grid(beats: &[f64], coverage_end: f64) -> Result<BeatGrid, PulseError> {
    validate_timestamps(Stage::Grid, "beats", beats)?;
    validate_timestamps(Stage::Grid, "coverage_end", &[coverage_end])?;
    let avg_interval = checked_interval(beats)?;
    check_extent(beats, avg_interval, coverage_end)?;
    Ok(extend(beats, avg_interval, coverage_end))
}

#[instrument(skip(beats, onsets), fields(beat_count = beats.len(), onset_count = onsets.len()))]
pub fn build_grid_for_events(beats: &[f64], onsets: &[f64]) -> Result<BeatGrid, PulseError> {
    validate_timestamps(Stage::Grid, "beats", beats)?;
    validate_timestamps(Stage::Grid, "onsets", onsets)?;
    let avg_interval = checked_interval(beats)?;
    let end = coverage_end(beats, onsets, avg_interval);
    check_extent(beats, avg_interval, end)?;
    Ok(extend(beats, avg_interval, end))
}

fn checked_interval(beats: &[f64]) -> Result<f64, PulseError> {
    let avg_interval = average_interval(beats).ok_or(PulseError::InsufficientBeats {
        stage: Stage::Grid,
        count: beats.len(),
    })?;

    if avg_interval <= 0.0 || !avg_interval.is_finite() {
        return Err(PulseError::DegenerateInterval {
            stage: Stage::Grid,
            avg_interval,
            beats: beats.to_vec(),
        });
    }

    Ok(avg_interval)
}

fn check_extent(beats: &[f64], avg_interval: f64, coverage_end: f64) -> Result<(), PulseError> {
    let span = coverage_end.max(beats[beats.len() - 1]);
    let estimated = span / avg_interval + beats.len() as f64;
    if estimated > MAX_GRID_POINTS as f64 {
        return Err(PulseError::DegenerateInterval {
            stage: Stage::Grid,
            avg_interval,
            beats: beats.to_vec(),
        });
    }
    Ok(())
}

fn extend(beats: &[f64], avg_interval: f64, coverage_end: f64) -> BeatGrid {
    let first = beats[0];
    let last = beats[beats.len() - 1];

    let mut points = Vec::with_capacity(beats.len() + 16);

    let mut t = first;
    loop {
        let next = t - avg_interval;
        // Stop on no progress as well: a period below the float spacing at `t`.
        if next <= 0.0 || next == t {
            break;
        }
        points.push(next);
        t = next;
    }
    points.reverse();

    points.extend_from_slice(beats);

    let mut t = last;
    loop {
        let next = t + avg_interval;
        if next >= coverage_end || next == t {
            break;
        }
        points.push(next);
        t = next;
    }

    points.sort_by(f64::total_cmp);
    points.dedup();

    debug!(
        grid_points = points.len(),
        avg_interval, coverage_end, "beat grid built"
    );

    BeatGrid {
        points,
        avg_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn backward_extension_stops_before_zero() {
        let grid = build_grid(&[1.0, 1.5, 2.0, 2.5], 3.0).expect("grid should build");
        assert_close(grid.points()[0], 0.5);
        assert!(grid.points().iter().all(|point| *point > 0.0));
        assert_eq!(grid.points(), &[0.5, 1.0, 1.5, 2.0, 2.5]);
    }

    #[test]
    fn forward_extension_stays_below_coverage_end() {
        let grid = build_grid(&[0.5, 1.0], 2.6).expect("grid should build");
        assert_eq!(grid.points(), &[0.5, 1.0, 1.5, 2.0, 2.5]);
        let exact = build_grid(&[0.5, 1.0], 2.5).expect("grid should build");
        assert_eq!(exact.points().last().copied(), Some(2.0));
    }

    #[test]
    fn average_interval_comes_from_leading_beats() {
        let grid = build_grid(&[1.0, 2.0, 3.0, 4.0, 4.5], 5.0).expect("grid should build");
        assert_close(grid.avg_interval(), 1.0);
        assert!(grid.contains(4.5));
    }

    #[test]
    fn single_beat_is_insufficient() {
        let err = build_grid(&[1.0], 2.0).expect_err("one beat cannot define a period");
        assert!(matches!(err, PulseError::InsufficientBeats { count: 1, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn repeated_beats_are_degenerate() {
        let err = build_grid(&[1.0, 1.0], 2.0).expect_err("zero period must fail");
        assert!(matches!(err, PulseError::DegenerateInterval { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn descending_beats_are_degenerate() {
        let err = build_grid(&[2.0, 1.0], 3.0).expect_err("negative period must fail");
        assert!(matches!(err, PulseError::DegenerateInterval { avg_interval, .. } if avg_interval < 0.0));
    }

    #[test]
    fn tiny_period_over_long_timeline_is_rejected() {
        let err = build_grid_for_events(&[0.0, 1e-6], &[20.0])
            .expect_err("twenty million points must not be allocated");
        match err {
            PulseError::DegenerateInterval {
                stage,
                avg_interval,
                beats,
            } => {
                assert_eq!(stage, Stage::Grid);
                assert_close(avg_interval, 1e-6);
                assert_eq!(beats, vec![0.0, 1e-6]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let grid = build_grid(&[0.0, 0.001], 60.0).expect("sixty thousand points fit");
        assert!(grid.len() <= MAX_GRID_POINTS);
    }

    #[test]
    fn non_finite_beats_are_invalid_input() {
        let err = build_grid(&[0.5, f64::INFINITY], 2.0).expect_err("inf must fail");
        assert!(matches!(err, PulseError::InvalidInput { field: "beats", .. }));
    }

    #[test]
    fn coverage_follows_latest_event() {
        let beats = [0.5, 1.0, 1.5, 2.0];
        assert_close(coverage_end(&beats, &[0.52, 1.49, 3.1], 0.5), 3.6);
        assert_close(coverage_end(&beats, &[], 0.5), 2.5);

        let grid = build_grid_for_events(&beats, &[0.52, 1.49, 3.1]).expect("grid should build");
        let last = grid.points().last().copied().expect("grid is not empty");
        assert_close(last, 3.5);
    }
}
