//! Rhythm tiles and the tiler that fits them to a length

use std::fmt;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TheoryError};
use crate::part::BEAT_EPSILON;

/// Named duration patterns, in beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RhythmPattern {
    Straight,
    Syncopated,
    Latin,
}

impl RhythmPattern {
    pub const ALL: [RhythmPattern; 3] = [Self::Straight, Self::Syncopated, Self::Latin];

    pub fn durations(&self) -> &'static [f64] {
        match self {
            Self::Straight => &[1.0, 1.0, 1.0, 1.0],
            Self::Syncopated => &[1.5, 0.5, 1.5, 0.5],
            Self::Latin => &[0.75, 0.75, 0.5],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Syncopated => "syncopated",
            Self::Latin => "latin",
        }
    }

    pub fn random(rng: &mut Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// This pattern tiled to `target` beats
    pub fn tile(&self, target: f64) -> Vec<f64> {
        // built-in patterns are all positive
        tile(self.durations(), target).unwrap_or_default()
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Repeat `pattern` end-to-end, keeping each step only if the running total
/// stays within `target`. Overflowing steps are skipped, never truncated, and
/// tiling ends after a full pass adds nothing.
pub fn tile(pattern: &[f64], target: f64) -> Result<Vec<f64>> {
    if let Some(bad) = pattern.iter().find(|d| **d <= 0.0 || !d.is_finite()) {
        return Err(TheoryError::InvalidPattern(format!(
            "step duration must be positive, got {bad}"
        )));
    }
    if target <= 0.0 {
        return Ok(Vec::new());
    }
    if pattern.is_empty() {
        return Err(TheoryError::InvalidPattern("empty pattern".to_string()));
    }

    let mut steps = Vec::new();
    let mut total = 0.0;
    while total < target - BEAT_EPSILON {
        let mut added = false;
        for &duration in pattern {
            if total + duration <= target + BEAT_EPSILON {
                steps.push(duration);
                total += duration;
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_fills_exactly() {
        assert_eq!(RhythmPattern::Straight.tile(8.0), vec![1.0; 8]);
    }

    #[test]
    fn test_latin_tiles_whole_cycles() {
        let steps = RhythmPattern::Latin.tile(4.0);
        assert_eq!(steps, vec![0.75, 0.75, 0.5, 0.75, 0.75, 0.5]);
    }

    #[test]
    fn test_overflowing_steps_are_skipped_not_truncated() {
        // 1.5 overflows on the first pass and is skipped; the trailing 0.5 still fits
        let steps = tile(&[1.5, 0.5, 1.5, 0.5], 3.0).unwrap();
        assert_eq!(steps, vec![1.5, 0.5, 0.5, 0.5]);
        for d in &steps {
            assert!([1.5, 0.5].contains(d));
        }
    }

    #[test]
    fn test_terminates_when_nothing_fits() {
        let steps = tile(&[3.0], 4.0).unwrap();
        assert_eq!(steps, vec![3.0]);
        assert!(tile(&[5.0], 4.0).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_steps() {
        assert!(tile(&[1.0, 0.0], 4.0).is_err());
        assert!(tile(&[-1.0], 4.0).is_err());
        assert!(tile(&[], 4.0).is_err());
        assert!(tile(&[], 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_tiles_never_exceed_target() {
        for pattern in RhythmPattern::ALL {
            for target in [1.0, 2.0, 3.0, 4.0, 5.5, 8.0, 16.0] {
                let sum: f64 = pattern.tile(target).iter().sum();
                assert!(sum <= target + BEAT_EPSILON, "{pattern} {target}: {sum}");
            }
        }
    }
}
