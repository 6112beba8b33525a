//! Probabilistic chord progression generation

use std::fmt;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::chord::ChordQuality;
use crate::part::{ChordChange, ChordPart};
use crate::pitch::Key;
use crate::rhythm::RhythmPattern;
use crate::scale::{Scale, ScaleKind};
use crate::weighted::{WeightedTable, pick};

// ============================================================================
// Harmonic Function
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

const FROM_TONIC: [(HarmonicFunction, f64); 3] = [
    (HarmonicFunction::Tonic, 0.1),
    (HarmonicFunction::Subdominant, 0.4),
    (HarmonicFunction::Dominant, 0.5),
];
const FROM_SUBDOMINANT: [(HarmonicFunction, f64); 3] = [
    (HarmonicFunction::Tonic, 0.2),
    (HarmonicFunction::Subdominant, 0.2),
    (HarmonicFunction::Dominant, 0.6),
];
const FROM_DOMINANT: [(HarmonicFunction, f64); 3] = [
    (HarmonicFunction::Tonic, 0.8),
    (HarmonicFunction::Subdominant, 0.1),
    (HarmonicFunction::Dominant, 0.1),
];

impl HarmonicFunction {
    /// Transition weights out of this function
    pub fn transitions(&self) -> WeightedTable<'static, HarmonicFunction> {
        match self {
            Self::Tonic => WeightedTable::new(&FROM_TONIC),
            Self::Subdominant => WeightedTable::new(&FROM_SUBDOMINANT),
            Self::Dominant => WeightedTable::new(&FROM_DOMINANT),
        }
    }

    /// Function of a 0-based scale degree: I, iii, vi tonic; ii, IV subdominant; V, vii dominant
    pub fn of_degree(degree: usize) -> Self {
        match degree % 7 {
            0 | 2 | 5 => Self::Tonic,
            1 | 3 => Self::Subdominant,
            _ => Self::Dominant,
        }
    }
}

/// Mode borrowing weights, parallel to the key
const MODE_WEIGHTS: [(ScaleKind, f64); 7] = [
    (ScaleKind::Major, 0.4),
    (ScaleKind::Dorian, 0.1),
    (ScaleKind::Phrygian, 0.05),
    (ScaleKind::Lydian, 0.1),
    (ScaleKind::Mixolydian, 0.15),
    (ScaleKind::NaturalMinor, 0.15),
    (ScaleKind::Locrian, 0.05),
];

// ============================================================================
// Tension Tables
// ============================================================================

const TONIC_TENSIONS: &[&str] = &["maj7", "maj9", "maj13", "6/9"];
const FOURTH_TENSIONS: &[&str] = &["maj7", "maj9", "6/9", "maj13"];
const MINOR_TENSIONS: &[&str] = &["m7", "m9", "m11"];
const DOMINANT_TENSIONS: &[&str] = &["7", "9", "13", "7(b13)", "7(#11)"];
const HALF_DIMINISHED_TENSIONS: &[&str] = &["m7b5", "m9b5"];

/// Tension variants for each degree of a heptatonic scale, as chord symbols.
///
/// The variant list follows the degree's seventh chord quality, so borrowed
/// modes reuse the same tables: a major seventh on the fourth degree gets the
/// IV list, any other major seventh the I list.
pub fn degree_table(scale: &Scale) -> Vec<Vec<String>> {
    (0..scale.notes.len())
        .filter_map(|degree| scale.seventh(degree).map(|chord| (degree, chord)))
        .map(|(degree, chord)| {
            let tensions: &[&str] = match chord.quality {
                ChordQuality::Major7 if degree == 3 => FOURTH_TENSIONS,
                ChordQuality::Major7 => TONIC_TENSIONS,
                ChordQuality::Minor7 => MINOR_TENSIONS,
                ChordQuality::Dominant7 => DOMINANT_TENSIONS,
                ChordQuality::HalfDiminished7 => HALF_DIMINISHED_TENSIONS,
                other => return vec![format!("{}{}", chord.root, other.suffix())],
            };
            tensions
                .iter()
                .map(|t| format!("{}{}", chord.root, t))
                .collect()
        })
        .collect()
}

// ============================================================================
// Policies
// ============================================================================

/// Progression generation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Function-driven walk with modal interchange
    #[default]
    Functional,
    /// Random degrees from the major or relative-minor table
    Modal,
    /// Chromatically rising major sevenths
    ConstantStructure,
    /// Tonic and major-third relations
    ChromaticMediant,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Self::Functional,
        Self::Modal,
        Self::ConstantStructure,
        Self::ChromaticMediant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Functional => "Enhanced Modal Interchange",
            Self::Modal => "Modal Interchange",
            Self::ConstantStructure => "Constant Structure",
            Self::ChromaticMediant => "Chromatic Mediant",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generate a part of `target` beats in `key` with a randomly chosen rhythm tile
pub fn generate(policy: Policy, key: Key, target: f64, rng: &mut Rng) -> ChordPart {
    let rhythm = RhythmPattern::random(rng);
    generate_with_rhythm(policy, key, target, rhythm, rng)
}

/// Generate a part with an explicit rhythm tile
pub fn generate_with_rhythm(
    policy: Policy,
    key: Key,
    target: f64,
    rhythm: RhythmPattern,
    rng: &mut Rng,
) -> ChordPart {
    tracing::info!(
        "Generating progression: {} in {} ({} beats, {} rhythm)",
        policy,
        key,
        target,
        rhythm
    );

    let durations = rhythm.tile(target);
    let symbols: Vec<String> = match policy {
        Policy::Functional => functional(key, durations.len(), rng),
        Policy::Modal => modal(key, durations.len(), rng),
        Policy::ConstantStructure => constant_structure(key, durations.len()),
        Policy::ChromaticMediant => chromatic_mediant(key, durations.len(), rng),
    };

    let mut part = ChordPart::new(format!("{} in {}", policy, key), key, target);
    let mut cursor = 0.0;
    for (symbol, duration) in symbols.into_iter().zip(durations) {
        if part.push(ChordChange::new(symbol, cursor, duration)) {
            cursor += duration;
        }
    }
    part
}

fn functional(key: Key, steps: usize, rng: &mut Rng) -> Vec<String> {
    let modes = WeightedTable::new(&MODE_WEIGHTS);
    let tables: Vec<(ScaleKind, Vec<Vec<String>>)> = ScaleKind::MODES
        .iter()
        .map(|&kind| (kind, degree_table(&Scale::new(key.tonic, kind))))
        .collect();

    let mut current = HarmonicFunction::Tonic;
    let mut symbols = Vec::with_capacity(steps);
    for _ in 0..steps {
        let next = current
            .transitions()
            .sample(rng)
            .copied()
            .unwrap_or(HarmonicFunction::Tonic);
        let mode = modes.sample(rng).copied().unwrap_or(ScaleKind::Major);
        let Some((_, table)) = tables.iter().find(|(kind, _)| *kind == mode) else {
            continue;
        };
        let candidates: Vec<&String> = table
            .iter()
            .enumerate()
            .filter(|(degree, _)| HarmonicFunction::of_degree(*degree) == next)
            .flat_map(|(_, variants)| variants)
            .collect();
        if let Some(symbol) = pick(rng, &candidates) {
            tracing::debug!("{:?} -> {:?} via {}: {}", current, next, mode.mode_name(), symbol);
            symbols.push((*symbol).clone());
            current = next;
        }
    }
    symbols
}

fn modal(key: Key, steps: usize, rng: &mut Rng) -> Vec<String> {
    let major = degree_table(&Scale::new(key.relative_major(), ScaleKind::Major));
    let minor = degree_table(&Scale::new(key.relative_minor(), ScaleKind::NaturalMinor));

    let mut symbols = Vec::with_capacity(steps);
    for _ in 0..steps {
        let table = if rng.f64() > 0.7 { &minor } else { &major };
        if let Some(symbol) = pick(rng, table).and_then(|variants| pick(rng, variants)) {
            symbols.push(symbol.clone());
        }
    }
    symbols
}

fn constant_structure(key: Key, steps: usize) -> Vec<String> {
    let chromatic = Scale::chromatic(key.tonic);
    chromatic
        .notes
        .iter()
        .cycle()
        .take(steps)
        .map(|root| format!("{root}maj7"))
        .collect()
}

fn chromatic_mediant(key: Key, steps: usize, rng: &mut Rng) -> Vec<String> {
    let choices = [
        format!("{}maj7", key.tonic),
        format!("{}maj7", key.tonic.transpose(2, 4)),
        format!("{}maj7", key.tonic.transpose(5, 8)),
    ];
    (0..steps)
        .filter_map(|_| pick(rng, &choices).cloned())
        .collect()
}
