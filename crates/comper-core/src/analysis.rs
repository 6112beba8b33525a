//! Key and mode analysis of a chord sequence

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, split_bass};
use crate::pitch::{Key, NoteName, PitchClass};
use crate::scale::{Scale, ScaleKind};

/// Tonal frameworks a part can be heard in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
}

impl Framework {
    /// Tie-break order: earlier wins on equal score
    pub const ALL: [Framework; 4] = [
        Self::Major,
        Self::NaturalMinor,
        Self::HarmonicMinor,
        Self::MelodicMinor,
    ];

    pub fn scale_kind(&self) -> ScaleKind {
        match self {
            Self::Major => ScaleKind::Major,
            Self::NaturalMinor => ScaleKind::NaturalMinor,
            Self::HarmonicMinor => ScaleKind::HarmonicMinor,
            Self::MelodicMinor => ScaleKind::MelodicMinor,
        }
    }

    pub fn is_minor(&self) -> bool {
        !matches!(self, Self::Major)
    }

    pub fn name(&self) -> &'static str {
        self.scale_kind().name()
    }

    /// Triad degrees (0-based) that earn a double bonus
    fn weighted_degrees(&self) -> &'static [usize] {
        match self {
            Self::Major | Self::NaturalMinor => &[],
            Self::HarmonicMinor => &[4],
            Self::MelodicMinor => &[3, 5],
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkScore {
    pub framework: Framework,
    pub score: u32,
}

/// Outcome of [`analyze`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAnalysis {
    /// Nominal key the analysis was run against
    pub key: Key,
    /// All four frameworks, best first
    pub ranking: Vec<FrameworkScore>,
    pub primary: Framework,
    pub secondary: Framework,
    /// False when the nominal mode disagrees with the primary framework
    pub consistent: bool,
}

impl KeyAnalysis {
    pub fn score(&self, framework: Framework) -> u32 {
        self.ranking
            .iter()
            .find(|s| s.framework == framework)
            .map_or(0, |s| s.score)
    }

    /// Tonic a framework is built on: the relative major for Major,
    /// the relative minor for the minor frameworks.
    ///
    /// The nominal tonic is not used directly. A part nominally in "C" that
    /// ranks Natural Minor is heard in A minor, not C minor, so scores and
    /// the primary scale stay on the same pitch collection.
    pub fn tonic(&self, framework: Framework) -> NoteName {
        framework_tonic(self.key, framework)
    }

    /// Scale of the primary framework on its tonic
    pub fn primary_scale(&self) -> Scale {
        Scale::new(self.tonic(self.primary), self.primary.scale_kind())
    }
}

fn framework_tonic(key: Key, framework: Framework) -> NoteName {
    if framework.is_minor() {
        key.relative_minor()
    } else {
        key.relative_major()
    }
}

/// A chord symbol decoded for scoring, slash bass dropped
struct Decoded {
    chord: Option<Chord>,
    pcs: Vec<PitchClass>,
}

fn decode(symbol: &str) -> Decoded {
    let (head, _) = split_bass(symbol.trim());
    match Chord::parse(head) {
        Ok(chord) => Decoded {
            pcs: chord.pitch_classes(),
            chord: Some(chord),
        },
        Err(err) => {
            tracing::debug!("Not scoring chord {}: {}", symbol, err);
            Decoded {
                chord: None,
                pcs: Vec::new(),
            }
        }
    }
}

/// The chord itself must be the triad: sevenths and extensions do not count
fn matches_triad(decoded: &Decoded, triad: &Chord) -> bool {
    decoded.chord.is_some_and(|c| c.same_sound(triad))
}

fn score_framework(chords: &[Decoded], key: Key, framework: Framework) -> u32 {
    let scale = Scale::new(framework_tonic(key, framework), framework.scale_kind());
    let triads = scale.diatonic_triads();

    let triad_matches = chords
        .iter()
        .filter(|d| triads.iter().any(|t| matches_triad(d, t)))
        .count();
    let note_matches = chords
        .iter()
        .filter(|d| d.pcs.iter().any(|&pc| scale.contains(pc)))
        .count();
    let bonus: usize = framework
        .weighted_degrees()
        .iter()
        .filter_map(|&degree| triads.get(degree))
        .map(|triad| chords.iter().filter(|d| matches_triad(d, triad)).count() * 2)
        .sum();

    (triad_matches + note_matches + bonus) as u32
}

/// Score a chord sequence against the four frameworks on the key's
/// relative major/minor pair and rank them.
pub fn analyze<'a>(symbols: impl IntoIterator<Item = &'a str>, key: Key) -> KeyAnalysis {
    let chords: Vec<Decoded> = symbols.into_iter().map(decode).collect();

    let mut ranking: Vec<FrameworkScore> = Framework::ALL
        .iter()
        .map(|&framework| FrameworkScore {
            framework,
            score: score_framework(&chords, key, framework),
        })
        .collect();
    // stable: equal scores keep declaration order
    ranking.sort_by(|a, b| b.score.cmp(&a.score));

    let primary = ranking[0].framework;
    let secondary = ranking[1].framework;
    let consistent = key.minor == primary.is_minor();
    if !consistent {
        tracing::warn!(
            "Nominal key {} ({}) disagrees with analysis ({})",
            key,
            if key.minor { "minor" } else { "major" },
            primary
        );
    }

    KeyAnalysis {
        key,
        ranking,
        primary,
        secondary,
        consistent,
    }
}
