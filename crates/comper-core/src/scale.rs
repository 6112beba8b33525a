//! Scales, modes and diatonic chord tables

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordQuality};
use crate::error::{Result, TheoryError};
use crate::pitch::{NoteName, PitchClass};

// ============================================================================
// Scale Kinds
// ============================================================================

/// Scale/mode types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    Major,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    NaturalMinor,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    WholeTone,
    Chromatic,
}

impl ScaleKind {
    /// The seven modes of the major scale, Ionian first
    pub const MODES: [ScaleKind; 7] = [
        Self::Major,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::NaturalMinor,
        Self::Locrian,
    ];

    /// Order in which scale detection tries candidates
    pub const DETECTION_ORDER: [ScaleKind; 10] = [
        Self::Major,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::NaturalMinor,
        Self::Locrian,
        Self::HarmonicMinor,
        Self::MelodicMinor,
        Self::WholeTone,
    ];

    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Self::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Self::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Self::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Self::WholeTone => &[0, 2, 4, 6, 8, 10],
            Self::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::NaturalMinor => "Natural Minor",
            Self::Locrian => "Locrian",
            Self::HarmonicMinor => "Harmonic Minor",
            Self::MelodicMinor => "Melodic Minor",
            Self::WholeTone => "Whole Tone",
            Self::Chromatic => "Chromatic",
        }
    }

    /// Name used for the mode in generated part titles
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Major => "Ionian",
            Self::NaturalMinor => "Aeolian",
            other => other.name(),
        }
    }

    /// Case-insensitive lookup, accepting mode aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();
        match normalized.as_str() {
            "major" | "ionian" => Some(Self::Major),
            "dorian" => Some(Self::Dorian),
            "phrygian" => Some(Self::Phrygian),
            "lydian" => Some(Self::Lydian),
            "mixolydian" => Some(Self::Mixolydian),
            "minor" | "naturalminor" | "aeolian" => Some(Self::NaturalMinor),
            "locrian" => Some(Self::Locrian),
            "harmonicminor" => Some(Self::HarmonicMinor),
            "melodicminor" => Some(Self::MelodicMinor),
            "wholetone" => Some(Self::WholeTone),
            "chromatic" => Some(Self::Chromatic),
            _ => None,
        }
    }

    /// Seven-note scales get one letter per degree
    pub fn is_heptatonic(&self) -> bool {
        self.intervals().len() == 7
    }
}

// ============================================================================
// Scale
// ============================================================================

/// A spelled scale on a tonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub tonic: NoteName,
    pub kind: ScaleKind,
    pub notes: Vec<NoteName>,
}

impl Scale {
    pub fn new(tonic: NoteName, kind: ScaleKind) -> Self {
        let notes = if kind.is_heptatonic() {
            kind.intervals()
                .iter()
                .enumerate()
                .map(|(step, &interval)| tonic.transpose(step, interval))
                .collect()
        } else {
            let prefer_flats = tonic.accidental < 0;
            kind.intervals()
                .iter()
                .map(|&interval| {
                    if interval == 0 {
                        tonic
                    } else {
                        NoteName::from_pitch_class(
                            (tonic.pitch_class() + interval) % 12,
                            prefer_flats,
                        )
                    }
                })
                .collect()
        };
        Self { tonic, kind, notes }
    }

    pub fn chromatic(tonic: NoteName) -> Self {
        Self::new(tonic, ScaleKind::Chromatic)
    }

    /// Look up a scale by "<tonic> <name>", e.g. "D mixolydian"
    pub fn lookup(query: &str) -> Result<Self> {
        let Some((tonic, rest)) = NoteName::parse_prefix(query.trim()) else {
            return Err(TheoryError::UnknownScale(query.to_string()));
        };
        let kind = ScaleKind::from_name(rest)
            .ok_or_else(|| TheoryError::UnknownScale(query.to_string()))?;
        Ok(Self::new(tonic, kind))
    }

    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        self.notes.iter().map(|n| n.pitch_class()).collect()
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        self.notes.iter().any(|n| n.pitch_class() == pc % 12)
    }

    /// Chord built by stacking every other scale note from `degree` (0-based)
    fn stacked(&self, degree: usize, voices: usize) -> Option<Chord> {
        let len = self.notes.len();
        if len != 7 {
            return None;
        }
        let root = self.notes[degree % len];
        let intervals: Vec<u8> = (0..voices)
            .map(|v| {
                let note = self.notes[(degree + v * 2) % len];
                (note.pitch_class() + 12 - root.pitch_class()) % 12
            })
            .collect();
        ChordQuality::from_intervals(&intervals).map(|q| Chord::new(root, q))
    }

    /// Triad on a 0-based degree
    pub fn triad(&self, degree: usize) -> Option<Chord> {
        self.stacked(degree, 3)
    }

    /// Seventh chord on a 0-based degree
    pub fn seventh(&self, degree: usize) -> Option<Chord> {
        self.stacked(degree, 4)
    }

    /// Triads on every degree; empty for non-heptatonic scales
    pub fn diatonic_triads(&self) -> Vec<Chord> {
        (0..self.notes.len()).filter_map(|d| self.triad(d)).collect()
    }

    /// Seventh chords on every degree; empty for non-heptatonic scales
    pub fn diatonic_sevenths(&self) -> Vec<Chord> {
        (0..self.notes.len()).filter_map(|d| self.seventh(d)).collect()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.kind.name())
    }
}

/// Best-effort scale detection: first catalogue scale on `root` containing every pitch class
pub fn detect_scale(root: NoteName, pcs: &[PitchClass]) -> Option<Scale> {
    ScaleKind::DETECTION_ORDER
        .iter()
        .map(|&kind| Scale::new(root, kind))
        .find(|scale| pcs.iter().all(|&pc| scale.contains(pc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Letter;

    fn names(scale: &Scale) -> Vec<String> {
        scale.notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_heptatonic_spelling() {
        let d_mix = Scale::new(NoteName::natural(Letter::D), ScaleKind::Mixolydian);
        assert_eq!(names(&d_mix), ["D", "E", "F#", "G", "A", "B", "C"]);

        let f_major = Scale::new(NoteName::natural(Letter::F), ScaleKind::Major);
        assert_eq!(names(&f_major), ["F", "G", "A", "Bb", "C", "D", "E"]);

        let d_lydian = Scale::new(NoteName::natural(Letter::D), ScaleKind::Lydian);
        assert_eq!(names(&d_lydian), ["D", "E", "F#", "G#", "A", "B", "C#"]);
    }

    #[test]
    fn test_whole_tone_uses_flats_for_flat_tonic() {
        let bb = Scale::new(NoteName::new(Letter::B, -1), ScaleKind::WholeTone);
        assert_eq!(names(&bb), ["Bb", "C", "D", "E", "Gb", "Ab"]);
    }

    #[test]
    fn test_lookup() {
        let scale = Scale::lookup("D mixolydian").unwrap();
        assert_eq!(scale.kind, ScaleKind::Mixolydian);
        assert_eq!(scale.tonic.to_string(), "D");
        assert!(Scale::lookup("D hypermixolydian").is_err());
        assert!(Scale::lookup("Q major").is_err());
        assert_eq!(Scale::lookup("A harmonic minor").unwrap().kind, ScaleKind::HarmonicMinor);
    }

    #[test]
    fn test_diatonic_triads_major() {
        let c = Scale::new(NoteName::natural(Letter::C), ScaleKind::Major);
        let symbols: Vec<String> = c.diatonic_triads().iter().map(|c| c.symbol()).collect();
        assert_eq!(symbols, ["C", "Dm", "Em", "F", "G", "Am", "Bdim"]);
    }

    #[test]
    fn test_diatonic_sevenths_harmonic_minor() {
        let a = Scale::new(NoteName::natural(Letter::A), ScaleKind::HarmonicMinor);
        let symbols: Vec<String> = a.diatonic_sevenths().iter().map(|c| c.symbol()).collect();
        assert_eq!(
            symbols,
            ["AmMaj7", "Bm7b5", "Cmaj7#5", "Dm7", "E7", "Fmaj7", "G#dim7"]
        );
    }

    #[test]
    fn test_detect_scale() {
        // C E G Bb fits C Mixolydian before any minor scale
        let found = detect_scale(NoteName::natural(Letter::C), &[0, 4, 7, 10]).unwrap();
        assert_eq!(found.kind, ScaleKind::Mixolydian);

        // m7b5 lands in Locrian
        let found = detect_scale(NoteName::natural(Letter::B), &[11, 2, 5, 9]).unwrap();
        assert_eq!(found.kind, ScaleKind::Locrian);

        // minor-major seventh needs harmonic minor
        let found = detect_scale(NoteName::natural(Letter::C), &[0, 3, 7, 11]).unwrap();
        assert_eq!(found.kind, ScaleKind::HarmonicMinor);

        // a cluster fits nothing
        assert!(detect_scale(NoteName::natural(Letter::C), &[0, 1, 2, 3]).is_none());
    }
}
