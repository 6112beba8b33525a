//! Chord symbols, qualities and voicings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TheoryError};
use crate::pitch::{NoteName, PitchClass};

// ============================================================================
// Chord Quality
// ============================================================================

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    MinorMajor7,
    AugmentedMajor7,
    Augmented7,
    Sus2,
    Sus4,
    Dominant7Sus4,
    Power,
    Add9,
    MinorAdd9,
    Major6,
    Minor6,
    SixNine,
    Major9,
    Major13,
    Major7Sharp11,
    Minor9,
    Minor11,
    Dominant9,
    Dominant11,
    Dominant13,
    Dominant7Flat5,
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant7Sharp11,
    Dominant7Flat13,
    HalfDiminished9,
}

/// Broad classification used for chord-scale choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordFamily {
    Major,
    Minor,
    Dominant,
    Diminished,
    Augmented,
    Other,
}

/// Accepted suffix spellings. Parentheses are stripped before lookup, so
/// "7(b13)" resolves through "7b13".
const SUFFIXES: &[(&str, ChordQuality)] = &[
    ("", ChordQuality::Major),
    ("M", ChordQuality::Major),
    ("maj", ChordQuality::Major),
    ("m", ChordQuality::Minor),
    ("mi", ChordQuality::Minor),
    ("min", ChordQuality::Minor),
    ("-", ChordQuality::Minor),
    ("dim", ChordQuality::Diminished),
    ("o", ChordQuality::Diminished),
    ("aug", ChordQuality::Augmented),
    ("+", ChordQuality::Augmented),
    ("maj7", ChordQuality::Major7),
    ("M7", ChordQuality::Major7),
    ("Maj7", ChordQuality::Major7),
    ("m7", ChordQuality::Minor7),
    ("mi7", ChordQuality::Minor7),
    ("min7", ChordQuality::Minor7),
    ("-7", ChordQuality::Minor7),
    ("7", ChordQuality::Dominant7),
    ("dom7", ChordQuality::Dominant7),
    ("dim7", ChordQuality::Diminished7),
    ("o7", ChordQuality::Diminished7),
    ("m7b5", ChordQuality::HalfDiminished7),
    ("min7b5", ChordQuality::HalfDiminished7),
    ("-7b5", ChordQuality::HalfDiminished7),
    ("ø", ChordQuality::HalfDiminished7),
    ("ø7", ChordQuality::HalfDiminished7),
    ("mMaj7", ChordQuality::MinorMajor7),
    ("mmaj7", ChordQuality::MinorMajor7),
    ("mM7", ChordQuality::MinorMajor7),
    ("minmaj7", ChordQuality::MinorMajor7),
    ("maj7#5", ChordQuality::AugmentedMajor7),
    ("+maj7", ChordQuality::AugmentedMajor7),
    ("augmaj7", ChordQuality::AugmentedMajor7),
    ("aug7", ChordQuality::Augmented7),
    ("+7", ChordQuality::Augmented7),
    ("7#5", ChordQuality::Augmented7),
    ("7+5", ChordQuality::Augmented7),
    ("sus2", ChordQuality::Sus2),
    ("sus4", ChordQuality::Sus4),
    ("sus", ChordQuality::Sus4),
    ("7sus4", ChordQuality::Dominant7Sus4),
    ("7sus", ChordQuality::Dominant7Sus4),
    ("5", ChordQuality::Power),
    ("add9", ChordQuality::Add9),
    ("add2", ChordQuality::Add9),
    ("madd9", ChordQuality::MinorAdd9),
    ("6", ChordQuality::Major6),
    ("M6", ChordQuality::Major6),
    ("m6", ChordQuality::Minor6),
    ("6/9", ChordQuality::SixNine),
    ("69", ChordQuality::SixNine),
    ("maj9", ChordQuality::Major9),
    ("M9", ChordQuality::Major9),
    ("maj13", ChordQuality::Major13),
    ("M13", ChordQuality::Major13),
    ("maj7#11", ChordQuality::Major7Sharp11),
    ("m9", ChordQuality::Minor9),
    ("min9", ChordQuality::Minor9),
    ("m11", ChordQuality::Minor11),
    ("min11", ChordQuality::Minor11),
    ("9", ChordQuality::Dominant9),
    ("11", ChordQuality::Dominant11),
    ("13", ChordQuality::Dominant13),
    ("7b5", ChordQuality::Dominant7Flat5),
    ("7b9", ChordQuality::Dominant7Flat9),
    ("7#9", ChordQuality::Dominant7Sharp9),
    ("7#11", ChordQuality::Dominant7Sharp11),
    ("7b13", ChordQuality::Dominant7Flat13),
    ("m9b5", ChordQuality::HalfDiminished9),
];

impl ChordQuality {
    pub const ALL: [ChordQuality; 35] = [
        Self::Major,
        Self::Minor,
        Self::Diminished,
        Self::Augmented,
        Self::Major7,
        Self::Minor7,
        Self::Dominant7,
        Self::Diminished7,
        Self::HalfDiminished7,
        Self::MinorMajor7,
        Self::AugmentedMajor7,
        Self::Augmented7,
        Self::Sus2,
        Self::Sus4,
        Self::Dominant7Sus4,
        Self::Power,
        Self::Add9,
        Self::MinorAdd9,
        Self::Major6,
        Self::Minor6,
        Self::SixNine,
        Self::Major9,
        Self::Major13,
        Self::Major7Sharp11,
        Self::Minor9,
        Self::Minor11,
        Self::Dominant9,
        Self::Dominant11,
        Self::Dominant13,
        Self::Dominant7Flat5,
        Self::Dominant7Flat9,
        Self::Dominant7Sharp9,
        Self::Dominant7Sharp11,
        Self::Dominant7Flat13,
        Self::HalfDiminished9,
    ];

    /// Get chord intervals from root (semitones, may exceed an octave)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::MinorMajor7 => &[0, 3, 7, 11],
            Self::AugmentedMajor7 => &[0, 4, 8, 11],
            Self::Augmented7 => &[0, 4, 8, 10],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Dominant7Sus4 => &[0, 5, 7, 10],
            Self::Power => &[0, 7],
            Self::Add9 => &[0, 4, 7, 14],
            Self::MinorAdd9 => &[0, 3, 7, 14],
            Self::Major6 => &[0, 4, 7, 9],
            Self::Minor6 => &[0, 3, 7, 9],
            Self::SixNine => &[0, 4, 7, 9, 14],
            Self::Major9 => &[0, 4, 7, 11, 14],
            Self::Major13 => &[0, 4, 7, 11, 14, 21],
            Self::Major7Sharp11 => &[0, 4, 7, 11, 18],
            Self::Minor9 => &[0, 3, 7, 10, 14],
            Self::Minor11 => &[0, 3, 7, 10, 14, 17],
            Self::Dominant9 => &[0, 4, 7, 10, 14],
            Self::Dominant11 => &[0, 7, 10, 14, 17],
            Self::Dominant13 => &[0, 4, 7, 10, 14, 21],
            Self::Dominant7Flat5 => &[0, 4, 6, 10],
            Self::Dominant7Flat9 => &[0, 4, 7, 10, 13],
            Self::Dominant7Sharp9 => &[0, 4, 7, 10, 15],
            Self::Dominant7Sharp11 => &[0, 4, 7, 10, 18],
            Self::Dominant7Flat13 => &[0, 4, 7, 10, 20],
            Self::HalfDiminished9 => &[0, 3, 6, 10, 14],
        }
    }

    /// Canonical symbol suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::Dominant7 => "7",
            Self::Diminished7 => "dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::MinorMajor7 => "mMaj7",
            Self::AugmentedMajor7 => "maj7#5",
            Self::Augmented7 => "aug7",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Dominant7Sus4 => "7sus4",
            Self::Power => "5",
            Self::Add9 => "add9",
            Self::MinorAdd9 => "madd9",
            Self::Major6 => "6",
            Self::Minor6 => "m6",
            Self::SixNine => "6/9",
            Self::Major9 => "maj9",
            Self::Major13 => "maj13",
            Self::Major7Sharp11 => "maj7#11",
            Self::Minor9 => "m9",
            Self::Minor11 => "m11",
            Self::Dominant9 => "9",
            Self::Dominant11 => "11",
            Self::Dominant13 => "13",
            Self::Dominant7Flat5 => "7b5",
            Self::Dominant7Flat9 => "7b9",
            Self::Dominant7Sharp9 => "7#9",
            Self::Dominant7Sharp11 => "7#11",
            Self::Dominant7Flat13 => "7b13",
            Self::HalfDiminished9 => "m9b5",
        }
    }

    /// Look up a symbol suffix, tolerating tension parentheses
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let cleaned = strip_tensions(suffix);
        SUFFIXES
            .iter()
            .find(|(s, _)| *s == cleaned)
            .map(|(_, q)| *q)
    }

    /// Find the quality with exactly these intervals
    pub fn from_intervals(intervals: &[u8]) -> Option<Self> {
        Self::ALL.iter().copied().find(|q| q.intervals() == intervals)
    }

    pub fn family(&self) -> ChordFamily {
        match self {
            Self::Major
            | Self::Major7
            | Self::Major6
            | Self::SixNine
            | Self::Major9
            | Self::Major13
            | Self::Major7Sharp11
            | Self::Add9 => ChordFamily::Major,
            Self::Minor
            | Self::Minor7
            | Self::Minor6
            | Self::Minor9
            | Self::Minor11
            | Self::MinorAdd9 => ChordFamily::Minor,
            Self::Dominant7
            | Self::Dominant9
            | Self::Dominant11
            | Self::Dominant13
            | Self::Dominant7Flat5
            | Self::Dominant7Flat9
            | Self::Dominant7Sharp9
            | Self::Dominant7Sharp11
            | Self::Dominant7Flat13 => ChordFamily::Dominant,
            Self::Diminished | Self::Diminished7 => ChordFamily::Diminished,
            Self::Augmented | Self::Augmented7 | Self::AugmentedMajor7 => ChordFamily::Augmented,
            Self::HalfDiminished7
            | Self::HalfDiminished9
            | Self::MinorMajor7
            | Self::Sus2
            | Self::Sus4
            | Self::Dominant7Sus4
            | Self::Power => ChordFamily::Other,
        }
    }

    /// The underlying triad, if the chord has both a third and a fifth
    pub fn triad(&self) -> Option<ChordQuality> {
        let has = |i: u8| self.intervals().contains(&i);
        match (has(3), has(4), has(6), has(7), has(8)) {
            (_, true, _, true, _) => Some(Self::Major),
            (true, _, _, true, _) => Some(Self::Minor),
            (true, _, true, _, _) => Some(Self::Diminished),
            (_, true, _, _, true) => Some(Self::Augmented),
            _ => None,
        }
    }
}

// ============================================================================
// Chord
// ============================================================================

/// A parsed chord symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    pub root: NoteName,
    pub quality: ChordQuality,
    /// Slash bass, if any
    pub bass: Option<NoteName>,
}

impl Chord {
    pub fn new(root: NoteName, quality: ChordQuality) -> Self {
        Self { root, quality, bass: None }
    }

    /// Parse a chord symbol such as "Dm7", "G7(b13)", "Bbmaj9", "C6/9", "F/A"
    pub fn parse(symbol: &str) -> Result<Self> {
        let (head, bass) = split_bass(symbol.trim());
        let Some((root, suffix)) = NoteName::parse_prefix(head) else {
            return Err(TheoryError::UnknownChord(symbol.to_string()));
        };
        let Some(quality) = ChordQuality::from_suffix(suffix) else {
            return Err(TheoryError::UnknownChord(symbol.to_string()));
        };
        let bass = match bass {
            Some(b) => Some(
                b.parse::<NoteName>()
                    .map_err(|_| TheoryError::UnknownChord(symbol.to_string()))?,
            ),
            None => None,
        };
        Ok(Self { root, quality, bass })
    }

    /// Canonical symbol
    pub fn symbol(&self) -> String {
        match self.bass {
            Some(bass) => format!("{}{}/{}", self.root, self.quality.suffix(), bass),
            None => format!("{}{}", self.root, self.quality.suffix()),
        }
    }

    /// Distinct pitch classes, root first, in interval order (slash bass excluded)
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let root = self.root.pitch_class();
        let mut pcs: Vec<PitchClass> = Vec::with_capacity(self.quality.intervals().len());
        for &interval in self.quality.intervals() {
            let pc = (root + interval % 12) % 12;
            if !pcs.contains(&pc) {
                pcs.push(pc);
            }
        }
        pcs
    }

    /// The chord reduced to its triad, if it has one
    pub fn triad(&self) -> Option<Chord> {
        self.quality.triad().map(|q| Chord::new(self.root, q))
    }

    /// Same root and quality compared by pitch class, ignoring spelling and bass
    pub fn same_sound(&self, other: &Chord) -> bool {
        self.root.pitch_class() == other.root.pitch_class() && self.quality == other.quality
    }

    /// MIDI notes stacked upward from the root in the given octave
    pub fn midi_notes(&self, octave: i8) -> Vec<u8> {
        let root = self.root.midi(octave);
        self.quality
            .intervals()
            .iter()
            .map(|&interval| (root as u16 + interval as u16).min(127) as u8)
            .collect()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

impl FromStr for Chord {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Remove tension parentheses, keeping their contents: "7(b13)" -> "7b13"
pub fn strip_tensions(symbol: &str) -> String {
    symbol.chars().filter(|c| *c != '(' && *c != ')').collect()
}

/// Split off a slash bass. "C6/9" keeps its slash; "F/A" splits.
pub fn split_bass(symbol: &str) -> (&str, Option<&str>) {
    if let Some(idx) = symbol.rfind('/') {
        let after = &symbol[idx + 1..];
        if after.chars().next().is_some_and(|c| matches!(c, 'A'..='G')) {
            return (&symbol[..idx], Some(after));
        }
    }
    (symbol, None)
}

/// Normalize a symbol for note rendering: strip tension parentheses,
/// `sus4` becomes `sus`, and a bare dominant `7` is played as its triad.
pub fn clean_symbol(symbol: &str) -> String {
    let (head, bass) = split_bass(symbol.trim());
    let mut cleaned = strip_tensions(head);
    if cleaned.ends_with("sus4") {
        cleaned.truncate(cleaned.len() - 1);
    }
    if let Some((root, suffix)) = NoteName::parse_prefix(&cleaned) {
        if suffix == "7" || suffix == "7sus" {
            cleaned = format!("{}{}", root, &suffix[1..]);
        }
    }
    match bass {
        Some(b) => format!("{cleaned}/{b}"),
        None => cleaned,
    }
}

// ============================================================================
// Voicing
// ============================================================================

/// Chord voicing strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Voicing {
    /// Notes sorted ascending
    Close,
    /// Even positions of the sorted set, then odd positions
    Spread,
    /// Second-lowest voice raised an octave
    #[default]
    DropTwo,
}

impl Voicing {
    pub fn apply(&self, notes: &[u8]) -> Vec<u8> {
        let mut sorted = notes.to_vec();
        sorted.sort_unstable();
        match self {
            Self::Close => sorted,
            Self::Spread => {
                let evens = sorted.iter().step_by(2);
                let odds = sorted.iter().skip(1).step_by(2);
                evens.chain(odds).copied().collect()
            }
            Self::DropTwo => {
                if sorted.len() < 4 {
                    return sorted;
                }
                let second = sorted.remove(1);
                sorted.push((second + 12).min(127));
                sorted
            }
        }
    }
}
