//! Note names, pitch classes and keys

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TheoryError};

/// Pitch class, 0 = C through 11 = B
pub type PitchClass = u8;

/// Natural note letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Pitch class of the unaltered letter
    pub fn natural_pc(self) -> PitchClass {
        match self {
            Self::C => 0,
            Self::D => 2,
            Self::E => 4,
            Self::F => 5,
            Self::G => 7,
            Self::A => 9,
            Self::B => 11,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::A => 'A',
            Self::B => 'B',
        }
    }

    /// Letter `steps` positions above this one, wrapping at B
    pub fn step(self, steps: usize) -> Self {
        Self::ALL[(self.index() + steps) % 7]
    }
}

/// A spelled note: letter plus accidental (positive = sharps, negative = flats)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: i8,
}

const SHARP_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::C, 1),
    (Letter::D, 0),
    (Letter::D, 1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::G, 1),
    (Letter::A, 0),
    (Letter::A, 1),
    (Letter::B, 0),
];

const FLAT_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::D, -1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::G, -1),
    (Letter::G, 0),
    (Letter::A, -1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

impl NoteName {
    pub const fn new(letter: Letter, accidental: i8) -> Self {
        Self { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, 0)
    }

    pub fn pitch_class(self) -> PitchClass {
        (self.letter.natural_pc() as i16 + self.accidental as i16).rem_euclid(12) as PitchClass
    }

    /// Spell `pc` on the given letter, using the accidental closest to natural
    pub fn spell(letter: Letter, pc: PitchClass) -> Self {
        let diff = (pc as i16 - letter.natural_pc() as i16).rem_euclid(12);
        let accidental = if diff > 6 { diff - 12 } else { diff };
        Self::new(letter, accidental as i8)
    }

    /// Spell a bare pitch class with sharps or flats
    pub fn from_pitch_class(pc: PitchClass, prefer_flats: bool) -> Self {
        let table = if prefer_flats { &FLAT_SPELLINGS } else { &SHARP_SPELLINGS };
        let (letter, accidental) = table[(pc % 12) as usize];
        Self::new(letter, accidental)
    }

    /// Transpose by `steps` letter names and `semitones` half steps.
    ///
    /// `NoteName::natural(Letter::C).transpose(2, 4)` is E, while
    /// `transpose(1, 3)` spells the same distance as D#.
    pub fn transpose(self, steps: usize, semitones: u8) -> Self {
        let letter = self.letter.step(steps);
        Self::spell(letter, (self.pitch_class() + semitones % 12) % 12)
    }

    /// Parse a note name at the start of `s`, returning the rest of the string.
    /// `None` when there is no letter or the accidentals overflow.
    pub fn parse_prefix(s: &str) -> Option<(Self, &str)> {
        let mut chars = s.char_indices();
        let (_, first) = chars.next()?;
        let letter = Letter::from_char(first)?;
        let mut accidental: i8 = 0;
        let mut rest_at = first.len_utf8();
        for (idx, c) in chars {
            match c {
                '#' => accidental = accidental.checked_add(1)?,
                'b' => accidental = accidental.checked_sub(1)?,
                _ => {
                    rest_at = idx;
                    break;
                }
            }
            rest_at = idx + c.len_utf8();
        }
        Some((Self::new(letter, accidental), &s[rest_at..]))
    }

    /// MIDI note number of this pitch class in the given octave (C4 = 60)
    pub fn midi(self, octave: i8) -> u8 {
        midi_note(self.pitch_class(), octave)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        let symbol = if self.accidental > 0 { '#' } else { 'b' };
        for _ in 0..self.accidental.unsigned_abs() {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl FromStr for NoteName {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        match Self::parse_prefix(s.trim()) {
            Some((note, "")) => Ok(note),
            _ => Err(TheoryError::UnknownNote(s.to_string())),
        }
    }
}

/// MIDI note number for a pitch class in an octave, clamped to 0-127
pub fn midi_note(pc: PitchClass, octave: i8) -> u8 {
    ((octave as i16 + 1) * 12 + pc as i16).clamp(0, 127) as u8
}

/// A nominal key: tonic plus major/minor flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    pub tonic: NoteName,
    pub minor: bool,
}

impl Key {
    pub fn major(tonic: NoteName) -> Self {
        Self { tonic, minor: false }
    }

    pub fn minor(tonic: NoteName) -> Self {
        Self { tonic, minor: true }
    }

    /// Parse "C", "F#", "Am", "Bbm", "A minor", "Eb major"
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let Some((tonic, rest)) = NoteName::parse_prefix(trimmed) else {
            return Err(TheoryError::UnknownKey(s.to_string()));
        };
        match rest.trim().to_ascii_lowercase().as_str() {
            "" | "major" | "maj" => Ok(Self::major(tonic)),
            "m" | "min" | "minor" => Ok(Self::minor(tonic)),
            _ => Err(TheoryError::UnknownKey(s.to_string())),
        }
    }

    /// Tonic of the relative major (the key itself when major)
    pub fn relative_major(self) -> NoteName {
        if self.minor {
            self.tonic.transpose(2, 3)
        } else {
            self.tonic
        }
    }

    /// Tonic of the relative minor (the key itself when minor)
    pub fn relative_minor(self) -> NoteName {
        if self.minor {
            self.tonic
        } else {
            self.tonic.transpose(5, 9)
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tonic, if self.minor { "m" } else { "" })
    }
}

impl FromStr for Key {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Key {
    type Error = TheoryError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_names() {
        assert_eq!("C".parse::<NoteName>().unwrap().pitch_class(), 0);
        assert_eq!("F#".parse::<NoteName>().unwrap().pitch_class(), 6);
        assert_eq!("Bb".parse::<NoteName>().unwrap().pitch_class(), 10);
        assert_eq!("Cb".parse::<NoteName>().unwrap().pitch_class(), 11);
        assert_eq!("Ebb".parse::<NoteName>().unwrap().pitch_class(), 2);
        assert!("H".parse::<NoteName>().is_err());
        assert!("C7".parse::<NoteName>().is_err());
    }

    #[test]
    fn test_parse_prefix_leaves_suffix() {
        let (note, rest) = NoteName::parse_prefix("Bbm7b5").unwrap();
        assert_eq!(note.to_string(), "Bb");
        assert_eq!(rest, "m7b5");
    }

    #[test]
    fn test_parse_prefix_rejects_overflowing_accidentals() {
        let sharps = format!("C{}", "#".repeat(130));
        assert!(NoteName::parse_prefix(&sharps).is_none());
        let flats = format!("D{}maj7", "b".repeat(129));
        assert!(NoteName::parse_prefix(&flats).is_none());
        let (note, _) = NoteName::parse_prefix(&format!("E{}", "#".repeat(127))).unwrap();
        assert_eq!(note.accidental, 127);
    }

    #[test]
    fn test_transpose_keeps_letter_spelling() {
        let d = NoteName::natural(Letter::D);
        // Major third above D is F#, not Gb
        assert_eq!(d.transpose(2, 4).to_string(), "F#");
        let f = NoteName::natural(Letter::F);
        // Perfect fourth above F is Bb
        assert_eq!(f.transpose(3, 5).to_string(), "Bb");
    }

    #[test]
    fn test_midi_numbers() {
        assert_eq!(NoteName::natural(Letter::C).midi(4), 60);
        assert_eq!(NoteName::natural(Letter::C).midi(1), 24);
        assert_eq!(NoteName::natural(Letter::A).midi(4), 69);
    }

    #[test]
    fn test_key_relatives() {
        let c = Key::parse("C").unwrap();
        assert!(!c.minor);
        assert_eq!(c.relative_minor().to_string(), "A");

        let fsm = Key::parse("F#m").unwrap();
        assert!(fsm.minor);
        assert_eq!(fsm.relative_major().to_string(), "A");

        let eb = Key::parse("Eb").unwrap();
        assert_eq!(eb.relative_minor().to_string(), "C");
    }

    #[test]
    fn test_key_round_trips_through_string() {
        let key: Key = serde_json::from_str("\"Bbm\"").unwrap();
        assert_eq!(key, Key::minor(NoteName::new(Letter::B, -1)));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Bbm\"");
    }
}
