//! Chord parts and the note streams realized from them

use serde::{Deserialize, Serialize};

use crate::pitch::Key;
use crate::scale::Scale;

/// Tolerance for beat arithmetic on durations like 0.75
pub const BEAT_EPSILON: f64 = 1e-9;

/// One chord symbol held for a span of quarter-note beats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordChange {
    /// Chord symbol as written, e.g. "G7(b13)"
    pub chord: String,
    /// Start position in beats
    pub start: f64,
    /// Length in beats
    pub duration: f64,
}

impl ChordChange {
    pub fn new(chord: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            chord: chord.into(),
            start,
            duration,
        }
    }

    /// End position in beats (start + duration)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A titled, keyed sequence of chord changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordPart {
    pub title: String,
    pub key: Key,
    /// Changes sorted by start, non-overlapping
    pub changes: Vec<ChordChange>,
    /// Total length in beats
    pub length: f64,
}

impl ChordPart {
    pub fn new(title: impl Into<String>, key: Key, length: f64) -> Self {
        Self {
            title: title.into(),
            key,
            changes: Vec::new(),
            length,
        }
    }

    /// Append a change after the current last one.
    /// Returns false (and leaves the part unchanged) if it would overlap or overflow.
    pub fn push(&mut self, change: ChordChange) -> bool {
        let cursor = self.changes.last().map_or(0.0, ChordChange::end);
        if change.start + BEAT_EPSILON < cursor
            || change.duration <= 0.0
            || change.end() > self.length + BEAT_EPSILON
        {
            return false;
        }
        self.changes.push(change);
        true
    }

    /// Ordered, non-overlapping and within the part length
    pub fn is_well_formed(&self) -> bool {
        let mut cursor = 0.0;
        for change in &self.changes {
            if change.start + BEAT_EPSILON < cursor || change.duration <= 0.0 {
                return false;
            }
            cursor = change.end();
        }
        cursor <= self.length + BEAT_EPSILON
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.chord.as_str())
    }
}

/// A chord change with its assigned improvisation scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledChordChange {
    pub change: ChordChange,
    pub scale: Scale,
}

/// A single timed note, in beats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127, 60 = middle C)
    pub pitch: u8,
    /// Absolute start in beats
    pub start: f64,
    /// Length in beats
    pub duration: f64,
    /// Velocity (1-127)
    pub velocity: u8,
}

impl NoteEvent {
    pub fn new(pitch: u8, start: f64, duration: f64, velocity: u8) -> Self {
        Self {
            pitch,
            start,
            duration,
            velocity,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A named note stream ready for hand-off to a clip sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipStream {
    pub name: String,
    /// Clip length in beats
    pub length: f64,
    /// Notes sorted by start
    pub notes: Vec<NoteEvent>,
}

impl ClipStream {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            notes: Vec::new(),
        }
    }

    /// Add a note, keeping notes sorted by start (stable for equal starts)
    pub fn add_note(&mut self, note: NoteEvent) {
        let idx = self
            .notes
            .iter()
            .position(|n| n.start > note.start)
            .unwrap_or(self.notes.len());
        self.notes.insert(idx, note);
    }

    pub fn extend(&mut self, notes: impl IntoIterator<Item = NoteEvent>) {
        for note in notes {
            self.add_note(note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Letter, NoteName};

    fn c_major() -> Key {
        Key::major(NoteName::natural(Letter::C))
    }

    #[test]
    fn test_push_rejects_overflow_and_overlap() {
        let mut part = ChordPart::new("test", c_major(), 4.0);
        assert!(part.push(ChordChange::new("C", 0.0, 2.0)));
        assert!(!part.push(ChordChange::new("F", 1.0, 1.0)));
        assert!(!part.push(ChordChange::new("G", 2.0, 3.0)));
        assert!(part.push(ChordChange::new("G", 2.0, 2.0)));
        assert_eq!(part.changes.len(), 2);
        assert!(part.is_well_formed());
    }

    #[test]
    fn test_gaps_are_well_formed() {
        let mut part = ChordPart::new("gappy", c_major(), 8.0);
        part.changes.push(ChordChange::new("C", 1.0, 2.0));
        part.changes.push(ChordChange::new("F", 5.0, 3.0));
        assert!(part.is_well_formed());
        part.length = 7.0;
        assert!(!part.is_well_formed());
    }

    #[test]
    fn test_clip_stream_keeps_notes_sorted() {
        let mut clip = ClipStream::new("clip", 4.0);
        clip.add_note(NoteEvent::new(60, 2.0, 1.0, 100));
        clip.add_note(NoteEvent::new(62, 0.0, 1.0, 100));
        clip.add_note(NoteEvent::new(64, 2.0, 1.0, 100));
        let pitches: Vec<u8> = clip.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![62, 60, 64]);
    }
}
