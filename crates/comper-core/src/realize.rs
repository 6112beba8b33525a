//! Rendering chords, scales and onsets as timed notes

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::chord::{Chord, Voicing, clean_symbol, split_bass};
use crate::drums::DrumPattern;
use crate::part::{BEAT_EPSILON, ChordPart, NoteEvent, ScaledChordChange};
use crate::pitch::{Letter, NoteName, midi_note};
use crate::scale::Scale;

/// Octave chord tones are stacked from
const CHORD_OCTAVE: i8 = 3;
/// Octave the arpeggio starts in
const ARPEGGIO_OCTAVE: i8 = 4;
/// Arpeggio step length in beats
const ARPEGGIO_STEP: f64 = 0.25;
/// Drum step length in beats
const STEP_BEATS: f64 = 0.25;

/// How harmony is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizeOptions {
    pub voicing: Voicing,
    /// Layer a scale arpeggio over each chord
    pub arpeggio: bool,
    pub chord_velocity: u8,
}

impl Default for RealizeOptions {
    fn default() -> Self {
        Self {
            voicing: Voicing::DropTwo,
            arpeggio: true,
            chord_velocity: 100,
        }
    }
}

/// Voiced MIDI notes for a chord symbol, plus the root an octave below as
/// the bass voice. A slash bass does not replace that root.
///
/// Unreadable symbols fall back to their root letter alone.
pub fn chord_tones(symbol: &str, voicing: Voicing) -> Vec<u8> {
    let cleaned = clean_symbol(symbol);
    let (head, _) = split_bass(&cleaned);

    let (root, mut notes) = match Chord::parse(head) {
        Ok(chord) => (chord.root, chord.midi_notes(CHORD_OCTAVE)),
        Err(err) => {
            let root = symbol
                .trim()
                .chars()
                .next()
                .and_then(Letter::from_char)
                .map_or(NoteName::natural(Letter::C), NoteName::natural);
            tracing::warn!("{}; using root note {} only", err, root);
            (root, vec![root.midi(CHORD_OCTAVE)])
        }
    };

    notes.push(root.midi(CHORD_OCTAVE - 1));

    voicing.apply(&notes)
}

/// One ascending pass through `scale` from its tonic, a step at a time,
/// stopping before a step would reach `start + duration`
pub fn arpeggio(scale: &Scale, start: f64, duration: f64, velocity: u8) -> Vec<NoteEvent> {
    let tonic_pc = scale.tonic.pitch_class();
    let base = midi_note(tonic_pc, ARPEGGIO_OCTAVE);
    let end = start + duration;
    scale
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| (start + i as f64 * ARPEGGIO_STEP, note))
        .take_while(|(at, _)| *at < end - BEAT_EPSILON)
        .map(|(at, note)| {
            let above = (note.pitch_class() + 12 - tonic_pc) % 12;
            NoteEvent::new((base + above).min(127), at, ARPEGGIO_STEP, velocity)
        })
        .collect()
}

/// Chord and arpeggio notes for every scaled change
pub fn harmony_notes(changes: &[ScaledChordChange], options: &RealizeOptions) -> Vec<NoteEvent> {
    let arpeggio_velocity = options.chord_velocity.saturating_sub(20).max(1);
    let mut notes = Vec::new();
    for scaled in changes {
        let change = &scaled.change;
        for pitch in chord_tones(&change.chord, options.voicing) {
            notes.push(NoteEvent::new(
                pitch,
                change.start,
                change.duration,
                options.chord_velocity,
            ));
        }
        if options.arpeggio {
            notes.extend(arpeggio(
                &scaled.scale,
                change.start,
                change.duration,
                arpeggio_velocity,
            ));
        }
    }
    notes
}

/// Drum onsets as notes of roughly a 16th each
pub fn drum_notes(pattern: &DrumPattern, rng: &mut Rng) -> Vec<NoteEvent> {
    let mut notes = Vec::with_capacity(pattern.onset_count());
    for (instrument, steps) in &pattern.onsets {
        let rule = instrument.rule();
        for &step in steps {
            let velocity = rule.velocity(step, rng);
            let duration = STEP_BEATS * (0.95 + rng.f64() * 0.1);
            notes.push(NoteEvent::new(
                instrument.note(),
                step as f64 * STEP_BEATS,
                duration,
                velocity,
            ));
        }
    }
    notes
}

/// Clip name for a generated part: title plus the chord sequence
pub fn progression_clip_name(part: &ChordPart) -> String {
    let chords: Vec<&str> = part.symbols().collect();
    format!("{} ({})", part.title, chords.join(" → "))
}

/// Clip name for an imported part: `|chord` per change, with leading offset
/// and rest lengths written as beat counts
pub fn chord_list_clip_name(part: &ChordPart) -> String {
    let mut name = String::new();
    if let Some(first) = part.changes.first() {
        if first.start > 0.0 {
            name.push_str(&first.start.to_string());
        }
    }
    for (i, change) in part.changes.iter().enumerate() {
        name.push('|');
        name.push_str(&change.chord);
        let next_start = part
            .changes
            .get(i + 1)
            .map_or(part.length, |next| next.start);
        let rest = next_start - change.end();
        if rest > BEAT_EPSILON {
            name.push_str(&rest.to_string());
        }
    }
    name
}
