//! Style-driven bassline generation

use fastrand::Rng;

use crate::drums::{BAR_STEPS, DrumPattern};
use crate::part::{ChordChange, NoteEvent};
use crate::pitch::{Letter, NoteName};
use crate::weighted::{chance, pick};

/// Octave the bass root is placed in (C1 = 24)
const BASS_OCTAVE: i8 = 1;

/// One note of a template, relative to the chord root and chord start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BassNote {
    /// Semitones above the root
    pub offset: u8,
    /// Beats after the anchor
    pub time: f64,
    pub duration: f64,
    pub velocity: u8,
}

const fn note(offset: u8, time: f64, duration: f64, velocity: u8) -> BassNote {
    BassNote {
        offset,
        time,
        duration,
        velocity,
    }
}

/// A named bass figure
#[derive(Debug, Clone, PartialEq)]
pub struct BassTemplate {
    pub name: &'static str,
    pub notes: &'static [BassNote],
}

pub static BASIC_PATTERNS: [BassTemplate; 4] = [
    BassTemplate {
        name: "Root-Fifth",
        notes: &[note(0, 0.0, 1.0, 100), note(7, 2.0, 1.0, 90)],
    },
    BassTemplate {
        name: "Walking",
        notes: &[
            note(0, 0.0, 0.5, 100),
            note(4, 1.0, 0.5, 85),
            note(7, 2.0, 0.5, 90),
            note(10, 3.0, 0.5, 85),
        ],
    },
    BassTemplate {
        name: "Octave",
        notes: &[note(0, 0.0, 1.0, 100), note(12, 2.0, 1.0, 90)],
    },
    BassTemplate {
        name: "Arpeggio",
        notes: &[
            note(0, 0.0, 0.5, 100),
            note(4, 0.5, 0.5, 85),
            note(7, 1.0, 0.5, 90),
            note(12, 1.5, 0.5, 95),
            note(7, 2.0, 0.5, 85),
            note(4, 2.5, 0.5, 80),
            note(0, 3.0, 1.0, 90),
        ],
    },
];

pub static FILLS: [BassTemplate; 4] = [
    BassTemplate {
        name: "Chromatic Run Up",
        notes: &[
            note(0, 0.0, 0.25, 90),
            note(1, 0.25, 0.25, 95),
            note(2, 0.5, 0.25, 100),
            note(3, 0.75, 0.25, 105),
        ],
    },
    BassTemplate {
        name: "Scale Run Down",
        notes: &[
            note(12, 0.0, 0.25, 105),
            note(10, 0.25, 0.25, 100),
            note(7, 0.5, 0.25, 95),
            note(0, 0.75, 0.25, 90),
        ],
    },
    BassTemplate {
        name: "Triplet Fill",
        notes: &[
            note(0, 0.0, 0.33, 95),
            note(4, 0.33, 0.33, 90),
            note(7, 0.66, 0.34, 85),
        ],
    },
    BassTemplate {
        name: "Octave Jump Fill",
        notes: &[
            note(0, 0.0, 0.25, 100),
            note(12, 0.25, 0.25, 95),
            note(24, 0.5, 0.25, 90),
            note(12, 0.75, 0.25, 85),
        ],
    },
];

pub static ACCENTS: [BassTemplate; 3] = [
    BassTemplate {
        name: "Octave Jump",
        notes: &[note(0, 0.0, 0.25, 110), note(12, 0.25, 0.25, 100)],
    },
    BassTemplate {
        name: "Double Note",
        notes: &[note(0, 0.0, 0.125, 110), note(0, 0.125, 0.125, 90)],
    },
    BassTemplate {
        name: "Fifth Accent",
        notes: &[note(0, 0.0, 0.25, 110), note(7, 0.25, 0.25, 95)],
    },
];

fn find_template<'a>(
    table: &'a [BassTemplate],
    allowed: &[&str],
) -> Vec<&'a BassTemplate> {
    table.iter().filter(|t| allowed.contains(&t.name)).collect()
}

/// How a bass part behaves
#[derive(Debug, Clone, PartialEq)]
pub struct BassStyle {
    pub name: &'static str,
    pub main_probability: f64,
    pub fill_probability: f64,
    pub accent_probability: f64,
    pub sync_with_drums: bool,
    /// Inclusive velocity clamp
    pub velocity_range: (u8, u8),
    pub patterns: &'static [&'static str],
    pub fills: &'static [&'static str],
}

impl BassStyle {
    fn clamp_velocity(&self, velocity: u8) -> u8 {
        let (min, max) = self.velocity_range;
        velocity.max(min).min(max)
    }
}

pub static BASS_STYLES: [BassStyle; 3] = [
    BassStyle {
        name: "Simple",
        main_probability: 0.9,
        fill_probability: 0.2,
        accent_probability: 0.1,
        sync_with_drums: true,
        velocity_range: (85, 110),
        patterns: &["Root-Fifth", "Octave"],
        fills: &["Chromatic Run Up", "Scale Run Down"],
    },
    BassStyle {
        name: "Busy",
        main_probability: 0.8,
        fill_probability: 0.4,
        accent_probability: 0.3,
        sync_with_drums: true,
        velocity_range: (80, 115),
        patterns: &["Walking", "Arpeggio"],
        fills: &["Triplet Fill", "Octave Jump Fill"],
    },
    BassStyle {
        name: "Groovy",
        main_probability: 0.85,
        fill_probability: 0.3,
        accent_probability: 0.4,
        sync_with_drums: true,
        velocity_range: (90, 120),
        patterns: &["Walking", "Root-Fifth"],
        fills: &["Chromatic Run Up", "Triplet Fill"],
    },
];

pub fn bass_style(name: &str) -> Option<&'static BassStyle> {
    BASS_STYLES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// A generated bassline and the style that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Bassline {
    pub style: &'static BassStyle,
    /// Absolute-time notes in chord order
    pub notes: Vec<NoteEvent>,
}

/// Pick a style uniformly and generate a bassline over `changes`
pub fn generate(changes: &[ChordChange], drums: Option<&DrumPattern>, rng: &mut Rng) -> Bassline {
    let style = &BASS_STYLES[rng.usize(..BASS_STYLES.len())];
    tracing::info!("Selected bass style: {}", style.name);
    Bassline {
        style,
        notes: generate_with_style(style, changes, drums, rng),
    }
}

/// Root of a chord symbol in the bass octave; falls back to C
fn bass_root(symbol: &str) -> u8 {
    match NoteName::parse_prefix(symbol.trim()) {
        Some((root, _)) => root.midi(BASS_OCTAVE),
        None => {
            tracing::warn!("No root in chord {:?}; bass falls back to C", symbol);
            NoteName::natural(Letter::C).midi(BASS_OCTAVE)
        }
    }
}

pub fn generate_with_style(
    style: &BassStyle,
    changes: &[ChordChange],
    drums: Option<&DrumPattern>,
    rng: &mut Rng,
) -> Vec<NoteEvent> {
    let patterns = find_template(&BASIC_PATTERNS, style.patterns);
    let fills = find_template(&FILLS, style.fills);
    let kicks: &[u32] = match drums {
        Some(pattern) if style.sync_with_drums => pattern.kicks(),
        _ => &[],
    };

    let mut events = Vec::new();
    for (index, change) in changes.iter().enumerate() {
        let root = bass_root(&change.chord);
        // (note, anchor) pairs, relative to the chord start
        let mut figure: Vec<(BassNote, f64)> = Vec::new();

        if chance(rng, style.main_probability) {
            if let Some(template) = pick(rng, &patterns) {
                figure.extend(template.notes.iter().map(|n| (*n, 0.0)));
            }
        }

        if (index + 1) % 4 == 0 && chance(rng, style.fill_probability) {
            if let Some(template) = pick(rng, &fills) {
                let anchor = (change.duration - 1.0).max(0.0);
                figure.extend(template.notes.iter().map(|n| (*n, anchor)));
            }
        }

        for &kick in kicks {
            let position = kick % BAR_STEPS;
            if position % 4 == 0 && chance(rng, style.accent_probability) {
                if let Some(template) = pick(rng, &ACCENTS) {
                    let anchor = position as f64 * 0.25;
                    figure.extend(template.notes.iter().map(|n| (*n, anchor)));
                }
            }
        }

        events.extend(
            figure
                .into_iter()
                .map(|(n, anchor)| (n, anchor + n.time))
                .filter(|(_, time)| *time < change.duration)
                .map(|(n, time)| {
                    NoteEvent::new(
                        (root as u16 + n.offset as u16).min(127) as u8,
                        change.start + time,
                        n.duration,
                        style.clamp_velocity(n.velocity),
                    )
                }),
        );
    }
    events
}
