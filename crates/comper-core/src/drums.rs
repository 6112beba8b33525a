//! Rule-driven drum pattern generation
//!
//! Positions are 16th-note steps. Rules are written against a 16-step bar and
//! are laid onto each rhythm segment at the running step cursor.

use std::collections::BTreeMap;
use std::fmt;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::rhythm;
use crate::weighted::{chance, pick};

/// Steps per bar
pub const BAR_STEPS: u32 = 16;

/// Style probability for an active instrument the style does not weight
const DEFAULT_STYLE_PROBABILITY: f64 = 0.5;

// ============================================================================
// Instruments
// ============================================================================

/// General MIDI percussion voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrumInstrument {
    Kick,
    KickSub,
    Snare,
    SnareSub,
    RimShot,
    Clap,
    ClosedHiHat,
    OpenHiHat,
    PedalHiHat,
    Ride,
    RideBell,
    Crash,
    Splash,
    Cowbell,
    Tambourine,
    Shaker,
    Conga,
    Bongo,
    Timbale,
    Agogo,
    WoodBlock,
}

impl DrumInstrument {
    pub const ALL: [DrumInstrument; 21] = [
        Self::Kick,
        Self::KickSub,
        Self::Snare,
        Self::SnareSub,
        Self::RimShot,
        Self::Clap,
        Self::ClosedHiHat,
        Self::OpenHiHat,
        Self::PedalHiHat,
        Self::Ride,
        Self::RideBell,
        Self::Crash,
        Self::Splash,
        Self::Cowbell,
        Self::Tambourine,
        Self::Shaker,
        Self::Conga,
        Self::Bongo,
        Self::Timbale,
        Self::Agogo,
        Self::WoodBlock,
    ];

    /// Color instruments added on 8-segment boundaries
    pub const COLORS: [DrumInstrument; 3] = [Self::Crash, Self::Splash, Self::RideBell];

    /// GM drum map note number
    pub fn note(&self) -> u8 {
        match self {
            Self::Kick => 36,
            Self::KickSub => 35,
            Self::Snare => 38,
            Self::SnareSub => 40,
            Self::RimShot => 37,
            Self::Clap => 39,
            Self::ClosedHiHat => 42,
            Self::OpenHiHat => 46,
            Self::PedalHiHat => 44,
            Self::Ride => 51,
            Self::RideBell => 53,
            Self::Crash => 49,
            Self::Splash => 55,
            Self::Cowbell => 56,
            Self::Tambourine => 54,
            Self::Shaker => 70,
            Self::Conga => 63,
            Self::Bongo => 60,
            Self::Timbale => 65,
            Self::Agogo => 67,
            Self::WoodBlock => 76,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kick => "Kick",
            Self::KickSub => "Kick Sub",
            Self::Snare => "Snare",
            Self::SnareSub => "Snare Sub",
            Self::RimShot => "Rim Shot",
            Self::Clap => "Clap",
            Self::ClosedHiHat => "Closed Hi-Hat",
            Self::OpenHiHat => "Open Hi-Hat",
            Self::PedalHiHat => "Pedal Hi-Hat",
            Self::Ride => "Ride",
            Self::RideBell => "Ride Bell",
            Self::Crash => "Crash",
            Self::Splash => "Splash",
            Self::Cowbell => "Cowbell",
            Self::Tambourine => "Tambourine",
            Self::Shaker => "Shaker",
            Self::Conga => "Conga",
            Self::Bongo => "Bongo",
            Self::Timbale => "Timbale",
            Self::Agogo => "Agogo",
            Self::WoodBlock => "Wood Block",
        }
    }

    pub fn rule(&self) -> &'static DrumRule {
        match self {
            Self::Kick => &KICK,
            Self::KickSub => &KICK_SUB,
            Self::Snare => &SNARE,
            Self::SnareSub => &SNARE_SUB,
            Self::RimShot => &RIM_SHOT,
            Self::Clap => &CLAP,
            Self::ClosedHiHat => &CLOSED_HIHAT,
            Self::OpenHiHat => &OPEN_HIHAT,
            Self::PedalHiHat => &PEDAL_HIHAT,
            Self::Ride => &RIDE,
            Self::RideBell => &RIDE_BELL,
            Self::Crash => &CRASH,
            Self::Splash => &SPLASH,
            Self::Cowbell => &COWBELL,
            Self::Tambourine => &TAMBOURINE,
            Self::Shaker => &SHAKER,
            Self::Conga => &CONGA,
            Self::Bongo => &BONGO,
            Self::Timbale => &TIMBALE,
            Self::Agogo => &AGOGO,
            Self::WoodBlock => &WOOD_BLOCK,
        }
    }
}

impl fmt::Display for DrumInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Where an instrument may play within a 16-step bar
#[derive(Debug, Clone, PartialEq)]
pub struct DrumRule {
    pub main: &'static [u32],
    pub fill: &'static [u32],
    pub accent: &'static [u32],
    pub ghost: &'static [u32],
    pub probability: f64,
    /// Inclusive velocity range
    pub velocity: (u8, u8),
}

impl DrumRule {
    /// Velocity for an onset at `step`: uniform in range, lifted on accent
    /// positions and softened on ghost positions
    pub fn velocity(&self, step: u32, rng: &mut Rng) -> u8 {
        let (min, max) = self.velocity;
        let base = rng.u8(min.min(max)..=max.max(min)) as f64;
        let position = step % BAR_STEPS;
        let scaled = if self.accent.contains(&position) {
            (base * 1.2).min(127.0)
        } else if self.ghost.contains(&position) {
            (base * 0.7).max(1.0)
        } else {
            base
        };
        scaled as u8
    }
}

const fn rule(
    main: &'static [u32],
    fill: &'static [u32],
    accent: &'static [u32],
    ghost: &'static [u32],
    probability: f64,
    velocity: (u8, u8),
) -> DrumRule {
    DrumRule {
        main,
        fill,
        accent,
        ghost,
        probability,
        velocity,
    }
}

static KICK: DrumRule = rule(&[0, 8], &[6, 10, 14], &[0], &[], 0.9, (90, 127));
static KICK_SUB: DrumRule = rule(&[4, 12], &[2, 7, 11], &[4], &[], 0.4, (80, 110));
static SNARE: DrumRule = rule(
    &[4, 12],
    &[2, 6, 10, 14],
    &[4, 12],
    &[3, 7, 11, 15],
    0.85,
    (85, 120),
);
static SNARE_SUB: DrumRule = rule(&[], &[2, 6, 10, 14], &[], &[], 0.3, (70, 90));
static RIM_SHOT: DrumRule = rule(&[], &[3, 7, 11, 15], &[], &[], 0.2, (60, 90));
static CLAP: DrumRule = rule(&[4, 12], &[], &[4, 12], &[], 0.4, (90, 120));
static CLOSED_HIHAT: DrumRule = rule(
    &[0, 2, 4, 6, 8, 10, 12, 14],
    &[1, 3, 5, 7, 9, 11, 13, 15],
    &[0, 4, 8, 12],
    &[],
    0.95,
    (70, 110),
);
static OPEN_HIHAT: DrumRule = rule(&[], &[7, 15], &[], &[], 0.4, (80, 110));
static PEDAL_HIHAT: DrumRule = rule(&[2, 6, 10, 14], &[], &[], &[], 0.3, (60, 90));
static RIDE: DrumRule = rule(
    &[0, 2, 4, 6, 8, 10, 12, 14],
    &[1, 3, 5, 7, 9, 11, 13, 15],
    &[0, 8],
    &[],
    0.7,
    (70, 100),
);
static RIDE_BELL: DrumRule = rule(&[0, 8], &[], &[0], &[], 0.3, (80, 110));
static CRASH: DrumRule = rule(&[0], &[8], &[0], &[], 0.4, (90, 127));
static SPLASH: DrumRule = rule(&[], &[7, 15], &[], &[], 0.2, (70, 100));
static COWBELL: DrumRule = rule(&[4, 12], &[], &[], &[], 0.15, (60, 90));
static TAMBOURINE: DrumRule = rule(&[0, 4, 8, 12], &[2, 6, 10, 14], &[0, 8], &[], 0.4, (50, 80));
static SHAKER: DrumRule = rule(&[2, 6, 10, 14], &[0, 4, 8, 12], &[], &[], 0.5, (40, 70));
static CONGA: DrumRule = rule(&[0, 4, 8, 12], &[2, 6, 10, 14], &[0, 8], &[], 0.3, (60, 90));
static BONGO: DrumRule = rule(&[], &[1, 3, 5, 7], &[], &[], 0.2, (50, 80));
static TIMBALE: DrumRule = rule(&[], &[12, 13, 14, 15], &[15], &[], 0.15, (70, 100));
static AGOGO: DrumRule = rule(&[0, 8], &[4, 12], &[0], &[], 0.2, (60, 90));
static WOOD_BLOCK: DrumRule = rule(&[], &[3, 7, 11, 15], &[], &[], 0.15, (50, 80));

// ============================================================================
// Styles
// ============================================================================

/// Active instruments with their per-style trigger probability
#[derive(Debug, Clone, PartialEq)]
pub struct DrumStyle {
    pub name: &'static str,
    pub instruments: &'static [(DrumInstrument, f64)],
}

impl DrumStyle {
    pub fn is_active(&self, instrument: DrumInstrument) -> bool {
        self.instruments.iter().any(|(i, _)| *i == instrument)
    }

    pub fn probability(&self, instrument: DrumInstrument) -> f64 {
        self.instruments
            .iter()
            .find(|(i, _)| *i == instrument)
            .map_or(DEFAULT_STYLE_PROBABILITY, |(_, p)| *p)
    }
}

pub static DRUM_STYLES: [DrumStyle; 5] = [
    DrumStyle {
        name: "Basic Rock",
        instruments: &[
            (DrumInstrument::Kick, 0.9),
            (DrumInstrument::Snare, 0.85),
            (DrumInstrument::ClosedHiHat, 0.95),
            (DrumInstrument::Crash, 0.4),
        ],
    },
    DrumStyle {
        name: "Funk",
        instruments: &[
            (DrumInstrument::Kick, 0.8),
            (DrumInstrument::Snare, 0.9),
            (DrumInstrument::ClosedHiHat, 0.9),
            (DrumInstrument::OpenHiHat, 0.4),
            (DrumInstrument::RimShot, 0.3),
            (DrumInstrument::Cowbell, 0.2),
            (DrumInstrument::Tambourine, 0.4),
        ],
    },
    DrumStyle {
        name: "Jazz",
        instruments: &[
            (DrumInstrument::Kick, 0.7),
            (DrumInstrument::Snare, 0.8),
            (DrumInstrument::Ride, 0.95),
            (DrumInstrument::RideBell, 0.3),
            (DrumInstrument::Crash, 0.2),
        ],
    },
    DrumStyle {
        name: "Latin",
        instruments: &[
            (DrumInstrument::Kick, 0.7),
            (DrumInstrument::Snare, 0.6),
            (DrumInstrument::Conga, 0.8),
            (DrumInstrument::Bongo, 0.4),
            (DrumInstrument::Timbale, 0.3),
            (DrumInstrument::Cowbell, 0.5),
            (DrumInstrument::Shaker, 0.9),
        ],
    },
    DrumStyle {
        name: "Electronic",
        instruments: &[
            (DrumInstrument::Kick, 0.95),
            (DrumInstrument::Snare, 0.8),
            (DrumInstrument::ClosedHiHat, 0.9),
            (DrumInstrument::OpenHiHat, 0.3),
            (DrumInstrument::Clap, 0.4),
            (DrumInstrument::RimShot, 0.2),
        ],
    },
];

pub fn drum_style(name: &str) -> Option<&'static DrumStyle> {
    DRUM_STYLES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

// ============================================================================
// Patterns
// ============================================================================

/// Absolute onset steps per instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumPattern {
    pub style: String,
    /// Total length in steps
    pub steps: u32,
    /// Sorted, de-duplicated onsets; instruments that never play are absent
    pub onsets: BTreeMap<DrumInstrument, Vec<u32>>,
}

impl DrumPattern {
    pub fn onsets(&self, instrument: DrumInstrument) -> &[u32] {
        self.onsets.get(&instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn kicks(&self) -> &[u32] {
        self.onsets(DrumInstrument::Kick)
    }

    pub fn onset_count(&self) -> usize {
        self.onsets.values().map(Vec::len).sum()
    }
}

/// Pick a style uniformly and generate a pattern over `rhythm` tiled to `target` beats
pub fn generate(rhythm: &[f64], target: f64, rng: &mut Rng) -> DrumPattern {
    let style = &DRUM_STYLES[rng.usize(..DRUM_STYLES.len())];
    tracing::info!("Selected drum style: {}", style.name);
    generate_with_style(style, rhythm, target, rng)
}

pub fn generate_with_style(
    style: &DrumStyle,
    rhythm: &[f64],
    target: f64,
    rng: &mut Rng,
) -> DrumPattern {
    let segments = rhythm::tile(rhythm, target).unwrap_or_else(|err| {
        tracing::warn!("{}; generating an empty drum pattern", err);
        Vec::new()
    });
    let total_steps = (target.max(0.0) * 4.0).floor() as u32;
    let mut onsets: BTreeMap<DrumInstrument, Vec<u32>> = BTreeMap::new();
    let mut cursor: u32 = 0;

    for (i, duration) in segments.iter().enumerate() {
        let closes_eight = i % 8 == 7;
        let closes_four = i % 4 == 3;
        let fill_scale = if closes_eight {
            Some(0.7)
        } else if closes_four {
            Some(0.4)
        } else {
            None
        };

        for &(instrument, style_probability) in style.instruments {
            let rule = instrument.rule();
            let combined = rule.probability * style_probability;
            let hits = onsets.entry(instrument).or_default();

            for &beat in rule.main {
                if chance(rng, combined) {
                    hits.push(cursor + beat);
                }
            }
            if let Some(scale) = fill_scale {
                for &beat in rule.fill {
                    if chance(rng, combined * scale) {
                        hits.push(cursor + beat);
                    }
                }
            }
            for &beat in rule.ghost {
                if chance(rng, combined * 0.3) {
                    hits.push(cursor + beat);
                }
            }
        }

        if closes_eight {
            let colors: Vec<DrumInstrument> = DrumInstrument::COLORS
                .into_iter()
                .filter(|c| !style.is_active(*c))
                .collect();
            if let Some(color) = pick(rng, &colors) {
                onsets.entry(*color).or_default().push(cursor);
            }
        }

        cursor += (duration * 4.0).floor() as u32;
    }

    for hits in onsets.values_mut() {
        hits.retain(|&step| step < total_steps);
        hits.sort_unstable();
        hits.dedup();
    }
    onsets.retain(|_, hits| !hits.is_empty());

    DrumPattern {
        style: style.name.to_string(),
        steps: total_steps,
        onsets,
    }
}
