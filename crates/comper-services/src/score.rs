//! Score ingestion: chord parts from typed lead-sheet records
//!
//! The records mirror the harmony, measure and attribute elements of a
//! MusicXML score (see `musicxml` for the reader). Durations are in divisions
//! per quarter note; chord symbols are assembled from root, kind, degree and bass.

use comper_core::{ChordChange, ChordPart, Key, Letter, NoteName};
use thiserror::Error;

/// Divisions per quarter note when the score does not say
pub const DEFAULT_DIVISIONS: u32 = 768;

/// Beats assumed for a harmony or measure without notes
const DEFAULT_BEATS: f64 = 4.0;

const SHARP_KEYS: [&str; 8] = ["C", "G", "D", "A", "E", "B", "F#", "C#"];
const FLAT_KEYS: [&str; 8] = ["C", "F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Unknown pitch step: {0}")]
    UnknownStep(String),

    #[error("Unknown harmony kind: {0}")]
    UnknownKind(String),

    #[error("Invalid divisions: {0}")]
    InvalidDivisions(u32),

    #[error("Invalid MusicXML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed score: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorePitch {
    pub step: String,
    pub alter: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreKind {
    pub value: String,
    /// Printed symbol text, used verbatim when present
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeType {
    Add,
    Alter,
    Subtract,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDegree {
    pub value: u8,
    pub alter: i8,
    pub degree_type: DegreeType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreHarmony {
    pub root: ScorePitch,
    pub kind: ScoreKind,
    pub degrees: Vec<ScoreDegree>,
    pub bass: Option<ScorePitch>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreNote {
    /// Length in divisions
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBarline {
    pub location: String,
    pub style: String,
}

impl ScoreBarline {
    /// A left double bar opens a new section
    fn starts_section(&self) -> bool {
        self.location == "left" && self.style == "light-light"
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMeasure {
    pub harmonies: Vec<ScoreHarmony>,
    pub notes: Vec<ScoreNote>,
    pub barline: Option<ScoreBarline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreKey {
    pub fifths: i8,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreWork {
    pub title: Option<String>,
    pub composer: Option<String>,
    pub divisions: Option<u32>,
    pub key: Option<ScoreKey>,
    pub measures: Vec<ScoreMeasure>,
}

fn accidentals(alter: i8) -> String {
    let mark = if alter > 0 { "#" } else { "b" };
    mark.repeat(alter.unsigned_abs() as usize)
}

fn spell(pitch: &ScorePitch) -> Result<String, ScoreError> {
    let mut chars = pitch.step.trim().chars();
    match (chars.next().and_then(Letter::from_char), chars.next()) {
        (Some(letter), None) => Ok(format!("{}{}", letter.as_char(), accidentals(pitch.alter))),
        _ => Err(ScoreError::UnknownStep(pitch.step.clone())),
    }
}

fn kind_suffix(kind: &ScoreKind) -> Result<String, ScoreError> {
    if let Some(text) = kind.text.as_deref().filter(|t| !t.is_empty()) {
        return Ok(text.to_string());
    }
    let suffix = match kind.value.trim() {
        "major" => "",
        "minor" => "m",
        "augmented" => "aug",
        "diminished" => "dim",
        "dominant" => "7",
        "half-diminished" => "m7b5",
        "major-seventh" => "maj7",
        "minor-seventh" => "m7",
        "diminished-seventh" => "dim7",
        "augmented-seventh" => "aug7",
        "suspended-fourth" => "sus4",
        "suspended-second" => "sus2",
        "major-sixth" => "6",
        "minor-sixth" => "m6",
        "dominant-ninth" => "9",
        "major-ninth" => "maj9",
        "minor-ninth" => "m9",
        "dominant-11th" => "11",
        "minor-11th" => "m11",
        "dominant-13th" => "13",
        "major-minor" => "mMaj7",
        "power" => "5",
        other => return Err(ScoreError::UnknownKind(other.to_string())),
    };
    Ok(suffix.to_string())
}

/// Chord symbol for one harmony record, e.g. "Bb7(b5)/F"
pub fn chord_symbol(harmony: &ScoreHarmony) -> Result<String, ScoreError> {
    let mut kind = kind_suffix(&harmony.kind)?;
    for degree in &harmony.degrees {
        let marks = accidentals(degree.alter);
        match degree.degree_type {
            DegreeType::Add => kind.push_str(&format!("({}{})", marks, degree.value)),
            DegreeType::Alter if degree.value == 5 && degree.alter == -1 && kind.contains('7') => {
                kind = kind.replacen('7', "7(b5)", 1);
            }
            DegreeType::Alter => kind.push_str(&format!("({}{})", marks, degree.value)),
            DegreeType::Subtract => kind.push_str(&format!("(no{})", degree.value)),
        }
    }

    let mut symbol = format!("{}{}", spell(&harmony.root)?, kind);
    if let Some(bass) = &harmony.bass {
        symbol.push('/');
        symbol.push_str(&spell(bass)?);
    }
    Ok(symbol)
}

/// Key named by a signature. Minor signatures yield the relative minor.
pub fn key_from_fifths(fifths: i8, mode: Option<&str>) -> Key {
    let index = (fifths.unsigned_abs() as usize).min(7);
    let name = if fifths >= 0 {
        SHARP_KEYS[index]
    } else {
        FLAT_KEYS[index]
    };
    let major = Key::parse(name).unwrap_or_else(|_| c_major());
    if mode.is_some_and(|m| m.eq_ignore_ascii_case("minor")) {
        Key::minor(major.relative_minor())
    } else {
        major
    }
}

fn c_major() -> Key {
    Key::major(NoteName::natural(Letter::C))
}

fn beats(duration: u32, divisions: u32) -> f64 {
    duration as f64 / divisions as f64
}

/// Split a score into chord parts, one per section
pub fn ingest(work: &ScoreWork) -> Result<Vec<ChordPart>, ScoreError> {
    let divisions = work.divisions.unwrap_or(DEFAULT_DIVISIONS);
    if divisions == 0 {
        return Err(ScoreError::InvalidDivisions(divisions));
    }
    let key = work
        .key
        .as_ref()
        .map_or_else(c_major, |k| key_from_fifths(k.fifths, k.mode.as_deref()));
    let base_title = format!(
        "{} | {}",
        work.title.as_deref().unwrap_or("Unknown Work"),
        work.composer.as_deref().unwrap_or("Unknown Composer")
    );

    let mut parts: Vec<ChordPart> = Vec::new();
    let mut current = ChordPart::new(format!("{} | Part 1", base_title), key, 0.0);
    let mut time = 0.0;

    for measure in &work.measures {
        if measure.barline.as_ref().is_some_and(ScoreBarline::starts_section) {
            if !current.changes.is_empty() {
                current.length = time;
                parts.push(current);
            }
            current = ChordPart::new(
                format!("{} | Part {}", base_title, parts.len() + 1),
                key,
                0.0,
            );
            time = 0.0;
        }

        if measure.harmonies.is_empty() {
            time += if measure.notes.is_empty() {
                DEFAULT_BEATS
            } else {
                measure.notes.iter().map(|n| beats(n.duration, divisions)).sum::<f64>()
            };
        } else {
            for (i, harmony) in measure.harmonies.iter().enumerate() {
                let duration = measure
                    .notes
                    .get(i)
                    .map_or(DEFAULT_BEATS, |n| beats(n.duration, divisions));
                current
                    .changes
                    .push(ChordChange::new(chord_symbol(harmony)?, time, duration));
                time += duration;
            }
        }
        current.length = time;
    }

    if !current.changes.is_empty() {
        parts.push(current);
    }
    tracing::info!("Ingested {} parts from '{}'", parts.len(), base_title);
    Ok(parts)
}
