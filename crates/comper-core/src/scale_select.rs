//! Chord-scale assignment

use crate::analysis::KeyAnalysis;
use crate::chord::{Chord, ChordFamily, split_bass};
use crate::part::{ChordPart, ScaledChordChange};
use crate::pitch::{Letter, NoteName};
use crate::scale::{Scale, ScaleKind, detect_scale};

/// Diatonic chords of the analyzed primary key, triads and sevenths
pub fn diatonic_chords(analysis: &KeyAnalysis) -> Vec<Chord> {
    let scale = analysis.primary_scale();
    let mut chords = scale.diatonic_triads();
    chords.extend(scale.diatonic_sevenths());
    chords
}

/// Assign an improvisation scale to every change of `part`.
///
/// Diatonic chords get the primary scale on the framework's own tonic
/// (see [`KeyAnalysis::tonic`]), so in nominal "C" a Natural Minor reading
/// yields A Aeolian rather than C Aeolian.
pub fn select_scales(part: &ChordPart, analysis: &KeyAnalysis) -> Vec<ScaledChordChange> {
    let primary = analysis.primary_scale();
    let diatonic = diatonic_chords(analysis);
    part.changes
        .iter()
        .map(|change| ScaledChordChange {
            scale: scale_for_chord(&change.chord, &diatonic, &primary),
            change: change.clone(),
        })
        .collect()
}

/// Scale for a single chord symbol against a diatonic set
pub fn scale_for_chord(symbol: &str, diatonic: &[Chord], primary: &Scale) -> Scale {
    let (head, _) = split_bass(symbol.trim());
    let chord = match Chord::parse(head) {
        Ok(chord) => chord,
        Err(err) => {
            let root = NoteName::parse_prefix(head)
                .map_or(NoteName::natural(Letter::C), |(root, _)| root);
            tracing::warn!("{}; using {} chromatic", err, root);
            return Scale::chromatic(root);
        }
    };

    if diatonic.iter().any(|d| d.same_sound(&chord)) {
        return primary.clone();
    }

    let kind = match chord.quality.family() {
        ChordFamily::Major => ScaleKind::Lydian,
        ChordFamily::Minor => ScaleKind::Dorian,
        ChordFamily::Dominant => ScaleKind::Mixolydian,
        ChordFamily::Diminished | ChordFamily::Augmented => ScaleKind::WholeTone,
        ChordFamily::Other => {
            return detect_scale(chord.root, &chord.pitch_classes()).unwrap_or_else(|| {
                tracing::warn!("No scale contains {}; using chromatic", chord);
                Scale::chromatic(chord.root)
            });
        }
    };
    Scale::new(chord.root, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::part::ChordChange;
    use crate::pitch::Key;

    fn part(key: &str, symbols: &[&str]) -> ChordPart {
        let mut part = ChordPart::new("test", Key::parse(key).unwrap(), symbols.len() as f64);
        for (i, s) in symbols.iter().enumerate() {
            part.changes.push(ChordChange::new(*s, i as f64, 1.0));
        }
        part
    }

    fn scaled(key: &str, symbols: &[&str]) -> Vec<ScaledChordChange> {
        let part = part(key, symbols);
        let analysis = analyze(part.symbols(), part.key);
        select_scales(&part, &analysis)
    }

    fn names(scale: &Scale) -> Vec<String> {
        scale.notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_diatonic_chords_get_primary_scale() {
        let result = scaled("C", &["Dm7", "G7", "Cmaj7"]);
        for sc in &result {
            assert_eq!(names(&sc.scale), ["C", "D", "E", "F", "G", "A", "B"]);
        }
    }

    #[test]
    fn test_minor_reading_stays_on_relative_tonic() {
        let result = scaled("C", &["Am", "E", "Am"]);
        assert_eq!(result[0].scale.kind, ScaleKind::HarmonicMinor);
        assert_eq!(result[0].scale.tonic.to_string(), "A");
        assert_eq!(result[1].scale, result[0].scale);
    }

    #[test]
    fn test_secondary_dominant_gets_mixolydian() {
        let result = scaled("C", &["Cmaj7", "Dm7", "D7", "G7"]);
        assert_eq!(names(&result[2].scale), ["D", "E", "F#", "G", "A", "B", "C"]);
        assert_eq!(result[2].scale.kind, ScaleKind::Mixolydian);
    }

    #[test]
    fn test_family_scales() {
        let result = scaled("C", &["C", "Ebmaj7", "F#m", "Ab7", "C#dim7", "Eaug"]);
        assert_eq!(result[1].scale.kind, ScaleKind::Lydian);
        assert_eq!(result[2].scale.kind, ScaleKind::Dorian);
        assert_eq!(result[3].scale.kind, ScaleKind::Mixolydian);
        assert_eq!(result[4].scale.kind, ScaleKind::WholeTone);
        assert_eq!(result[5].scale.kind, ScaleKind::WholeTone);
        assert_eq!(result[2].scale.tonic.to_string(), "F#");
    }

    #[test]
    fn test_other_qualities_use_detection() {
        // Dsus4 is not diatonic as a triad; D G A fits D Major first
        let result = scaled("C", &["C", "F", "G", "Dsus4"]);
        assert_eq!(result[3].scale.kind, ScaleKind::Major);
        assert_eq!(result[3].scale.tonic.to_string(), "D");
    }

    #[test]
    fn test_unparseable_chord_falls_back_to_chromatic() {
        let result = scaled("C", &["C", "Fxyz"]);
        assert_eq!(result[1].scale.kind, ScaleKind::Chromatic);
        assert_eq!(result[1].scale.tonic.to_string(), "F");
    }

    #[test]
    fn test_slash_chords_use_upper_structure() {
        let result = scaled("C", &["C", "G/B", "Am"]);
        assert_eq!(result[1].scale.kind, ScaleKind::Major);
        assert_eq!(result[1].scale.tonic.to_string(), "C");
    }

    #[test]
    fn test_selection_is_idempotent() {
        let part = part("Bb", &["Bbmaj7", "Gm7", "Cm7", "F7", "Db7", "Ebmaj7"]);
        let analysis = analyze(part.symbols(), part.key);
        let first = select_scales(&part, &analysis);
        let second = select_scales(&part, &analysis);
        assert_eq!(first, second);
    }
}
