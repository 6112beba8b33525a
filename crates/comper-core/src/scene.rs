//! One full generation cycle: harmony, drums and bass for a random key

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::{KeyAnalysis, analyze};
use crate::bass;
use crate::drums::{self, DrumPattern};
use crate::part::{ChordPart, ClipStream};
use crate::pitch::{Key, Letter, NoteName};
use crate::progression::{self, Policy};
use crate::realize::{
    RealizeOptions, chord_list_clip_name, drum_notes, harmony_notes, progression_clip_name,
};
use crate::rhythm::RhythmPattern;
use crate::scale_select::select_scales;
use crate::weighted::pick;

/// Keys a scene may be generated in, circle-of-fourths order
pub const DEFAULT_KEYS: [&str; 12] = [
    "C", "F", "Bb", "Eb", "Ab", "Db", "Gb", "B", "E", "A", "D", "G",
];

/// Part lengths in beats
pub const DEFAULT_LENGTHS: [f64; 3] = [4.0, 8.0, 16.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    pub keys: Vec<Key>,
    pub lengths: Vec<f64>,
    pub policy: Policy,
    pub realize: RealizeOptions,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            keys: DEFAULT_KEYS
                .iter()
                .filter_map(|k| Key::parse(k).ok())
                .collect(),
            lengths: DEFAULT_LENGTHS.to_vec(),
            policy: Policy::default(),
            realize: RealizeOptions::default(),
        }
    }
}

/// Everything one cycle produced, ready for hand-off
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub part: ChordPart,
    pub analysis: KeyAnalysis,
    pub drum_pattern: DrumPattern,
    pub harmony: ClipStream,
    pub bass: ClipStream,
    pub drums: ClipStream,
}

impl Scene {
    /// The three streams in hand-off order
    pub fn streams(&self) -> [&ClipStream; 3] {
        [&self.harmony, &self.bass, &self.drums]
    }
}

/// Pick a key and length, then build harmony, drums and a drum-synced bassline
pub fn generate_scene(settings: &SceneSettings, rng: &mut Rng) -> Scene {
    let key = pick(rng, &settings.keys).copied().unwrap_or_else(|| {
        tracing::warn!("No keys configured; using C");
        Key::major(NoteName::natural(Letter::C))
    });
    let length = pick(rng, &settings.lengths).copied().unwrap_or_else(|| {
        tracing::warn!("No lengths configured; using {} beats", DEFAULT_LENGTHS[0]);
        DEFAULT_LENGTHS[0]
    });

    let part = progression::generate(settings.policy, key, length, rng);
    let analysis = analyze(part.symbols(), part.key);
    let scaled = select_scales(&part, &analysis);

    let mut harmony = ClipStream::new(progression_clip_name(&part), length);
    harmony.extend(harmony_notes(&scaled, &settings.realize));

    let drum_rhythm = RhythmPattern::random(rng);
    tracing::info!("Drum rhythm: {}", drum_rhythm);
    let drum_pattern = drums::generate(drum_rhythm.durations(), length, rng);

    let bassline = bass::generate(&part.changes, Some(&drum_pattern), rng);
    let mut bass = ClipStream::new(format!("Bass Pattern - {}", bassline.style.name), length);
    bass.extend(bassline.notes);

    let mut drums = ClipStream::new(format!("Drum Pattern - {}", drum_pattern.style), length);
    drums.extend(drum_notes(&drum_pattern, rng));

    Scene {
        part,
        analysis,
        drum_pattern,
        harmony,
        bass,
        drums,
    }
}

/// Harmony clip for an imported part
pub fn realize_part(part: &ChordPart, options: &RealizeOptions) -> ClipStream {
    let analysis = analyze(part.symbols(), part.key);
    tracing::info!(
        "{}: {} (secondary {}){}",
        part.title,
        analysis.primary,
        analysis.secondary,
        if analysis.consistent { "" } else { ", inconsistent with nominal key" }
    );
    let scaled = select_scales(part, &analysis);
    let mut clip = ClipStream::new(chord_list_clip_name(part), part.length);
    clip.extend(harmony_notes(&scaled, options));
    clip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{BEAT_EPSILON, ChordChange};

    #[test]
    fn test_default_settings() {
        let settings = SceneSettings::default();
        assert_eq!(settings.keys.len(), 12);
        assert_eq!(settings.lengths, vec![4.0, 8.0, 16.0]);
        assert_eq!(settings.policy, Policy::Functional);
    }

    #[test]
    fn test_scene_streams_fit_their_length() {
        let settings = SceneSettings::default();
        for seed in 0..30 {
            let scene = generate_scene(&settings, &mut Rng::with_seed(seed));
            let length = scene.part.length;
            assert!(DEFAULT_LENGTHS.contains(&length));
            for stream in scene.streams() {
                assert_eq!(stream.length, length);
                assert!(stream.notes.iter().all(|n| n.start < length + BEAT_EPSILON));
                assert!(stream.notes.windows(2).all(|w| w[0].start <= w[1].start));
            }
            assert!(scene.harmony.name.starts_with(&scene.part.title));
            assert!(scene.bass.name.starts_with("Bass Pattern - "));
            assert!(scene.drums.name.starts_with("Drum Pattern - "));
        }
    }

    #[test]
    fn test_scene_is_reproducible() {
        let settings = SceneSettings::default();
        let a = generate_scene(&settings, &mut Rng::with_seed(11));
        let b = generate_scene(&settings, &mut Rng::with_seed(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_settings_fall_back() {
        let settings = SceneSettings {
            keys: Vec::new(),
            lengths: Vec::new(),
            ..SceneSettings::default()
        };
        let scene = generate_scene(&settings, &mut Rng::with_seed(2));
        assert_eq!(scene.part.key.to_string(), "C");
        assert_eq!(scene.part.length, 4.0);
    }

    #[test]
    fn test_realize_imported_part() {
        let mut part = ChordPart::new("Tune | Someone | Part 1", Key::parse("C").unwrap(), 8.0);
        part.changes.push(ChordChange::new("Dm7", 0.0, 2.0));
        part.changes.push(ChordChange::new("G7", 2.0, 2.0));
        part.changes.push(ChordChange::new("Cmaj7", 4.0, 2.0));
        let clip = realize_part(&part, &RealizeOptions::default());
        assert_eq!(clip.name, "|Dm7|G7|Cmaj72");
        assert_eq!(clip.length, 8.0);
        assert!(!clip.notes.is_empty());
        assert!(clip.notes.iter().all(|n| n.start < 6.0));
    }
}
