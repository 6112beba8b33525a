//! comper-core: Music theory and procedural generation for comper

pub mod analysis;
pub mod bass;
pub mod chord;
pub mod drums;
mod error;
mod part;
pub mod pitch;
pub mod progression;
pub mod realize;
pub mod rhythm;
pub mod scale;
pub mod scale_select;
pub mod scene;
pub mod weighted;

pub use analysis::{Framework, FrameworkScore, KeyAnalysis, analyze};
pub use bass::{BassStyle, Bassline};
pub use chord::{Chord, ChordFamily, ChordQuality, Voicing};
pub use drums::{DrumInstrument, DrumPattern, DrumRule, DrumStyle};
pub use error::{Result, TheoryError};
pub use part::{BEAT_EPSILON, ChordChange, ChordPart, ClipStream, NoteEvent, ScaledChordChange};
pub use pitch::{Key, Letter, NoteName, PitchClass};
pub use progression::{HarmonicFunction, Policy};
pub use realize::RealizeOptions;
pub use rhythm::RhythmPattern;
pub use scale::{Scale, ScaleKind, detect_scale};
pub use scale_select::select_scales;
pub use scene::{Scene, SceneSettings, generate_scene, realize_part};
pub use weighted::WeightedTable;
