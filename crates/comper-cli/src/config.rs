//! TOML configuration for the comper binary

use std::path::{Path, PathBuf};

use comper_core::{Key, Policy, RealizeOptions, SceneSettings, Voicing};
use comper_services::Routing;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: Option<u64>,
    pub keys: Vec<Key>,
    /// Part lengths in beats
    pub lengths: Vec<f64>,
    pub policy: Policy,
    pub voicing: Voicing,
    pub arpeggio: bool,
    pub chord_velocity: u8,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let settings = SceneSettings::default();
        Self {
            seed: None,
            keys: settings.keys,
            lengths: settings.lengths,
            policy: settings.policy,
            voicing: settings.realize.voicing,
            arpeggio: settings.realize.arpeggio,
            chord_velocity: settings.realize.chord_velocity,
        }
    }
}

impl GenerationConfig {
    pub fn realize_options(&self) -> RealizeOptions {
        RealizeOptions {
            voicing: self.voicing,
            arpeggio: self.arpeggio,
            chord_velocity: self.chord_velocity.clamp(1, 127),
        }
    }

    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            keys: self.keys.clone(),
            lengths: self.lengths.iter().copied().filter(|l| *l > 0.0).collect(),
            policy: self.policy,
            realize: self.realize_options(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub interval_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self { interval_secs: 20 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// In-memory session, nothing written
    Session,
    #[default]
    MidiFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub fire: bool,
    pub tempo_bpm: u32,
    pub tracks: usize,
    pub slots: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            output_dir: PathBuf::from("out"),
            overwrite: true,
            fire: true,
            tempo_bpm: 120,
            tracks: 8,
            slots: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub harmony: usize,
    pub drums: usize,
    pub bass: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let routing = Routing::default();
        Self {
            harmony: routing.harmony,
            drums: routing.drums,
            bass: routing.bass,
        }
    }
}

impl Config {
    pub fn routing(&self) -> Routing {
        Routing {
            harmony: self.routing.harmony,
            drums: self.routing.drums,
            bass: self.routing.bass,
            overwrite: self.sink.overwrite,
            fire: self.sink.fire,
            slots: self.sink.slots,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("comper")
        .join("config.toml")
}

/// Read the config file, falling back to defaults when it is missing or invalid
pub fn load_config(path: &Path) -> Config {
    let Ok(text) = std::fs::read_to_string(path) else {
        tracing::debug!("No config at {}; using defaults", path.display());
        return Config::default();
    };
    match toml::from_str(&text) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("Invalid config {}: {}; using defaults", path.display(), e);
            Config::default()
        }
    }
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
