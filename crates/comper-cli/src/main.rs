//! comper: procedural comping clips on a timer

mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use comper_core::realize_part;
use comper_services::{
    ChordList, ClipSink, MidiFileSink, Routing, Scheduler, SchedulerConfig, ScoreWork,
    SessionSink, SlotAllocator, StreamKind, deliver_stream, ingest, shutdown_signal,
};
use fastrand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, SinkKind, default_config_path, load_config, save_config};

/// Command-line arguments for comper
#[derive(Parser, Debug)]
#[command(name = "comper")]
#[command(about = "Generates chord, bass and drum clips and hands them to a clip sink")]
#[command(version)]
struct Args {
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Realize the chord-list part whose title contains this text
    #[arg(long, requires = "chord_list")]
    part: Option<String>,

    /// Chord-list document (JSON)
    #[arg(long)]
    chord_list: Option<PathBuf>,

    /// Ingest a MusicXML score and append its parts to --chord-list
    #[arg(long, requires = "chord_list")]
    import_score: Option<PathBuf>,

    /// Write the effective config back to the config file
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comper=info".into()),
        )
        .init();

    let args = Args::parse();
    tracing::info!("Starting comper");

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);
    if let Some(seed) = args.seed {
        config.generation.seed = Some(seed);
    }
    if args.save_config {
        save_config(&config, &config_path)
            .with_context(|| format!("Failed to save config to {}", config_path.display()))?;
        tracing::info!("Saved config to {}", config_path.display());
    }

    let rng = match config.generation.seed {
        Some(seed) => {
            tracing::info!("Using seed {}", seed);
            Rng::with_seed(seed)
        }
        None => Rng::new(),
    };

    if let (Some(score), Some(list)) = (&args.import_score, &args.chord_list) {
        return import_score(score, list);
    }

    let sink = build_sink(&config);
    let routing = config.routing();

    if let (Some(title), Some(list)) = (&args.part, &args.chord_list) {
        return play_part(sink, &config, &routing, title, list).await;
    }

    let scheduler_config = SchedulerConfig {
        interval: Duration::from_secs(config.scheduler.interval_secs.max(1)),
        cycles: args.once.then_some(1),
    };
    let scheduler = Scheduler::new(sink, config.generation.scene_settings(), routing, rng)
        .with_config(scheduler_config)
        .run(shutdown_signal())
        .await;

    let slots = scheduler.slots();
    tracing::info!(
        "Done: {} cycles, next slots harmony {} bass {} drums {}",
        scheduler.completed(),
        slots.harmony,
        slots.bass,
        slots.drums
    );
    Ok(())
}

fn build_sink(config: &Config) -> Box<dyn ClipSink> {
    match config.sink.kind {
        SinkKind::Session => Box::new(SessionSink::new(config.sink.tracks, config.sink.slots)),
        SinkKind::MidiFile => Box::new(
            MidiFileSink::new(config.sink.output_dir.clone(), config.sink.tempo_bpm)
                .with_grid(config.sink.tracks, config.sink.slots),
        ),
    }
}

/// Realize one chord-list part and deliver it as a harmony clip
async fn play_part(
    mut sink: Box<dyn ClipSink>,
    config: &Config,
    routing: &Routing,
    title: &str,
    list_path: &Path,
) -> Result<()> {
    let list = ChordList::load(list_path)
        .with_context(|| format!("Failed to load chord list {}", list_path.display()))?;
    let Some(part) = list.find(title) else {
        return Ok(());
    };

    let clip = realize_part(&part, &config.generation.realize_options());
    let (_, delivery) = deliver_stream(
        &mut sink,
        StreamKind::Harmony,
        &clip,
        SlotAllocator::default(),
        routing,
    )
    .await;
    delivery
        .outcome
        .with_context(|| format!("Failed to deliver '{}'", part.title))?;
    Ok(())
}

/// Append every part of a MusicXML score to a chord list
fn import_score(score_path: &Path, list_path: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(score_path)
        .with_context(|| format!("Failed to read score {}", score_path.display()))?;
    let work = ScoreWork::from_musicxml(&xml)
        .with_context(|| format!("Failed to parse MusicXML {}", score_path.display()))?;
    let parts = ingest(&work).context("Failed to ingest score")?;

    let mut list = if list_path.exists() {
        ChordList::load(list_path)
            .with_context(|| format!("Failed to load chord list {}", list_path.display()))?
    } else {
        ChordList::default()
    };
    for part in &parts {
        list.push(part);
    }
    list.save(list_path)
        .with_context(|| format!("Failed to write chord list {}", list_path.display()))?;
    tracing::info!(
        "Appended {} parts to {} ({} total)",
        parts.len(),
        list_path.display(),
        list.entries.len()
    );
    Ok(())
}
