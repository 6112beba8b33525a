//! Periodic generation: one scene per tick, delivered before the next tick

use std::future::Future;
use std::time::Duration;

use comper_core::{SceneSettings, generate_scene};
use fastrand::Rng;
use tokio::time::{MissedTickBehavior, interval};

use crate::pipeline::{Delivery, deliver_scene};
use crate::sink::ClipSink;
use crate::slots::{Routing, SlotAllocator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Stop after this many cycles; run until shutdown when `None`
    pub cycles: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            cycles: None,
        }
    }
}

pub struct Scheduler<S: ClipSink> {
    sink: S,
    settings: SceneSettings,
    routing: Routing,
    slots: SlotAllocator,
    rng: Rng,
    config: SchedulerConfig,
    completed: usize,
}

impl<S: ClipSink> Scheduler<S> {
    pub fn new(sink: S, settings: SceneSettings, routing: Routing, rng: Rng) -> Self {
        Self {
            sink,
            settings,
            routing,
            slots: SlotAllocator::default(),
            rng,
            config: SchedulerConfig::default(),
            completed: 0,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn slots(&self) -> SlotAllocator {
        self.slots
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Generate one scene and hand all of its streams to the sink
    pub async fn run_cycle(&mut self) -> Vec<Delivery> {
        let scene = generate_scene(&self.settings, &mut self.rng);
        tracing::info!(
            "Cycle {}: {} ({} beats)",
            self.completed + 1,
            scene.part.title,
            scene.part.length
        );
        let (slots, deliveries) =
            deliver_scene(&mut self.sink, &scene, self.slots, &self.routing).await;
        self.slots = slots;
        self.completed += 1;

        for failed in deliveries.iter().filter(|d| !d.is_ok()) {
            if let Err(e) = &failed.outcome {
                tracing::error!("Delivery of {} clip '{}' failed: {}", failed.kind, failed.name, e);
            }
        }
        deliveries
    }

    /// Run cycles on the configured interval until `shutdown` resolves or the
    /// cycle limit is reached. A cycle always finishes before the next tick is
    /// taken; ticks missed meanwhile are skipped.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Self {
        tracing::info!(
            "Starting scheduler (interval: {:?}, sink: {})",
            self.config.interval,
            self.sink.name()
        );
        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            if self.config.cycles.is_some_and(|limit| self.completed >= limit) {
                break;
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        tracing::info!("Scheduler stopped after {} cycles", self.completed);
        self
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
