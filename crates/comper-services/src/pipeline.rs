//! Hand-off of realized streams to a clip sink

use comper_core::{ClipStream, Scene};

use crate::sink::{ClipRequest, ClipSink, Placement, SinkError};
use crate::slots::{Routing, SlotAllocator, StreamKind};

/// Outcome of handing one stream to the sink
#[derive(Debug)]
pub struct Delivery {
    pub kind: StreamKind,
    pub name: String,
    pub outcome: Result<Placement, SinkError>,
}

impl Delivery {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Deliver one stream at the allocator's next slot for `kind`.
///
/// The returned allocator only moves on when the sink accepted the clip,
/// except that running off the end of the slot grid starts `kind` over at 0.
pub async fn deliver_stream<S: ClipSink + ?Sized>(
    sink: &mut S,
    kind: StreamKind,
    stream: &ClipStream,
    slots: SlotAllocator,
    routing: &Routing,
) -> (SlotAllocator, Delivery) {
    let request = ClipRequest {
        track: routing.track(kind),
        slot: slots.slot(kind),
        stream: stream.clone(),
        channel: kind.channel(),
        overwrite: routing.overwrite,
        fire: routing.fire,
    };
    let outcome = sink.deliver(request).await;

    let slots = match &outcome {
        Ok(placed) => {
            tracing::info!(
                "{} clip '{}' -> track {} slot {} ({} notes{})",
                kind,
                stream.name,
                placed.track,
                placed.slot,
                stream.notes.len(),
                if placed.replaced { ", replaced" } else { "" }
            );
            slots.after(kind, placed.slot, routing.slots)
        }
        Err(e @ SinkError::SlotOutOfRange { .. }) => {
            tracing::warn!(
                "{} clip '{}' not delivered: {}; restarting at slot 0",
                kind,
                stream.name,
                e
            );
            slots.reset(kind)
        }
        Err(e) => {
            tracing::warn!("{} clip '{}' not delivered: {}", kind, stream.name, e);
            slots
        }
    };

    let delivery = Delivery {
        kind,
        name: stream.name.clone(),
        outcome,
    };
    (slots, delivery)
}

/// Deliver harmony, bass and drums in that order, one awaited hand-off each
pub async fn deliver_scene<S: ClipSink + ?Sized>(
    sink: &mut S,
    scene: &Scene,
    mut slots: SlotAllocator,
    routing: &Routing,
) -> (SlotAllocator, Vec<Delivery>) {
    let mut deliveries = Vec::with_capacity(StreamKind::ALL.len());
    for (kind, stream) in StreamKind::ALL.into_iter().zip(scene.streams()) {
        let (next, delivery) = deliver_stream(sink, kind, stream, slots, routing).await;
        slots = next;
        deliveries.push(delivery);
    }
    (slots, deliveries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comper_core::{SceneSettings, generate_scene};
    use fastrand::Rng;

    use crate::session::SessionSink;

    fn scene(seed: u64) -> Scene {
        generate_scene(&SceneSettings::default(), &mut Rng::with_seed(seed))
    }

    #[tokio::test]
    async fn test_scene_lands_on_routed_tracks() {
        let mut sink = SessionSink::new(3, 8);
        let scene = scene(1);
        let (slots, deliveries) =
            deliver_scene(&mut sink, &scene, SlotAllocator::default(), &Routing::default()).await;

        assert!(deliveries.iter().all(Delivery::is_ok));
        let kinds: Vec<StreamKind> = deliveries.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, StreamKind::ALL.to_vec());
        assert_eq!(slots, SlotAllocator { harmony: 1, bass: 1, drums: 1 });

        assert_eq!(sink.clip(0, 0).unwrap().name, scene.harmony.name);
        assert_eq!(sink.clip(1, 0).unwrap().name, scene.drums.name);
        assert_eq!(sink.clip(1, 0).unwrap().channel, 9);
        assert_eq!(sink.clip(2, 0).unwrap().name, scene.bass.name);
        assert_eq!(sink.track(0).unwrap().playing, Some(0));
    }

    #[tokio::test]
    async fn test_repeated_cycles_fill_successive_slots() {
        let mut sink = SessionSink::new(3, 8);
        let routing = Routing::default();
        let mut slots = SlotAllocator::default();
        for seed in 0..3 {
            let (next, _) = deliver_scene(&mut sink, &scene(seed), slots, &routing).await;
            slots = next;
        }
        assert_eq!(slots, SlotAllocator { harmony: 3, bass: 3, drums: 3 });
        assert_eq!(sink.clip_count(), 9);
    }

    #[tokio::test]
    async fn test_failed_stream_keeps_its_counter() {
        // no bass track: harmony and drums land, bass fails
        let mut sink = SessionSink::new(2, 8);
        let (slots, deliveries) =
            deliver_scene(&mut sink, &scene(4), SlotAllocator::default(), &Routing::default()).await;

        assert!(deliveries[0].is_ok());
        assert!(matches!(
            deliveries[1].outcome,
            Err(SinkError::TrackOutOfRange { track: 2, .. })
        ));
        assert!(deliveries[2].is_ok());
        assert_eq!(slots, SlotAllocator { harmony: 1, bass: 0, drums: 1 });
    }

    #[tokio::test]
    async fn test_advanced_placement_moves_counter_past_it() {
        let mut sink = SessionSink::new(3, 8);
        let routing = Routing {
            overwrite: false,
            ..Routing::default()
        };
        let scene = scene(6);
        // occupy harmony slot 0 ahead of the cycle
        let (_, first) =
            deliver_stream(&mut sink, StreamKind::Harmony, &scene.harmony, SlotAllocator::default(), &routing)
                .await;
        assert!(first.is_ok());

        let (slots, _) = deliver_scene(&mut sink, &scene, SlotAllocator::default(), &routing).await;
        assert_eq!(slots.harmony, 2);
        assert_eq!(sink.track(0).unwrap().clip_count(), 2);
    }

    #[tokio::test]
    async fn test_counter_restarts_when_sink_grid_is_smaller() {
        // routing assumes 64 slots, the sink only has 2
        let mut sink = SessionSink::new(3, 2);
        let routing = Routing::default();
        let mut slots = SlotAllocator::default();
        let mut outcomes = Vec::new();
        for seed in 0..4 {
            let (next, deliveries) = deliver_scene(&mut sink, &scene(seed), slots, &routing).await;
            slots = next;
            outcomes.push(deliveries[0].is_ok());
        }
        assert_eq!(outcomes, vec![true, true, false, true]);
        assert_eq!(slots.harmony, 1);
        assert!(sink.clip(0, 0).is_some());
    }
}
