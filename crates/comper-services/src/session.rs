//! In-memory clip session: tracks of clip slots

use async_trait::async_trait;
use comper_core::NoteEvent;

use crate::sink::{ClipRequest, ClipSink, Placement, SinkError, resolve_slot};

/// A clip held in a session slot
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClip {
    pub name: String,
    /// Length in beats
    pub length: f64,
    pub channel: u8,
    pub notes: Vec<NoteEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionTrack {
    pub slots: Vec<Option<SessionClip>>,
    /// Slot currently launched, at most one per track
    pub playing: Option<usize>,
}

impl SessionTrack {
    fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            playing: None,
        }
    }

    pub fn clip(&self, slot: usize) -> Option<&SessionClip> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn clip_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Clip sink backed by a fixed grid of tracks and slots
#[derive(Debug, Clone, Default)]
pub struct SessionSink {
    pub tracks: Vec<SessionTrack>,
}

impl SessionSink {
    pub fn new(track_count: usize, slot_count: usize) -> Self {
        Self {
            tracks: (0..track_count).map(|_| SessionTrack::new(slot_count)).collect(),
        }
    }

    pub fn track(&self, index: usize) -> Option<&SessionTrack> {
        self.tracks.get(index)
    }

    pub fn clip(&self, track: usize, slot: usize) -> Option<&SessionClip> {
        self.tracks.get(track)?.clip(slot)
    }

    /// Delete a clip, stopping it if it was playing
    pub fn remove_clip(&mut self, track: usize, slot: usize) -> Option<SessionClip> {
        let t = self.tracks.get_mut(track)?;
        if t.playing == Some(slot) {
            t.playing = None;
        }
        t.slots.get_mut(slot)?.take()
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(SessionTrack::clip_count).sum()
    }
}

#[async_trait]
impl ClipSink for SessionSink {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn deliver(&mut self, request: ClipRequest) -> Result<Placement, SinkError> {
        let available = self.tracks.len();
        let track = self
            .tracks
            .get_mut(request.track)
            .ok_or(SinkError::TrackOutOfRange {
                track: request.track,
                available,
            })?;

        let (slot, replaced) = resolve_slot(
            request.track,
            request.slot,
            track.slots.len(),
            request.overwrite,
            |s| track.slots[s].is_some(),
        )?;

        if replaced && track.playing == Some(slot) {
            track.playing = None;
        }
        track.slots[slot] = Some(SessionClip {
            name: request.stream.name,
            length: request.stream.length,
            channel: request.channel,
            notes: request.stream.notes,
        });
        if request.fire {
            track.playing = Some(slot);
        }

        Ok(Placement {
            track: request.track,
            slot,
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comper_core::ClipStream;

    fn stream(name: &str) -> ClipStream {
        let mut s = ClipStream::new(name, 4.0);
        s.add_note(NoteEvent::new(60, 0.0, 1.0, 100));
        s
    }

    #[tokio::test]
    async fn test_deliver_into_empty_slot() {
        let mut sink = SessionSink::new(3, 4);
        let mut req = ClipRequest::new(1, 2, stream("a"));
        req.fire = true;
        let placed = sink.deliver(req).await.unwrap();
        assert_eq!(placed, Placement { track: 1, slot: 2, replaced: false });
        let clip = sink.clip(1, 2).unwrap();
        assert_eq!(clip.name, "a");
        assert_eq!(clip.length, 4.0);
        assert_eq!(clip.notes.len(), 1);
        assert_eq!(sink.track(1).unwrap().playing, Some(2));
    }

    #[tokio::test]
    async fn test_overwrite_replaces() {
        let mut sink = SessionSink::new(1, 4);
        sink.deliver(ClipRequest::new(0, 0, stream("old"))).await.unwrap();
        let placed = sink.deliver(ClipRequest::new(0, 0, stream("new"))).await.unwrap();
        assert!(placed.replaced);
        assert_eq!(sink.clip(0, 0).unwrap().name, "new");
        assert_eq!(sink.clip_count(), 1);
    }

    #[tokio::test]
    async fn test_collision_advances_without_overwrite() {
        let mut sink = SessionSink::new(1, 4);
        sink.deliver(ClipRequest::new(0, 0, stream("first"))).await.unwrap();
        let mut req = ClipRequest::new(0, 0, stream("second"));
        req.overwrite = false;
        let placed = sink.deliver(req).await.unwrap();
        assert_eq!(placed.slot, 1);
        assert!(!placed.replaced);
        assert_eq!(sink.clip(0, 0).unwrap().name, "first");
        assert_eq!(sink.clip(0, 1).unwrap().name, "second");
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let mut sink = SessionSink::new(2, 2);
        let err = sink.deliver(ClipRequest::new(5, 0, stream("x"))).await.unwrap_err();
        assert!(matches!(err, SinkError::TrackOutOfRange { track: 5, available: 2 }));
        let err = sink.deliver(ClipRequest::new(0, 2, stream("x"))).await.unwrap_err();
        assert!(matches!(err, SinkError::SlotOutOfRange { .. }));
        assert_eq!(sink.clip_count(), 0);
    }

    #[tokio::test]
    async fn test_fire_moves_playing_slot() {
        let mut sink = SessionSink::new(1, 4);
        let mut a = ClipRequest::new(0, 0, stream("a"));
        a.fire = true;
        sink.deliver(a).await.unwrap();
        let mut b = ClipRequest::new(0, 1, stream("b"));
        b.fire = true;
        sink.deliver(b).await.unwrap();
        assert_eq!(sink.track(0).unwrap().playing, Some(1));

        sink.remove_clip(0, 1);
        assert_eq!(sink.track(0).unwrap().playing, None);
    }
}
