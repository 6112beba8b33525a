//! Clip sink contract: where realized note streams end up

use async_trait::async_trait;
use comper_core::ClipStream;
use thiserror::Error;

/// GM percussion channel (zero-based)
pub const DRUM_CHANNEL: u8 = 9;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Track {track} out of range ({available} tracks)")]
    TrackOutOfRange { track: usize, available: usize },

    #[error("No free clip slot on track {track} from slot {slot}")]
    SlotOutOfRange { track: usize, slot: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI encoding failed: {0}")]
    Encode(String),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// One stream to place at a (track, slot) destination
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub track: usize,
    pub slot: usize,
    pub stream: ClipStream,
    /// MIDI channel the notes play on (0-15)
    pub channel: u8,
    /// Clear an occupied slot instead of moving on to the next one
    pub overwrite: bool,
    /// Start playback once the clip is written
    pub fire: bool,
}

impl ClipRequest {
    pub fn new(track: usize, slot: usize, stream: ClipStream) -> Self {
        Self {
            track,
            slot,
            stream,
            channel: 0,
            overwrite: true,
            fire: false,
        }
    }
}

/// Where a clip actually landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub track: usize,
    pub slot: usize,
    /// An existing clip was cleared to make room
    pub replaced: bool,
}

#[async_trait]
pub trait ClipSink: Send {
    fn name(&self) -> &'static str;

    /// Resolve the destination, create the clip, insert its notes and optionally fire it
    async fn deliver(&mut self, request: ClipRequest) -> Result<Placement, SinkError>;
}

#[async_trait]
impl<S: ClipSink + ?Sized> ClipSink for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn deliver(&mut self, request: ClipRequest) -> Result<Placement, SinkError> {
        (**self).deliver(request).await
    }
}

/// Pick the slot a clip goes into.
///
/// An empty requested slot is used as is. An occupied one is cleared when
/// `overwrite` is set, otherwise the next free slot after it is taken.
pub fn resolve_slot(
    track: usize,
    requested: usize,
    slot_count: usize,
    overwrite: bool,
    occupied: impl Fn(usize) -> bool,
) -> Result<(usize, bool), SinkError> {
    if requested >= slot_count {
        return Err(SinkError::SlotOutOfRange {
            track,
            slot: requested,
        });
    }
    if !occupied(requested) {
        return Ok((requested, false));
    }
    if overwrite {
        return Ok((requested, true));
    }
    (requested + 1..slot_count)
        .find(|&slot| !occupied(slot))
        .map(|slot| (slot, false))
        .ok_or(SinkError::SlotOutOfRange {
            track,
            slot: requested,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_empty_slot() {
        assert_eq!(resolve_slot(0, 2, 8, false, |_| false).unwrap(), (2, false));
    }

    #[test]
    fn test_resolve_overwrite_clears() {
        assert_eq!(resolve_slot(0, 2, 8, true, |_| true).unwrap(), (2, true));
    }

    #[test]
    fn test_resolve_advances_past_occupied() {
        let taken = [0, 1, 3];
        let resolved = resolve_slot(1, 0, 8, false, |s| taken.contains(&s)).unwrap();
        assert_eq!(resolved, (2, false));
    }

    #[test]
    fn test_resolve_out_of_range() {
        assert!(matches!(
            resolve_slot(1, 8, 8, true, |_| false),
            Err(SinkError::SlotOutOfRange { track: 1, slot: 8 })
        ));
        assert!(matches!(
            resolve_slot(1, 6, 8, false, |_| true),
            Err(SinkError::SlotOutOfRange { track: 1, slot: 6 })
        ));
    }
}
