//! Destination tracks and per-stream slot counters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sink::DRUM_CHANNEL;

/// The three streams a scene produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Harmony,
    Bass,
    Drums,
}

impl StreamKind {
    /// Hand-off order
    pub const ALL: [StreamKind; 3] = [StreamKind::Harmony, StreamKind::Bass, StreamKind::Drums];

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Harmony => "harmony",
            StreamKind::Bass => "bass",
            StreamKind::Drums => "drums",
        }
    }

    pub fn channel(self) -> u8 {
        match self {
            StreamKind::Drums => DRUM_CHANNEL,
            _ => 0,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which track each stream goes to, and how clips land there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routing {
    pub harmony: usize,
    pub drums: usize,
    pub bass: usize,
    /// Clear occupied slots rather than moving to the next free one
    pub overwrite: bool,
    /// Launch clips once written
    pub fire: bool,
    /// Slots per track; counters wrap back to 0 past the last one
    pub slots: usize,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            harmony: 0,
            drums: 1,
            bass: 2,
            overwrite: true,
            fire: true,
            slots: 64,
        }
    }
}

impl Routing {
    pub fn track(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Harmony => self.harmony,
            StreamKind::Bass => self.bass,
            StreamKind::Drums => self.drums,
        }
    }
}

/// Next clip slot per stream. Threaded through each delivery and handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAllocator {
    pub harmony: usize,
    pub bass: usize,
    pub drums: usize,
}

impl SlotAllocator {
    pub fn slot(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Harmony => self.harmony,
            StreamKind::Bass => self.bass,
            StreamKind::Drums => self.drums,
        }
    }

    /// Allocator whose next slot for `kind` follows `used`, wrapping to 0
    /// after the last of `slot_count` slots
    pub fn after(self, kind: StreamKind, used: usize, slot_count: usize) -> Self {
        self.with_slot(kind, (used + 1) % slot_count.max(1))
    }

    /// Allocator that starts `kind` over at slot 0
    pub fn reset(self, kind: StreamKind) -> Self {
        self.with_slot(kind, 0)
    }

    fn with_slot(mut self, kind: StreamKind, next: usize) -> Self {
        match kind {
            StreamKind::Harmony => self.harmony = next,
            StreamKind::Bass => self.bass = next,
            StreamKind::Drums => self.drums = next,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routing() {
        let routing = Routing::default();
        assert_eq!(routing.track(StreamKind::Harmony), 0);
        assert_eq!(routing.track(StreamKind::Drums), 1);
        assert_eq!(routing.track(StreamKind::Bass), 2);
    }

    #[test]
    fn test_allocator_after() {
        let slots = SlotAllocator::default().after(StreamKind::Bass, 0, 8);
        assert_eq!(slots, SlotAllocator { harmony: 0, bass: 1, drums: 0 });
        let slots = slots.after(StreamKind::Drums, 4, 8);
        assert_eq!(slots.slot(StreamKind::Drums), 5);
        assert_eq!(slots.slot(StreamKind::Bass), 1);
    }

    #[test]
    fn test_allocator_wraps_and_resets() {
        let slots = SlotAllocator::default().after(StreamKind::Harmony, 3, 4);
        assert_eq!(slots.harmony, 0);
        let slots = slots.after(StreamKind::Bass, 2, 4).reset(StreamKind::Bass);
        assert_eq!(slots.bass, 0);
        // a zero-sized grid never divides by zero
        assert_eq!(SlotAllocator::default().after(StreamKind::Drums, 5, 0).drums, 0);
    }

    #[test]
    fn test_drums_use_percussion_channel() {
        assert_eq!(StreamKind::Drums.channel(), 9);
        assert_eq!(StreamKind::Harmony.channel(), 0);
    }
}
