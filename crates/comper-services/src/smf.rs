//! Standard MIDI File clip sink
//!
//! Each delivered clip becomes its own SMF (format 1, 480 PPQ) with a tempo
//! track and one note track. Destinations are encoded in the file name as
//! `t<track>-s<slot>-<name>.mid`, so an existing file with the same track and
//! slot prefix counts as an occupied slot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use comper_core::ClipStream;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use crate::sink::{ClipRequest, ClipSink, Placement, SinkError, resolve_slot};

/// Ticks per quarter note
pub const TICKS_PER_QUARTER: u16 = 480;

const DEFAULT_TRACKS: usize = 16;
const DEFAULT_SLOTS: usize = 64;
const MAX_NAME_LEN: usize = 96;

pub struct MidiFileSink {
    dir: PathBuf,
    tempo_bpm: u32,
    track_count: usize,
    slot_count: usize,
}

impl MidiFileSink {
    pub fn new(dir: impl Into<PathBuf>, tempo_bpm: u32) -> Self {
        Self {
            dir: dir.into(),
            tempo_bpm,
            track_count: DEFAULT_TRACKS,
            slot_count: DEFAULT_SLOTS,
        }
    }

    pub fn with_grid(mut self, track_count: usize, slot_count: usize) -> Self {
        self.track_count = track_count;
        self.slot_count = slot_count;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn existing_files(&self) -> Result<Vec<String>, SinkError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn slot_prefix(track: usize, slot: usize) -> String {
    format!("t{}-s{}-", track, slot)
}

/// Make a clip name safe to use as a file name
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '#' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "clip".to_string()
    } else {
        trimmed.to_string()
    }
}

fn beats_to_ticks(beats: f64) -> u32 {
    (beats.max(0.0) * TICKS_PER_QUARTER as f64).round() as u32
}

/// Encode a clip stream as SMF bytes
pub fn encode(stream: &ClipStream, channel: u8, tempo_bpm: u32) -> Result<Vec<u8>, SinkError> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let tempo: Track = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
                60_000_000 / tempo_bpm.max(1),
            ))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    smf.tracks.push(tempo);

    // (tick, is_on, pitch, velocity); offs sort ahead of ons at the same tick
    let mut events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(stream.notes.len() * 2);
    for note in &stream.notes {
        let on = beats_to_ticks(note.start);
        let off = beats_to_ticks(note.end()).max(on + 1);
        let pitch = note.pitch.min(127);
        events.push((on, true, pitch, note.velocity.clamp(1, 127)));
        events.push((off, false, pitch, 0));
    }
    events.sort_by_key(|&(tick, on, pitch, _)| (tick, on, pitch));

    let channel = u4::new(channel.min(15));
    let mut track: Track = Vec::with_capacity(events.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(stream.name.as_bytes())),
    });
    let mut last = 0u32;
    for (tick, on, pitch, vel) in events {
        let message = if on {
            MidiMessage::NoteOn {
                key: u7::new(pitch),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(pitch),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last),
            kind: TrackEventKind::Midi { channel, message },
        });
        last = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(beats_to_ticks(stream.length).saturating_sub(last)),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| SinkError::Encode(e.to_string()))?;
    Ok(buf)
}

#[async_trait]
impl ClipSink for MidiFileSink {
    fn name(&self) -> &'static str {
        "midi-file"
    }

    async fn deliver(&mut self, request: ClipRequest) -> Result<Placement, SinkError> {
        if request.track >= self.track_count {
            return Err(SinkError::TrackOutOfRange {
                track: request.track,
                available: self.track_count,
            });
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let existing = self.existing_files().await?;

        let (slot, replaced) = resolve_slot(
            request.track,
            request.slot,
            self.slot_count,
            request.overwrite,
            |s| {
                let prefix = slot_prefix(request.track, s);
                existing.iter().any(|name| name.starts_with(&prefix))
            },
        )?;

        let prefix = slot_prefix(request.track, slot);
        if replaced {
            for name in existing.iter().filter(|name| name.starts_with(&prefix)) {
                tokio::fs::remove_file(self.dir.join(name)).await?;
            }
        }

        let bytes = encode(&request.stream, request.channel, self.tempo_bpm)?;
        let path = self.dir.join(format!(
            "{}{}.mid",
            prefix,
            sanitize_name(&request.stream.name)
        ));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Wrote {}", path.display());

        if request.fire {
            tracing::debug!("{} cannot launch clips; fire ignored", self.name());
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
    use comper_core::NoteEvent;

    fn stream() -> ClipStream {
        let mut s = ClipStream::new("Modal Interchange in C (C → F)", 4.0);
        s.add_note(NoteEvent::new(60, 0.0, 2.0, 100));
        s.add_note(NoteEvent::new(64, 0.0, 2.0, 100));
        s.add_note(NoteEvent::new(65, 2.0, 2.0, 90));
        s
    }

    fn note_ons(track: &Track) -> usize {
        track
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. },
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn test_encode_parses_back() {
        let bytes = encode(&stream(), 0, 120).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(note_ons(&smf.tracks[1]), 3);

        // total ticks on the note track equal the clip length
        let total: u32 = smf.tracks[1].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(total, 4 * TICKS_PER_QUARTER as u32);
    }

    #[test]
    fn test_encode_uses_channel() {
        let bytes = encode(&stream(), 9, 100).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let channels: Vec<u8> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi { channel, .. } => Some(channel.as_int()),
                _ => None,
            })
            .collect();
        assert!(!channels.is_empty());
        assert!(channels.iter().all(|&c| c == 9));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Drum Pattern - Rock"), "Drum_Pattern_-_Rock");
        assert_eq!(sanitize_name("|Dm7|G7|Cmaj72"), "Dm7_G7_Cmaj72");
        assert_eq!(sanitize_name("///"), "clip");
    }

    #[tokio::test]
    async fn test_deliver_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MidiFileSink::new(dir.path(), 120);
        let placed = sink.deliver(ClipRequest::new(2, 0, stream())).await.unwrap();
        assert_eq!(placed, Placement { track: 2, slot: 0, replaced: false });

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("t2-s0-"));
        assert!(files[0].ends_with(".mid"));
    }

    #[tokio::test]
    async fn test_deliver_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MidiFileSink::new(dir.path(), 120);
        sink.deliver(ClipRequest::new(0, 0, stream())).await.unwrap();

        let mut other = stream();
        other.name = "Other".to_string();
        let placed = sink.deliver(ClipRequest::new(0, 0, other.clone())).await.unwrap();
        assert!(placed.replaced);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(dir.path().join("t0-s0-Other.mid").exists());

        let mut keep = ClipRequest::new(0, 0, other);
        keep.overwrite = false;
        let placed = sink.deliver(keep).await.unwrap();
        assert_eq!(placed.slot, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_track_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MidiFileSink::new(dir.path(), 120).with_grid(3, 4);
        let err = sink.deliver(ClipRequest::new(3, 0, stream())).await.unwrap_err();
        assert!(matches!(err, SinkError::TrackOutOfRange { track: 3, available: 3 }));
    }
}
