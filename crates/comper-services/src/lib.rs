//! comper-services: Clip sinks, chord-list and score input, delivery pipeline and scheduler

pub mod chord_list;
pub mod musicxml;
pub mod pipeline;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod sink;
pub mod slots;
pub mod smf;

pub use chord_list::{ChordList, ChordListError};
pub use pipeline::{Delivery, deliver_scene, deliver_stream};
pub use scheduler::{Scheduler, SchedulerConfig, shutdown_signal};
pub use score::{ScoreError, ScoreHarmony, ScoreMeasure, ScoreWork, ingest};
pub use session::{SessionClip, SessionSink, SessionTrack};
pub use sink::{ClipRequest, ClipSink, Placement, SinkError};
pub use slots::{Routing, SlotAllocator, StreamKind};
pub use smf::MidiFileSink;
