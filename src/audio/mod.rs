//! Audio transcoding: engine lifecycle and per-track processing.

mod engine;
mod processor;

pub use engine::{
    preview_spec, AudioProbe, FfmpegEngine, FfmpegEngineFactory, PreviewSpec, TranscodeEngine,
    TranscodeEngineFactory, TranscodeError, FULL_MP3_BITRATE_KBPS, OUTPUT_SAMPLE_RATE_HZ,
    PREVIEW_BITRATE_KBPS,
};
pub use processor::{TrackProcessError, TrackProcessor};
