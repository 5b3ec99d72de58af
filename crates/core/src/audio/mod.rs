//! Interface tone synthesis.
//!
//! Tones are described as [`ToneGraph`]s and handed to an [`AudioHost`],
//! which plays and disposes of them on its own clock. [`OfflineMixer`] is the
//! in-process host used for export and tests; with the `device` feature,
//! `DeviceHost` plays the same mix on the default output device.

pub mod analysis;
#[cfg(feature = "device")]
mod device;
mod graph;
mod host;
mod mixer;
pub mod synth;
mod wav;

pub use analysis::{analyse, ToneAnalysis};
#[cfg(feature = "device")]
pub use device::DeviceHost;
pub use graph::{
    Automation, Filter, ParamTimeline, Source, ToneGraph, Voice, Waveform, DEFAULT_Q_DB,
};
pub use host::{AudioHost, ContextState};
pub use mixer::OfflineMixer;
pub use synth::{click_graph, hover_graph, SignalGenerator};
pub use wav::write_wav;
