use serde::{Deserialize, Serialize};

use crate::audio::ToneGraph;

/// Lifecycle state of an audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    /// Created but not yet allowed to produce sound, e.g. before the first
    /// user gesture.
    Suspended,
    Running,
    Closed,
}

/// The audio subsystem tones are scheduled on.
///
/// Hosts own playback completely: once a graph is scheduled the caller keeps
/// no handle to it, and the host discards each voice after its stop time.
pub trait AudioHost {
    /// Context clock in seconds.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> u32;

    fn state(&self) -> ContextState;

    fn resume(&mut self);

    fn schedule(&mut self, graph: ToneGraph);
}
