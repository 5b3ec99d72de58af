//! Core library for the Channel Deck animated front end.
//!
//! The deck is a grid of channel tiles over an animated wave background.
//! Tiles float idly, chirp when hovered and click when activated, and open a
//! content panel. Host capabilities (clock, drawing surface, audio output)
//! sit behind small traits so every frame and every tone can be produced and
//! inspected in-process.

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod motion;
pub mod render;
pub mod timeline;

pub use audio::{AudioHost, ContextState, OfflineMixer, SignalGenerator, ToneAnalysis, ToneGraph};
pub use config::{AppConfig, AudioConfig, DeckConfig, MotionConfig, SurfaceConfig, WaveConfig};
pub use dispatch::{Channel, Dispatcher, InputEvent, Key, Panel, PanelContent};
pub use error::{DeckError, Result};
pub use motion::{MotionAnimator, TileMotionState, TileTransform};
pub use render::{
    CommandRecorder, SharedSurfaceSize, Surface, SurfaceSize, SvgSurface, WaveLayer, WaveLoop,
    WaveRenderer,
};
pub use timeline::{AnimationController, Clock, FrameTask, ManualClock, SystemClock};
