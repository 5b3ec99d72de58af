//! Pointer and keyboard handling for the channel grid and content panel.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioHost, ContextState, SignalGenerator};

/// A clickable tile and the panel section it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub key: String,
    pub title: String,
}

impl Channel {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("projects", "Projects"),
            Self::new("about", "About"),
            Self::new("contact", "Contact"),
            Self::new("cv", "CV"),
            Self::new("recs", "Recommendations"),
        ]
    }

    /// Panel text for this channel. Unknown keys get a title-only panel.
    pub fn panel_content(&self) -> PanelContent {
        let body = match self.key.as_str() {
            "projects" => Some(
                "Here are some highlighted projects. Add project cards with images, \
                 links and descriptions here.",
            ),
            "about" => Some(
                "A short bio: I'm a developer who loves interactive UI and \
                 game-inspired interfaces.",
            ),
            "contact" => Some("Email: you@example.com. Socials: GitHub, LinkedIn"),
            "cv" => Some("Download my CV."),
            "recs" => {
                Some("Here are recommendations and testimonials from colleagues and clients.")
            }
            _ => None,
        };
        PanelContent {
            title: self.title.clone(),
            body: body.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelContent {
    pub title: String,
    pub body: Option<String>,
}

const PANEL_CLOSED_SCALE: f64 = 0.96;

/// Modal content panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    visible: bool,
    content: Option<PanelContent>,
    scale: f64,
    opacity: f64,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            visible: false,
            content: None,
            scale: PANEL_CLOSED_SCALE,
            opacity: 0.0,
        }
    }
}

impl Panel {
    pub fn open(&mut self, content: PanelContent) {
        self.content = Some(content);
        self.visible = true;
        self.scale = 1.0;
        self.opacity = 1.0;
    }

    /// Hides the panel. The last content stays in place for the exit
    /// animation.
    pub fn close(&mut self) {
        self.visible = false;
        self.scale = PANEL_CLOSED_SCALE;
        self.opacity = 0.0;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> Option<&PanelContent> {
        self.content.as_ref()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}

/// Keys the deck reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerEnter(usize),
    PointerClick(usize),
    /// Key pressed while a tile has focus.
    TileKey { tile: usize, key: Key },
    /// Any key press reaching the document, with the focused tile if any.
    DocumentKey { key: Key, active_tile: Option<usize> },
    CloseButton,
}

/// Routes input to tones, focus movement and the panel.
#[derive(Debug)]
pub struct Dispatcher<H, R> {
    tones: SignalGenerator<H, R>,
    channels: Vec<Channel>,
    columns: usize,
    focused: usize,
    panel: Panel,
}

impl<H: AudioHost, R: Rng> Dispatcher<H, R> {
    pub fn new(channels: Vec<Channel>, columns: usize, tones: SignalGenerator<H, R>) -> Self {
        Self {
            tones,
            channels,
            columns: columns.max(1),
            focused: 0,
            panel: Panel::default(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn tones(&self) -> &SignalGenerator<H, R> {
        &self.tones
    }

    pub fn tones_mut(&mut self) -> &mut SignalGenerator<H, R> {
        &mut self.tones
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerEnter(tile) => {
                if tile < self.channels.len() {
                    self.resume_audio();
                    self.tones.hover_tone();
                }
            }
            InputEvent::PointerClick(tile) => {
                if tile < self.channels.len() {
                    self.resume_audio();
                    self.tones.click_tone();
                    self.open(tile);
                }
            }
            InputEvent::TileKey { tile, key } => {
                if matches!(key, Key::Enter | Key::Space) && tile < self.channels.len() {
                    self.tones.click_tone();
                    self.open(tile);
                }
            }
            InputEvent::DocumentKey { key, active_tile } => self.document_key(key, active_tile),
            InputEvent::CloseButton => self.panel.close(),
        }
    }

    fn document_key(&mut self, key: Key, active_tile: Option<usize>) {
        if let Some(tile) = active_tile.filter(|tile| *tile < self.channels.len()) {
            self.focused = tile;
        }

        if key == Key::Escape && self.panel.is_visible() {
            self.panel.close();
            return;
        }

        let Some(last) = self.channels.len().checked_sub(1) else {
            return;
        };
        let target = match key {
            Key::ArrowRight => (self.focused + 1).min(last),
            Key::ArrowLeft => self.focused.saturating_sub(1),
            Key::ArrowDown => (self.focused + self.columns).min(last),
            Key::ArrowUp => self.focused.saturating_sub(self.columns),
            _ => return,
        };
        tracing::trace!(from = self.focused, to = target, "focus moved");
        self.focused = target;
        self.tones.hover_tone();
    }

    fn open(&mut self, tile: usize) {
        let content = self.channels[tile].panel_content();
        tracing::debug!(key = %self.channels[tile].key, "panel opened");
        self.panel.open(content);
    }

    fn resume_audio(&mut self) {
        if let Some(host) = self.tones.host_mut() {
            if host.state() == ContextState::Suspended {
                host.resume();
            }
        }
    }
}
