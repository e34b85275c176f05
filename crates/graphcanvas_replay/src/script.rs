// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gesture scripts: a surface, optional settings and a list of input steps.

use egui::{Key, Modifiers, PointerButton, Pos2, Vec2};
use graphcanvas::{CanvasEvent, CanvasSettings, EventQueue, Graph, GraphCanvas, PointerEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while running a script
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene or script text is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The resulting graph could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// The canvas rejected the script's surface or settings
    #[error("Canvas error: {0}")]
    Canvas(#[from] graphcanvas::CanvasError),

    /// A key step names no known key
    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

/// Mouse button of a pointer step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    /// Left button
    #[default]
    Primary,
    /// Right button
    Secondary,
    /// Wheel button
    Middle,
}

impl From<Button> for PointerButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Primary => PointerButton::Primary,
            Button::Secondary => PointerButton::Secondary,
            Button::Middle => PointerButton::Middle,
        }
    }
}

/// Modifier keys held during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mods {
    /// Shift
    pub shift: bool,
    /// Control
    pub ctrl: bool,
    /// Alt / Option
    pub alt: bool,
    /// Command on macOS, control elsewhere
    pub command: bool,
}

impl From<Mods> for Modifiers {
    fn from(m: Mods) -> Self {
        Modifiers {
            alt: m.alt,
            ctrl: m.ctrl,
            shift: m.shift,
            mac_cmd: false,
            command: m.command,
        }
    }
}

/// One scripted input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Button press at physical surface coordinates
    Down {
        /// X in physical pixels
        x: f32,
        /// Y in physical pixels
        y: f32,
        /// Timestamp in milliseconds
        t: f64,
        /// Button pressed
        #[serde(default)]
        button: Button,
        /// Held modifiers
        #[serde(default)]
        mods: Mods,
    },
    /// Pointer move
    Move {
        /// X in physical pixels
        x: f32,
        /// Y in physical pixels
        y: f32,
        /// Timestamp in milliseconds
        t: f64,
        /// Held modifiers
        #[serde(default)]
        mods: Mods,
    },
    /// Button release
    Up {
        /// X in physical pixels
        x: f32,
        /// Y in physical pixels
        y: f32,
        /// Timestamp in milliseconds
        t: f64,
        /// Button released
        #[serde(default)]
        button: Button,
        /// Held modifiers
        #[serde(default)]
        mods: Mods,
    },
    /// The pointer lost capture
    Cancel,
    /// Key press, by egui key name such as `"Delete"` or `"Z"`
    Key {
        /// Key name
        key: String,
        /// Held modifiers
        #[serde(default)]
        mods: Mods,
    },
    /// Wheel scroll; positive zooms in
    Wheel {
        /// X in physical pixels
        x: f32,
        /// Y in physical pixels
        y: f32,
        /// Scroll amount
        delta: f32,
    },
    /// Produce a frame, refreshing link caches for hit testing
    Draw {
        /// Timestamp in milliseconds
        t: f64,
    },
}

/// A complete script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Surface size in logical pixels
    #[serde(default = "default_surface")]
    pub surface: (f32, f32),
    /// Canvas settings; defaults when absent
    #[serde(default)]
    pub settings: Option<CanvasSettings>,
    /// Inputs in order
    pub steps: Vec<Step>,
}

fn default_surface() -> (f32, f32) {
    (800.0, 600.0)
}

impl Script {
    /// Parse a script from RON text
    pub fn from_ron(text: &str) -> Result<Self, ReplayError> {
        Ok(ron::from_str(text)?)
    }
}

/// Outcome of a replay
#[derive(Debug)]
pub struct ReplayReport {
    /// Events the canvas sent, in order
    pub events: Vec<CanvasEvent>,
    /// Frames produced by draw steps
    pub frames: usize,
    /// Selected item count at the end
    pub selected: usize,
}

/// Run `script` against `graph`
pub fn replay(script: &Script, graph: &mut Graph) -> Result<ReplayReport, ReplayError> {
    let queue = EventQueue::new();
    let settings = script.settings.clone().unwrap_or_default();
    let (w, h) = script.surface;
    let mut canvas =
        GraphCanvas::new(Vec2::new(w, h), settings)?.with_host(Box::new(queue.clone()));
    let mut events = Vec::new();
    let mut frames = 0;

    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!("Step {index}: {step:?}");
        match step {
            Step::Down { x, y, t, button, mods } => {
                let event = pointer(*x, *y, *t, *mods).with_button((*button).into());
                canvas.pointer_down(graph, event);
            }
            Step::Move { x, y, t, mods } => canvas.pointer_move(graph, pointer(*x, *y, *t, *mods)),
            Step::Up { x, y, t, button, mods } => {
                let event = pointer(*x, *y, *t, *mods).with_button((*button).into());
                canvas.pointer_up(graph, event);
            }
            Step::Cancel => canvas.pointer_cancel(graph),
            Step::Key { key, mods } => {
                let key = Key::from_name(key).ok_or_else(|| ReplayError::UnknownKey(key.clone()))?;
                if !canvas.key_down(graph, key, (*mods).into()) {
                    tracing::debug!("Key {key:?} not handled");
                }
            }
            Step::Wheel { x, y, delta } => canvas.wheel(Pos2::new(*x, *y), *delta),
            Step::Draw { t } => {
                if canvas.draw(graph, *t).is_some() {
                    frames += 1;
                }
            }
        }
        for event in queue.drain() {
            tracing::info!("Event after step {index}: {event:?}");
            events.push(event);
        }
    }

    Ok(ReplayReport {
        events,
        frames,
        selected: canvas.selection().len(),
    })
}

fn pointer(x: f32, y: f32, t: f64, mods: Mods) -> PointerEvent {
    PointerEvent::primary(Pos2::new(x, y), t).with_modifiers(mods.into())
}
