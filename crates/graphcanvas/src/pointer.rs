// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer session tracking.
//!
//! [`PointerSession`] follows one pointer from press to release and
//! classifies what happened: a click, a double click, or a drag. It does not
//! know what was pressed; the canvas applies the classification to the
//! current gesture.

use crate::geometry::distance;
use crate::settings::CanvasSettings;
use egui::{Modifiers, PointerButton, Pos2};

/// One raw pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position on the surface in physical pixels
    pub pos: Pos2,
    /// Button that changed (for moves, the held button)
    pub button: PointerButton,
    /// Keyboard modifiers at the time of the event
    pub modifiers: Modifiers,
    /// Timestamp in milliseconds
    pub time_ms: f64,
}

impl PointerEvent {
    /// Primary-button event without modifiers
    pub fn primary(pos: Pos2, time_ms: f64) -> Self {
        Self {
            pos,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            time_ms,
        }
    }

    /// Replace the button
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Replace the modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Outcome of a pointer move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTransition {
    /// Nothing to report
    None,
    /// The press just became a drag
    DragStart,
    /// The drag continued
    Drag,
}

/// Outcome of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRelease {
    /// Press and release close together
    Click,
    /// Second click of a pair
    DoubleClick,
    /// A drag finished
    DragEnd,
    /// The pointer wandered off with nothing listening for drags
    None,
}

impl PointerRelease {
    /// Whether this release counts as a click
    pub fn is_click(self) -> bool {
        matches!(self, Self::Click | Self::DoubleClick)
    }
}

/// Click/drag thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerThresholds {
    /// Distance after which a press becomes a drag
    pub max_click_drift: f32,
    /// Hold time after which any movement becomes a drag
    pub buffer_time_ms: f64,
    /// Max gap between the two clicks of a double click
    pub double_click_time_ms: f64,
    /// Max distance between the two clicks of a double click
    pub double_click_drift: f32,
}

impl Default for PointerThresholds {
    fn default() -> Self {
        Self::from(&CanvasSettings::default())
    }
}

impl From<&CanvasSettings> for PointerThresholds {
    fn from(settings: &CanvasSettings) -> Self {
        Self {
            max_click_drift: settings.max_click_drift,
            buffer_time_ms: settings.buffer_time_ms as f64,
            double_click_time_ms: settings.double_click_time_ms as f64,
            double_click_drift: settings.double_click_drift,
        }
    }
}

/// Lifecycle of one pointer
#[derive(Debug, Clone, Default)]
pub struct PointerSession {
    /// Thresholds in use
    pub thresholds: PointerThresholds,
    is_down: bool,
    is_double: bool,
    drag_started: bool,
    moved: bool,
    down: Option<PointerEvent>,
    current: Option<PointerEvent>,
    last_click: Option<PointerEvent>,
}

impl PointerSession {
    /// Create a session with custom thresholds
    pub fn new(thresholds: PointerThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Record a press. Returns `true` if it starts a double click.
    ///
    /// Only a click of the same button can pair with this press.
    pub fn down(&mut self, event: PointerEvent) -> bool {
        self.is_down = true;
        self.drag_started = false;
        self.moved = false;
        self.is_double = self.last_click.is_some_and(|last| {
            last.button == event.button
                && event.time_ms - last.time_ms <= self.thresholds.double_click_time_ms
                && distance(event.pos, last.pos) <= self.thresholds.double_click_drift
        });
        self.down = Some(event);
        self.current = Some(event);
        self.is_double
    }

    /// Record a move. `wants_drag` says whether the current gesture handles drags.
    pub fn pointer_move(&mut self, event: PointerEvent, wants_drag: bool) -> PointerTransition {
        self.current = Some(event);
        if !self.is_down {
            return PointerTransition::None;
        }
        if self.drag_started {
            return PointerTransition::Drag;
        }
        let Some(down) = self.down else {
            return PointerTransition::None;
        };
        let drifted = distance(event.pos, down.pos) > self.thresholds.max_click_drift;
        let held =
            event.time_ms - down.time_ms > self.thresholds.buffer_time_ms && event.pos != down.pos;
        if !(drifted || held) {
            return PointerTransition::None;
        }
        self.moved = true;
        if wants_drag {
            self.drag_started = true;
            PointerTransition::DragStart
        } else {
            PointerTransition::None
        }
    }

    /// Record a release and classify the finished cycle.
    ///
    /// Releasing a button other than the one that started the cycle is
    /// ignored and leaves the cycle running.
    pub fn up(&mut self, event: PointerEvent) -> PointerRelease {
        self.current = Some(event);
        if !self.is_held(event.button) {
            return PointerRelease::None;
        }
        let result = if self.drag_started {
            PointerRelease::DragEnd
        } else if self.moved
            || self
                .down
                .is_some_and(|down| distance(event.pos, down.pos) > self.thresholds.max_click_drift)
        {
            PointerRelease::None
        } else if self.is_double {
            self.last_click = None;
            PointerRelease::DoubleClick
        } else {
            self.last_click = Some(event);
            PointerRelease::Click
        };
        if !result.is_click() {
            self.last_click = None;
        }
        self.end_cycle();
        result
    }

    /// Abort the current cycle. Returns `true` if one was active.
    pub fn cancel(&mut self) -> bool {
        let active = self.is_down;
        self.end_cycle();
        active
    }

    /// Forget everything, including the last click
    pub fn reset(&mut self) {
        self.end_cycle();
        self.last_click = None;
        self.current = None;
    }

    fn end_cycle(&mut self) {
        self.is_down = false;
        self.is_double = false;
        self.drag_started = false;
        self.moved = false;
        self.down = None;
    }

    /// A button is held
    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// `button` is the one that started the current cycle
    pub fn is_held(&self, button: PointerButton) -> bool {
        self.is_down && self.down.is_some_and(|down| down.button == button)
    }

    /// The current press started as a double click
    pub fn is_double(&self) -> bool {
        self.is_double
    }

    /// The current press has become a drag
    pub fn drag_started(&self) -> bool {
        self.drag_started
    }

    /// The press event of the current cycle
    pub fn down_event(&self) -> Option<PointerEvent> {
        self.down
    }

    /// The latest event seen
    pub fn current(&self) -> Option<PointerEvent> {
        self.current
    }
}
