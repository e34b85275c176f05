// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-node controls drawn below the slots.

use crate::model::slot::SlotType;
use serde::{Deserialize, Serialize};

/// Kind of control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidgetKind {
    /// On/off switch
    Toggle,
    /// Numeric value with arrows and drag adjustment
    Number {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Increment per click
        step: f64,
    },
    /// Cycles through fixed options
    Combo {
        /// Option labels
        options: Vec<String>,
    },
    /// Momentary button
    Button,
    /// Free text, edited by the host
    Text,
}

/// Value held by a widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidgetValue {
    /// Toggle state
    Bool(bool),
    /// Number value or combo index
    Number(f64),
    /// Text value
    Text(String),
    /// Buttons hold nothing
    None,
}

/// A control on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    /// Label
    pub name: String,
    /// Control kind
    pub kind: WidgetKind,
    /// Current value
    pub value: WidgetValue,
    /// Link type this widget accepts when a connection is dropped on it
    pub link_type: Option<SlotType>,
    /// Disabled widgets ignore input
    pub disabled: bool,
}

impl Widget {
    /// Create a toggle
    pub fn toggle(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, WidgetKind::Toggle, WidgetValue::Bool(value))
    }

    /// Create a number field
    pub fn number(name: impl Into<String>, value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::new(name, WidgetKind::Number { min, max, step }, WidgetValue::Number(value))
    }

    /// Create a combo box
    pub fn combo(name: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(name, WidgetKind::Combo { options }, WidgetValue::Number(0.0))
    }

    /// Create a button
    pub fn button(name: impl Into<String>) -> Self {
        Self::new(name, WidgetKind::Button, WidgetValue::None)
    }

    /// Create a text field
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, WidgetKind::Text, WidgetValue::Text(value.into()))
    }

    fn new(name: impl Into<String>, kind: WidgetKind, value: WidgetValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            link_type: None,
            disabled: false,
        }
    }

    /// Accept dropped links of this type
    pub fn accepting_links(mut self, slot_type: impl Into<SlotType>) -> Self {
        self.link_type = Some(slot_type.into());
        self
    }

    /// Whether a link of `slot_type` may be dropped here
    pub fn accepts_link(&self, slot_type: &SlotType) -> bool {
        self.link_type
            .as_ref()
            .is_some_and(|accepted| slot_type.can_connect_to(accepted))
    }

    /// Apply a click at horizontal fraction `fraction` (0 = left edge) of the widget.
    ///
    /// Returns `true` when the value changed.
    pub fn click(&mut self, fraction: f32) -> bool {
        if self.disabled {
            return false;
        }
        match (&self.kind, &mut self.value) {
            (WidgetKind::Toggle, WidgetValue::Bool(on)) => {
                *on = !*on;
                true
            }
            (WidgetKind::Number { min, max, step }, WidgetValue::Number(value)) => {
                let delta = if fraction < 0.3 {
                    -step
                } else if fraction > 0.7 {
                    *step
                } else {
                    return false;
                };
                let next = (*value + delta).clamp(*min, *max);
                let changed = next != *value;
                *value = next;
                changed
            }
            (WidgetKind::Combo { options }, WidgetValue::Number(index)) if !options.is_empty() => {
                let len = options.len() as i64;
                let step = if fraction < 0.3 { -1 } else { 1 };
                *index = ((*index as i64 + step).rem_euclid(len)) as f64;
                true
            }
            _ => false,
        }
    }

    /// Apply a horizontal drag of `dx` graph units. Only number widgets react.
    pub fn drag(&mut self, dx: f32) -> bool {
        if self.disabled {
            return false;
        }
        match (&self.kind, &mut self.value) {
            (WidgetKind::Number { min, max, step }, WidgetValue::Number(value)) => {
                let next = (*value + f64::from(dx) * step * 0.1).clamp(*min, *max);
                let changed = next != *value;
                *value = next;
                changed
            }
            _ => false,
        }
    }
}
