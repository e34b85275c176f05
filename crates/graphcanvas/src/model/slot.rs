// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::geometry::LinkDirection;
use crate::model::link::LinkId;
use serde::{Deserialize, Serialize};

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Input slot (left side by default)
    Input,
    /// Output slot (right side by default)
    Output,
}

impl SlotKind {
    /// The kind a link must land on when dragged from this kind
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Type tag carried by a slot.
///
/// A tag is a comma separated list of type names. The empty tag and `*` are
/// wildcards; `event` marks execution-flow slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SlotType(pub String);

impl SlotType {
    /// Wildcard type
    pub const WILDCARD: &'static str = "*";
    /// Execution-flow type
    pub const EVENT: &'static str = "event";

    /// Create a type tag
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wildcard tag
    pub fn any() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    /// The event tag
    pub fn event() -> Self {
        Self(Self::EVENT.to_string())
    }

    /// Whether this tag accepts anything
    pub fn is_wildcard(&self) -> bool {
        let name = self.0.trim();
        name.is_empty() || name == Self::WILDCARD
    }

    /// Whether this is an execution-flow slot
    pub fn is_event(&self) -> bool {
        self.0.trim().eq_ignore_ascii_case(Self::EVENT)
    }

    /// Individual names in the tag, lower-cased
    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.0
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Check if a link of this type can land on `other`
    pub fn can_connect_to(&self, other: &SlotType) -> bool {
        if self.is_wildcard() || other.is_wildcard() {
            return true;
        }
        let theirs: Vec<String> = other.names().collect();
        self.names().any(|name| theirs.contains(&name))
    }
}

impl From<&str> for SlotType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Glyph drawn for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotShape {
    /// Square glyph
    Box,
    /// Circle glyph
    #[default]
    Round,
    /// Triangle pointing along the link direction
    Arrow,
}

/// A slot on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Slot name
    pub name: String,
    /// Data type
    pub slot_type: SlotType,
    /// Slot direction
    pub kind: SlotKind,
    /// Link into this input (inputs only)
    pub link: Option<LinkId>,
    /// Links out of this output (outputs only)
    pub links: Vec<LinkId>,
    /// Direction hint overriding the side default
    pub dir: Option<LinkDirection>,
    /// Glyph shape
    pub shape: SlotShape,
}

impl Slot {
    /// Create a new input slot
    pub fn input(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            kind: SlotKind::Input,
            link: None,
            links: Vec::new(),
            dir: None,
            shape: SlotShape::default(),
        }
    }

    /// Create a new output slot
    pub fn output(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            kind: SlotKind::Output,
            ..Self::input(name, slot_type)
        }
    }

    /// Set the direction hint
    pub fn with_dir(mut self, dir: LinkDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Set the glyph shape
    pub fn with_shape(mut self, shape: SlotShape) -> Self {
        self.shape = shape;
        self
    }

    /// Direction hint, falling back to the side the slot sits on
    pub fn direction(&self) -> LinkDirection {
        self.dir.unwrap_or(match self.kind {
            SlotKind::Input => LinkDirection::Left,
            SlotKind::Output => LinkDirection::Right,
        })
    }

    /// Whether at least one link is attached
    pub fn is_connected(&self) -> bool {
        self.link.is_some() || !self.links.is_empty()
    }

    /// Check if a link between this slot and `other` is valid
    pub fn can_connect(&self, other: &Slot) -> bool {
        if self.kind == other.kind {
            return false;
        }
        self.slot_type.can_connect_to(&other.slot_type)
    }
}
