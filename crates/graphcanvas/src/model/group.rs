// SPDX-License-Identifier: MIT OR Apache-2.0
//! Titled rectangles that gather nodes.

use crate::model::{ItemId, Positionable};
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default title font size
pub const GROUP_FONT_SIZE: f32 = 24.0;
/// Smallest group size reachable by resizing
pub const GROUP_MIN_SIZE: Vec2 = Vec2::new(140.0, 80.0);
/// Side of the square resize handle in the bottom-right corner
pub const GROUP_RESIZE_HANDLE: f32 = 10.0;

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random group ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// A group of items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique group ID
    pub id: GroupId,
    /// Title drawn in the header band
    pub title: String,
    /// Top-left corner
    pub pos: [f32; 2],
    /// Full size including the header band
    pub size: [f32; 2],
    /// Header font size
    pub font_size: f32,
    /// Fill color
    pub color: Option<[u8; 3]>,
    /// Selection flag
    #[serde(default)]
    pub selected: bool,
    /// Items inside the group, recomputed before drags
    #[serde(skip)]
    pub children: Vec<ItemId>,
}

impl Group {
    /// Create a group
    pub fn new(title: impl Into<String>, pos: Pos2, size: Vec2) -> Self {
        Self {
            id: GroupId::new(),
            title: title.into(),
            pos: [pos.x, pos.y],
            size: [size.x.max(GROUP_MIN_SIZE.x), size.y.max(GROUP_MIN_SIZE.y)],
            font_size: GROUP_FONT_SIZE,
            color: None,
            selected: false,
            children: Vec::new(),
        }
    }

    /// Height of the header band
    pub fn title_height(&self) -> f32 {
        self.font_size * 1.4
    }

    /// Header band rectangle
    pub fn header_rect(&self) -> Rect {
        Rect::from_min_size(self.pos(), Vec2::new(self.size[0], self.title_height()))
    }

    /// Resize handle rectangle
    pub fn resize_handle_rect(&self) -> Rect {
        let b = self.bounding();
        Rect::from_min_max(b.max - Vec2::splat(GROUP_RESIZE_HANDLE), b.max)
    }

    /// Set the size, clamped to [`GROUP_MIN_SIZE`]
    pub fn set_size(&mut self, size: Vec2) {
        self.size = [size.x.max(GROUP_MIN_SIZE.x), size.y.max(GROUP_MIN_SIZE.y)];
    }

    /// Current size
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.size[0], self.size[1])
    }
}

impl Positionable for Group {
    fn pos(&self) -> Pos2 {
        Pos2::new(self.pos[0], self.pos[1])
    }

    fn set_pos(&mut self, pos: Pos2) {
        self.pos = [pos.x, pos.y];
    }

    fn bounding(&self) -> Rect {
        Rect::from_min_size(self.pos(), self.size())
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}
