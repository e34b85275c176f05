// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive canvas core for node graph editors.
//!
//! The crate turns raw pointer and keyboard input over a pan/zoomable surface
//! into edits of a [`Graph`] of nodes, links, reroutes and groups:
//! - Pointer sessions that tell clicks, double clicks and drags apart
//! - Link routing as splines, orthogonal or straight paths through reroutes
//! - Hit testing of slots, widgets, link strokes and group handles
//! - A gesture state machine for panning, dragging, resizing and connecting
//! - Selection with link highlighting
//!
//! ## Coordinates
//!
//! Pointer events arrive in physical pixels. The canvas divides by the
//! device pixel ratio to get canvas space, then applies the inverse view
//! transform to get graph space, where all model positions live.

pub mod canvas;
pub mod connecting;
pub mod error;
pub mod events;
pub mod geometry;
pub mod interaction;
pub mod model;
pub mod path;
pub mod pointer;
pub mod render;
pub mod routing;
pub mod selection;
pub mod settings;
pub mod transform;

pub use canvas::GraphCanvas;
pub use error::{CanvasError, Result};
pub use events::{CanvasEvent, CanvasHost, EventQueue, Propagation};
pub use hit_test::{hit_test, HitTarget, NodePart};
pub use interaction::{Gesture, HoverState};
pub use model::{Graph, Group, GroupId, ItemId, Link, LinkId, Node, NodeId, Reroute, RerouteId};
pub use pointer::{PointerEvent, PointerRelease, PointerSession};
pub use render::{compute_link_paths, Frame, FrameScheduler};
pub use routing::LinkRouter;
pub use selection::{Selection, SelectionMode};
pub use settings::{CanvasSettings, LinkRenderMode};
pub use transform::DragAndScale;
