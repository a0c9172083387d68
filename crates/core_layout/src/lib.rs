//! Reflow Grid Core
//!
//! Platform-agnostic layout engine for reorderable, ragged item grids.
//!
//! This crate implements:
//! - Per-column stacking layout: items flow left to right into a fixed number
//!   of columns, and each column stacks independently (Pinterest-style)
//! - Visibility culling against a scrolling viewport
//! - Live drag-to-reorder driven by an abstract pointer-gesture stream
//! - Transfer of items between independent grids sharing one board
//!
//! Rendering is left to the host: containers emit [`SurfaceOp`]s describing
//! attach/detach/move/visual changes, which the host drains and applies.

mod board;
mod container;
mod drag;
mod geometry;
mod item;
mod lifecycle;
mod position;

use thiserror::Error;

pub use board::{ContainerId, GridBoard};
pub use container::{GridContainer, GridOptions, ItemPlacement, SurfaceOp, DEFAULT_VERTICAL_PADDING};
pub use drag::{DragCoordinator, DragOutcome, DragState, GestureEvent, GesturePhase};
pub use geometry::{Point, Rect};
pub use item::{
    Item, ItemFactory, ItemId, ItemStyle, ItemVisual, LiftInput, LiftState, LIFTED_ALPHA,
    LIFTED_SCALE, LIFT_ANIMATION_SECS,
};
pub use lifecycle::{DelegateId, DragContext, DragLifecycle, ReorderLifecycle};
pub use position::GridPosition;

/// Errors that can occur during grid operations.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Item {0} is not in the grid")]
    ItemNotInGrid(ItemId),

    #[error("Item {0} is already in the grid")]
    DuplicateItem(ItemId),

    #[error("Grid {0} not found")]
    ContainerNotFound(ContainerId),
}
