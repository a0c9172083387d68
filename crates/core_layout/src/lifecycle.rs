//! Outward-facing notifications fired while items are reordered and dragged.
//!
//! Delegates are registered with the [`DragCoordinator`](crate::DragCoordinator)
//! and referenced from containers by [`DelegateId`], so containers never hold
//! references to their observers.

use serde::{Deserialize, Serialize};

use crate::board::{ContainerId, GridBoard};
use crate::geometry::Point;
use crate::item::ItemId;

/// Handle to a delegate registered with the drag coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegateId(pub usize);

/// Where a drag notification comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragContext {
    /// Container whose sequence held the item when the gesture started.
    pub container: ContainerId,
    pub item: ItemId,
    /// Item center in board coordinates.
    pub location: Point,
}

/// Reorder-mode notifications for a single item.
///
/// Locations are in board coordinates.
pub trait ReorderLifecycle {
    fn reorder_started(&mut self, item: ItemId);
    fn reorder_moved(&mut self, item: ItemId, location: Point);
    fn reorder_ended(&mut self, item: ItemId, location: Point);
}

/// Cross-container drag notifications.
///
/// `drag_ended` receives the board mutably: this is where a host decides
/// whether the item should be transferred to another container.
pub trait DragLifecycle {
    fn drag_started(&mut self, _board: &GridBoard, _ctx: DragContext) {}

    fn dragged(&mut self, _board: &GridBoard, _ctx: DragContext) {}

    fn drag_ended(&mut self, board: &mut GridBoard, ctx: DragContext);
}
