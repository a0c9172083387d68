//! Drag delegates installed by the host.

use reflow_grid_core::{DragContext, DragLifecycle, GridBoard, ItemId, Point, ReorderLifecycle};
use tracing::{debug, info, warn};

/// Moves an item to whichever other grid it is dropped on.
///
/// Drops outside every other grid leave the item where it was and relay out
/// the source grid.
#[derive(Debug, Default)]
pub struct TransferController;

impl TransferController {
    pub fn new() -> Self {
        Self
    }
}

impl DragLifecycle for TransferController {
    fn drag_started(&mut self, _board: &GridBoard, ctx: DragContext) {
        debug!("Drag of item {} started in grid {}", ctx.item, ctx.container);
    }

    fn drag_ended(&mut self, board: &mut GridBoard, ctx: DragContext) {
        if let Some(target) = board.container_at(ctx.location, Some(ctx.container)) {
            match board.transfer(ctx.item, ctx.container, target) {
                Ok(()) => return,
                Err(e) => warn!("Could not move item {} to grid {}: {}", ctx.item, target, e),
            }
        }

        if let Some(grid) = board.container_mut(ctx.container) {
            grid.recompute_layout();
        }
    }
}

/// Logs reorder-mode activity.
#[derive(Debug, Default)]
pub struct ReorderLog;

impl ReorderLifecycle for ReorderLog {
    fn reorder_started(&mut self, item: ItemId) {
        info!("Item {} entered reorder mode", item);
    }

    fn reorder_moved(&mut self, item: ItemId, location: Point) {
        debug!("Item {} at ({:.1}, {:.1})", item, location.x, location.y);
    }

    fn reorder_ended(&mut self, item: ItemId, location: Point) {
        info!(
            "Item {} left reorder mode at ({:.1}, {:.1})",
            item, location.x, location.y
        );
    }
}
