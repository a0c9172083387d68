//! The grid container: ordered items, per-column stacking layout, visibility
//! culling and reordering.
//!
//! Items are laid out left to right, wrapping after `cols_in_row` items. Each
//! column stacks independently: an item sits `vertical_padding` below the item
//! directly above it in the same column, so columns end at different heights.
//! The sequence index of an item is the source of truth for its slot.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::ContainerId;
use crate::geometry::{Point, Rect};
use crate::item::{Item, ItemId, ItemVisual, LiftInput, LiftState, LIFT_ANIMATION_SECS};
use crate::lifecycle::DelegateId;
use crate::position::GridPosition;
use crate::GridError;

/// Vertical padding used when none is configured.
pub const DEFAULT_VERTICAL_PADDING: f64 = 10.0;

/// Construction parameters for a [`GridContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    /// Uniform item width in pixels.
    pub item_width: f64,
    /// Gap between vertically adjacent items in a column.
    pub vertical_padding: f64,
    /// Whether dragging an item reorders the grid live.
    pub reorderable: bool,
    /// Whether drag notifications are sent to the drag delegate.
    pub draggable: bool,
}

impl GridOptions {
    /// Options with the given item width and default everything else.
    pub fn new(item_width: f64) -> Self {
        Self {
            item_width,
            vertical_padding: DEFAULT_VERTICAL_PADDING,
            reorderable: true,
            draggable: true,
        }
    }

    pub fn with_vertical_padding(mut self, vertical_padding: f64) -> Self {
        self.vertical_padding = vertical_padding;
        self
    }

    pub fn with_reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }

    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }
}

/// A render-tree operation for the host to apply.
///
/// Animations are fire-and-forget; a later operation for the same item
/// supersedes an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    /// Add the item to the render tree at `rect`.
    Attach { item: ItemId, rect: Rect },
    /// Remove the item from the render tree, releasing its resources.
    Detach { item: ItemId },
    /// Move the item's origin.
    Move {
        item: ItemId,
        origin: Point,
        animated: bool,
    },
    /// Bring the item to the front of the container's render order.
    Raise { item: ItemId },
    /// Animate the item's scale and opacity.
    SetVisual {
        item: ItemId,
        visual: ItemVisual,
        duration: f64,
    },
}

/// Computed placement for an item, as reported to hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub item: ItemId,
    /// Index in the container's sequence.
    pub index: usize,
    pub grid_position: Option<GridPosition>,
    /// Where the item is displayed, in content coordinates.
    pub rect: Option<Rect>,
    pub attached: bool,
    pub lifted: bool,
}

/// A grid region holding an ordered sequence of items.
#[derive(Debug, Clone)]
pub struct GridContainer {
    id: ContainerId,
    items: Vec<Item>,
    item_width: f64,
    vertical_padding: f64,
    cols_in_row: usize,
    horizontal_padding: f64,
    content_height: f64,
    /// Container bounds in board coordinates.
    frame: Rect,
    /// Visible region in content coordinates.
    viewport: Rect,
    reorderable: bool,
    draggable: bool,
    reorder_delegate: Option<DelegateId>,
    drag_delegate: Option<DelegateId>,
    /// Item currently following the pointer.
    tracking: Option<ItemId>,
    surface_ops: Vec<SurfaceOp>,
}

impl GridContainer {
    /// Create an empty container occupying `frame` and lay it out.
    pub fn new(id: ContainerId, frame: Rect, options: GridOptions) -> Self {
        if !(options.item_width > 0.0) {
            warn!(
                "Grid {} created with non-positive item width {}; it will have no columns",
                id, options.item_width
            );
        }

        let mut container = Self {
            id,
            items: Vec::new(),
            item_width: options.item_width,
            vertical_padding: options.vertical_padding,
            cols_in_row: 0,
            horizontal_padding: 0.0,
            content_height: 0.0,
            frame,
            viewport: Rect::new(0.0, 0.0, frame.width, frame.height),
            reorderable: options.reorderable,
            draggable: options.draggable,
            reorder_delegate: None,
            drag_delegate: None,
            tracking: None,
            surface_ops: Vec::new(),
        };
        container.recompute_layout();
        container
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(Item::id).collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of(id).is_some()
    }

    /// Sequence index of an item.
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// The item occupying a grid slot, if any.
    pub fn item_at(&self, position: GridPosition) -> Option<&Item> {
        if position.col >= self.cols_in_row {
            return None;
        }
        self.items.get(position.to_index(self.cols_in_row))
    }

    pub fn item_width(&self) -> f64 {
        self.item_width
    }

    pub fn vertical_padding(&self) -> f64 {
        self.vertical_padding
    }

    pub fn cols_in_row(&self) -> usize {
        self.cols_in_row
    }

    /// Horizontal gap between columns. Zero with fewer than two columns.
    pub fn horizontal_padding(&self) -> f64 {
        self.horizontal_padding
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    /// True when the container is too narrow for a single column.
    pub fn is_degraded(&self) -> bool {
        self.cols_in_row == 0
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn reorderable(&self) -> bool {
        self.reorderable
    }

    pub fn set_reorderable(&mut self, reorderable: bool) {
        self.reorderable = reorderable;
    }

    pub fn draggable(&self) -> bool {
        self.draggable
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    pub fn reorder_delegate(&self) -> Option<DelegateId> {
        self.reorder_delegate
    }

    pub fn set_reorder_delegate(&mut self, delegate: Option<DelegateId>) {
        self.reorder_delegate = delegate;
    }

    pub fn drag_delegate(&self) -> Option<DelegateId> {
        self.drag_delegate
    }

    pub fn set_drag_delegate(&mut self, delegate: Option<DelegateId>) {
        self.drag_delegate = delegate;
    }

    /// The drag delegate, if one is set and the container is draggable.
    pub fn active_drag_delegate(&self) -> Option<DelegateId> {
        self.drag_delegate.filter(|_| self.draggable)
    }

    /// Item currently following the pointer, if any.
    pub fn tracking(&self) -> Option<ItemId> {
        self.tracking
    }

    /// Convert a board-coordinate point to content coordinates.
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(
            point.x - self.frame.x + self.viewport.x,
            point.y - self.frame.y + self.viewport.y,
        )
    }

    /// Convert a content-coordinate point to board coordinates.
    pub fn to_board(&self, point: Point) -> Point {
        Point::new(
            point.x - self.viewport.x + self.frame.x,
            point.y - self.viewport.y + self.frame.y,
        )
    }

    /// Take the render operations emitted since the last call.
    pub fn take_surface_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.surface_ops)
    }

    /// Placements of all items in sequence order.
    pub fn placements(&self) -> Vec<ItemPlacement> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemPlacement {
                item: item.id(),
                index,
                grid_position: item.grid_position(),
                rect: item.display_rect(),
                attached: item.is_attached(),
                lifted: item.is_lifted(),
            })
            .collect()
    }

    /// Check that every item's slot maps back to its sequence index.
    pub fn positions_consistent(&self) -> bool {
        self.items.iter().enumerate().all(|(index, item)| {
            item.grid_position()
                .is_some_and(|pos| pos.col < self.cols_in_row && pos.to_index(self.cols_in_row) == index)
        })
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Recompute columns, padding, every item's slot and pixel frame, and the
    /// content height, then sync visibility.
    pub fn recompute_layout(&mut self) {
        let width = self.frame.width;
        self.cols_in_row = if self.item_width > 0.0 && width >= self.item_width {
            (width / self.item_width).floor() as usize
        } else {
            0
        };
        self.horizontal_padding = if self.cols_in_row > 1 {
            let cols = self.cols_in_row as f64;
            (width - cols * self.item_width) / (cols - 1.0)
        } else {
            0.0
        };
        self.content_height = self.viewport.bottom();

        if self.cols_in_row == 0 {
            if !self.items.is_empty() {
                warn!(
                    "Grid {} is narrower ({}) than one item ({}); {} items left unplaced",
                    self.id,
                    width,
                    self.item_width,
                    self.items.len()
                );
            }
            for item in &mut self.items {
                if item.render_parent == Some(self.id) {
                    self.surface_ops.push(SurfaceOp::Detach { item: item.id() });
                    item.render_parent = None;
                }
                item.grid_position = None;
                item.frame = None;
            }
            return;
        }

        let cols = self.cols_in_row;
        let stride = self.item_width + self.horizontal_padding;

        for index in 0..self.items.len() {
            let col = index % cols;
            let row = index / cols;
            let position = GridPosition::new(col, row);

            // Each column stacks on the item directly above it.
            let y = match position.up() {
                Some(up) => self.items[up.to_index(cols)]
                    .frame
                    .map_or(0.0, |above| above.bottom() + self.vertical_padding),
                None => 0.0,
            };
            let x = col as f64 * stride;

            let item = &mut self.items[index];
            let rect = Rect::new(x, y, item.width(), item.height());
            let previous = item.frame.replace(rect);
            item.grid_position = Some(position);
            item.owner = Some(self.id);

            self.content_height = self.content_height.max(rect.bottom() + self.vertical_padding);

            let attached_here = item.render_parent == Some(self.id);
            let following_pointer = self.tracking == Some(item.id());
            if attached_here && !following_pointer && previous != Some(rect) {
                self.surface_ops.push(SurfaceOp::Move {
                    item: item.id(),
                    origin: rect.origin(),
                    animated: previous.is_some(),
                });
            }
        }

        debug!(
            "Grid {} laid out {} items in {} columns (padding {:.1}), content height {:.1}",
            self.id,
            self.items.len(),
            cols,
            self.horizontal_padding,
            self.content_height
        );

        self.sync_visibility();
    }

    /// Attach items that intersect the viewport and detach those that don't.
    ///
    /// Attachment never affects the sequence or grid positions.
    pub fn sync_visibility(&mut self) {
        for item in &mut self.items {
            // Not yet eligible for display.
            let Some(rect) = item.display_rect() else {
                continue;
            };
            if let Some(parent) = item.render_parent {
                if parent != self.id {
                    warn!(
                        "Item {} in grid {} is attached to grid {}; skipping",
                        item.id(),
                        self.id,
                        parent
                    );
                    continue;
                }
            }
            // The dragged item stays on screen wherever the pointer takes it.
            if self.tracking == Some(item.id()) {
                continue;
            }

            let visible = rect.intersects(&self.viewport);
            match (visible, item.render_parent.is_some()) {
                (true, false) => {
                    item.render_parent = Some(self.id);
                    self.surface_ops.push(SurfaceOp::Attach {
                        item: item.id(),
                        rect,
                    });
                }
                (false, true) => {
                    item.render_parent = None;
                    self.surface_ops.push(SurfaceOp::Detach { item: item.id() });
                }
                _ => {}
            }
        }
    }

    /// Change the container bounds and relay out.
    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.viewport.width = frame.width;
        self.viewport.height = frame.height;
        self.recompute_layout();
        self.clamp_scroll();
    }

    /// Scroll so the top of the viewport is at `offset`, clamped to the content.
    pub fn scroll_to(&mut self, offset: f64) {
        self.viewport.y = offset;
        self.clamp_scroll();
        self.sync_visibility();
    }

    /// Scroll the viewport by a pixel delta.
    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.viewport.y + delta);
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = (self.content_height - self.frame.height).max(0.0);
        self.viewport.y = self.viewport.y.clamp(0.0, max_scroll);
    }

    // ------------------------------------------------------------------
    // Adding, removing and reordering
    // ------------------------------------------------------------------

    /// Append an item and relay out. Returns its assigned slot.
    pub fn append(&mut self, item: Item) -> Result<Option<GridPosition>, GridError> {
        let index = self.items.len();
        self.add_at_index(item, index)
    }

    /// Insert a new item at a grid slot; slots past the end append.
    pub fn add_at(
        &mut self,
        item: Item,
        position: GridPosition,
    ) -> Result<Option<GridPosition>, GridError> {
        let index = if self.cols_in_row == 0 {
            self.items.len()
        } else {
            position.to_index(self.cols_in_row).min(self.items.len())
        };
        self.add_at_index(item, index)
    }

    fn add_at_index(
        &mut self,
        mut item: Item,
        index: usize,
    ) -> Result<Option<GridPosition>, GridError> {
        let id = item.id();
        if self.contains(id) {
            return Err(GridError::DuplicateItem(id));
        }

        item.reset_placement();
        item.owner = Some(self.id);
        self.items.insert(index, item);
        self.recompute_layout();

        Ok(self.items[index].grid_position())
    }

    /// Move an item already in the grid to a new sequence index.
    ///
    /// This is the only reordering primitive. Indices past the end are clamped.
    /// Returns true if the order changed.
    pub fn insert(&mut self, id: ItemId, at: usize) -> bool {
        let Some(current) = self.index_of(id) else {
            warn!("Cannot reorder item {}: not in grid {}", id, self.id);
            return false;
        };
        if self.items[current].grid_position.is_none() {
            warn!("Cannot reorder item {}: it has no grid position", id);
            return false;
        }

        let at = at.min(self.items.len() - 1);
        if at == current {
            return false;
        }

        let item = self.items.remove(current);
        self.items.insert(at, item);
        debug!("Grid {}: moved item {} from {} to {}", self.id, id, current, at);
        self.recompute_layout();
        true
    }

    /// Remove the item at a grid slot. Out-of-range slots are a logged no-op.
    pub fn remove_at(&mut self, position: GridPosition) -> Option<Item> {
        if self.cols_in_row == 0 {
            warn!("Cannot remove at {} from grid {}: no columns", position, self.id);
            return None;
        }
        let index = position.to_index(self.cols_in_row);
        if position.col >= self.cols_in_row || index >= self.items.len() {
            warn!("No item at {} in grid {}", position, self.id);
            return None;
        }

        let mut item = self.items.remove(index);
        if item.render_parent == Some(self.id) {
            self.surface_ops.push(SurfaceOp::Detach { item: item.id() });
        }
        if self.tracking == Some(item.id()) {
            self.tracking = None;
        }
        item.reset_placement();

        debug!("Grid {}: removed item {} at {}", self.id, item.id(), position);
        self.recompute_layout();
        Some(item)
    }

    /// Remove an item by id, resolving its slot first.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, GridError> {
        let Some(position) = self.item(id).and_then(Item::grid_position) else {
            warn!("Item {} is not in grid {}", id, self.id);
            return Err(GridError::ItemNotInGrid(id));
        };
        self.remove_at(position).ok_or(GridError::ItemNotInGrid(id))
    }

    // ------------------------------------------------------------------
    // Reorder support
    // ------------------------------------------------------------------

    /// Apply a lift transition to an item and emit the matching visuals.
    ///
    /// Returns the new state, or `None` if the item isn't in this grid.
    pub fn set_lift(&mut self, id: ItemId, input: LiftInput) -> Option<LiftState> {
        let index = self.index_of(id)?;
        let item = &mut self.items[index];
        if item.apply_lift(input) {
            let state = item.lift_state();
            if state.is_lifted() {
                self.surface_ops.push(SurfaceOp::Raise { item: id });
            }
            self.surface_ops.push(SurfaceOp::SetVisual {
                item: id,
                visual: state.visual(),
                duration: LIFT_ANIMATION_SECS,
            });
        }
        Some(self.items[index].lift_state())
    }

    /// Start having `id` follow the pointer instead of its slot.
    pub fn begin_tracking(&mut self, id: ItemId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.tracking = Some(id);
        true
    }

    /// Center the tracked item on `location` (content coordinates), unanimated.
    pub fn track_pointer(&mut self, id: ItemId, location: Point) {
        if self.tracking != Some(id) {
            return;
        }
        let Some(index) = self.index_of(id) else {
            return;
        };
        let item = &mut self.items[index];
        let origin = Rect::centered_at(location, item.width(), item.height()).origin();
        item.floating_origin = Some(origin);
        if item.render_parent == Some(self.id) {
            self.surface_ops.push(SurfaceOp::Move {
                item: id,
                origin,
                animated: false,
            });
        }
    }

    /// Stop tracking and animate the item back to its slot.
    pub fn end_tracking(&mut self, id: ItemId) {
        if self.tracking == Some(id) {
            self.tracking = None;
        }
        let Some(index) = self.index_of(id) else {
            return;
        };
        let item = &mut self.items[index];
        if item.floating_origin.take().is_none() {
            return;
        }
        if let (Some(frame), Some(parent)) = (item.frame, item.render_parent) {
            if parent == self.id {
                self.surface_ops.push(SurfaceOp::Move {
                    item: id,
                    origin: frame.origin(),
                    animated: true,
                });
            }
        }
        self.sync_visibility();
    }

    /// Find the sequence index whose slot contains `location`, ignoring `id`.
    ///
    /// Only the column under the pointer is scanned, row by row.
    pub fn reorder_target(&self, id: ItemId, location: Point) -> Option<usize> {
        let cols = self.cols_in_row;
        if cols == 0 {
            return None;
        }

        let stride = self.item_width + self.horizontal_padding;
        let col = if location.x <= 0.0 {
            0
        } else {
            ((location.x / stride).floor() as usize).min(cols - 1)
        };
        let rows = self.items.len().div_ceil(cols);

        (0..rows)
            .map(|row| GridPosition::new(col, row).to_index(cols))
            .take_while(|&index| index < self.items.len())
            .find(|&index| {
                let other = &self.items[index];
                other.id() != id && other.frame.is_some_and(|frame| frame.contains(location))
            })
    }

    /// Live reorder preview: move `id` into the slot under `location`.
    ///
    /// Does nothing unless the grid is reorderable. Returns true if the order
    /// changed.
    pub fn live_reorder(&mut self, id: ItemId, location: Point) -> bool {
        if !self.reorderable {
            return false;
        }
        match self.reorder_target(id, location) {
            Some(target) => self.insert(id, target),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemFactory, ItemStyle};

    fn grid(width: f64, item_width: f64, vertical_padding: f64) -> GridContainer {
        GridContainer::new(
            ContainerId(0),
            Rect::new(0.0, 0.0, width, 600.0),
            GridOptions::new(item_width).with_vertical_padding(vertical_padding),
        )
    }

    fn fill(grid: &mut GridContainer, factory: &mut ItemFactory, heights: &[f64]) -> Vec<ItemId> {
        heights
            .iter()
            .map(|&h| {
                let item = factory.create(h);
                let id = item.id();
                grid.append(item).unwrap();
                id
            })
            .collect()
    }

    fn factory() -> ItemFactory {
        ItemFactory::new(180.0, ItemStyle::default())
    }

    #[test]
    fn test_columns_and_padding() {
        let g = grid(400.0, 180.0, 20.0);
        assert_eq!(g.cols_in_row(), 2);
        assert_eq!(g.horizontal_padding(), 40.0);

        let g = grid(1000.0, 180.0, 20.0);
        assert_eq!(g.cols_in_row(), 5);
        assert_eq!(g.horizontal_padding(), 25.0);
    }

    #[test]
    fn test_single_column_has_zero_padding() {
        let g = grid(250.0, 180.0, 20.0);
        assert_eq!(g.cols_in_row(), 1);
        assert_eq!(g.horizontal_padding(), 0.0);
    }

    #[test]
    fn test_three_item_scenario() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        let item0 = g.item(ids[0]).unwrap();
        let item1 = g.item(ids[1]).unwrap();
        let item2 = g.item(ids[2]).unwrap();

        assert_eq!(item0.grid_position(), Some(GridPosition::new(0, 0)));
        assert_eq!(item1.grid_position(), Some(GridPosition::new(1, 0)));
        assert_eq!(item2.grid_position(), Some(GridPosition::new(0, 1)));

        assert_eq!(item0.frame().unwrap().origin(), Point::new(0.0, 0.0));
        assert_eq!(item1.frame().unwrap().origin(), Point::new(220.0, 0.0));
        assert_eq!(item2.frame().unwrap().origin(), Point::new(0.0, 120.0));

        assert!(g.content_height() >= 260.0);
        assert!(g.positions_consistent());
    }

    #[test]
    fn test_columns_stack_independently() {
        let mut g = grid(400.0, 180.0, 10.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 200.0, 50.0, 50.0]);

        let left = g.item(ids[2]).unwrap().frame().unwrap();
        let right = g.item(ids[3]).unwrap().frame().unwrap();

        // Same row, different columns, different heights above.
        assert_eq!(left.y, 110.0);
        assert_eq!(right.y, 210.0);
        assert_eq!(g.item(ids[2]).unwrap().grid_position().unwrap().row, 1);
        assert_eq!(g.item(ids[3]).unwrap().grid_position().unwrap().row, 1);
    }

    #[test]
    fn test_positions_match_indices() {
        for width in [180.0, 400.0, 560.0, 900.0] {
            let mut g = grid(width, 180.0, 10.0);
            let mut f = factory();
            let heights: Vec<f64> = (0..17).map(|i| 100.0 + (i * 7 % 100) as f64).collect();
            fill(&mut g, &mut f, &heights);
            assert!(g.positions_consistent(), "inconsistent at width {}", width);
        }
    }

    #[test]
    fn test_content_height_covers_all_items() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[300.0, 100.0, 300.0, 100.0, 300.0]);

        for item in g.items() {
            assert!(g.content_height() >= item.frame().unwrap().bottom() + 20.0);
        }
        // Left column: 300 + 20 + 300 + 20 + 300 + 20
        assert_eq!(g.content_height(), 960.0);
    }

    #[test]
    fn test_container_narrower_than_item() {
        let mut g = grid(100.0, 180.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[100.0, 120.0]);

        assert_eq!(g.cols_in_row(), 0);
        assert!(g.is_degraded());
        assert_eq!(g.horizontal_padding(), 0.0);
        assert_eq!(g.len(), 2);
        assert!(g.items().iter().all(|item| item.grid_position().is_none()));
        assert!(g.items().iter().all(|item| !item.is_attached()));
    }

    #[test]
    fn test_degraded_grid_recovers_when_widened() {
        let mut g = grid(100.0, 180.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[100.0, 120.0, 90.0]);

        g.set_frame(Rect::new(0.0, 0.0, 400.0, 600.0));
        assert_eq!(g.cols_in_row(), 2);
        assert!(g.positions_consistent());
    }

    #[test]
    fn test_zero_item_width_degrades() {
        let mut g = grid(400.0, 0.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[100.0]);
        assert_eq!(g.cols_in_row(), 0);
    }

    #[test]
    fn test_insert_reorders() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        assert!(g.insert(ids[2], 0));
        assert_eq!(g.item_ids(), vec![ids[2], ids[0], ids[1]]);
        assert_eq!(g.index_of(ids[2]), Some(0));
        assert!(g.positions_consistent());

        // Same index again is a no-op.
        assert!(!g.insert(ids[2], 0));
        assert_eq!(g.item_ids(), vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn test_insert_clamps_past_end() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        assert!(g.insert(ids[0], 99));
        assert_eq!(g.index_of(ids[0]), Some(2));
    }

    #[test]
    fn test_insert_unknown_item_is_noop() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0]);
        assert!(!g.insert(ItemId(999), 0));
        assert_eq!(g.item_ids(), ids);
    }

    #[test]
    fn test_add_at_clamps_to_length() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0]);

        let front = f.create(80.0);
        let front_id = front.id();
        assert_eq!(
            g.add_at(front, GridPosition::new(0, 0)).unwrap(),
            Some(GridPosition::new(0, 0))
        );

        let back = f.create(80.0);
        let back_id = back.id();
        g.add_at(back, GridPosition::new(1, 40)).unwrap();

        assert_eq!(g.item_ids(), vec![front_id, ids[0], ids[1], back_id]);
        assert!(g.positions_consistent());
    }

    #[test]
    fn test_append_duplicate_rejected() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let item = f.create(100.0);
        let copy = item.clone();
        g.append(item).unwrap();
        assert!(matches!(g.append(copy), Err(GridError::DuplicateItem(_))));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_remove_at() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        let removed = g.remove_at(GridPosition::new(1, 0)).unwrap();
        assert_eq!(removed.id(), ids[1]);
        assert_eq!(removed.grid_position(), None);
        assert!(!removed.is_attached());
        assert_eq!(g.item_ids(), vec![ids[0], ids[2]]);
        assert_eq!(
            g.item(ids[2]).unwrap().grid_position(),
            Some(GridPosition::new(1, 0))
        );
        assert!(g.positions_consistent());
    }

    #[test]
    fn test_remove_at_out_of_range_is_noop() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        assert!(g.remove_at(GridPosition::new(1, 1)).is_none());
        assert!(g.remove_at(GridPosition::new(5, 0)).is_none());
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn test_remove_item() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        let removed = g.remove_item(ids[0]).unwrap();
        assert_eq!(removed.id(), ids[0]);
        assert_eq!(g.item_ids(), vec![ids[1], ids[2]]);

        let stranger = f.create(100.0);
        assert!(matches!(
            g.remove_item(stranger.id()),
            Err(GridError::ItemNotInGrid(_))
        ));
    }

    #[test]
    fn test_visibility_culling() {
        // Viewport 600 high; left column items 300 + 20 padding each.
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[300.0, 100.0, 300.0, 100.0, 300.0]);

        // Third left-column item starts at y = 640, below the viewport.
        let hidden = ids[4];
        assert!(g.item(ids[0]).unwrap().is_attached());
        assert!(!g.item(hidden).unwrap().is_attached());
        let index_before = g.index_of(hidden);
        g.take_surface_ops();

        g.scroll_to(300.0);
        let item = g.item(hidden).unwrap();
        assert!(item.is_attached());
        assert_eq!(g.index_of(hidden), index_before);

        let ops = g.take_surface_ops();
        assert!(ops.contains(&SurfaceOp::Attach {
            item: hidden,
            rect: Rect::new(0.0, 640.0, 180.0, 300.0),
        }));
        // Top-left item (0..300) has scrolled out of view (300..900).
        assert!(ops.contains(&SurfaceOp::Detach { item: ids[0] }));
        assert!(!g.item(ids[0]).unwrap().is_attached());
        assert!(g.positions_consistent());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        fill(&mut g, &mut f, &[300.0, 100.0, 300.0, 100.0, 300.0]);

        g.scroll_by(10_000.0);
        assert_eq!(g.viewport().y, g.content_height() - 600.0);
        g.scroll_by(-10_000.0);
        assert_eq!(g.viewport().y, 0.0);
    }

    #[test]
    fn test_foreign_render_parent_is_skipped() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 100.0]);

        g.items[0].render_parent = Some(ContainerId(42));
        g.take_surface_ops();
        g.scroll_to(0.0);
        g.recompute_layout();

        assert_eq!(g.items[0].render_parent, Some(ContainerId(42)));
        assert!(g
            .take_surface_ops()
            .iter()
            .all(|op| !matches!(op, SurfaceOp::Attach { item, .. } | SurfaceOp::Detach { item } if *item == ids[0])));
    }

    #[test]
    fn test_relayout_animates_attached_items() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);
        g.take_surface_ops();

        g.insert(ids[2], 0);
        let ops = g.take_surface_ops();
        assert!(ops.contains(&SurfaceOp::Move {
            item: ids[2],
            origin: Point::new(0.0, 0.0),
            animated: true,
        }));
    }

    #[test]
    fn test_lift_emits_raise_and_visual() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0]);
        g.take_surface_ops();

        assert_eq!(g.set_lift(ids[0], LiftInput::Press), Some(LiftState::Lifted));
        let ops = g.take_surface_ops();
        assert_eq!(ops[0], SurfaceOp::Raise { item: ids[0] });
        assert!(matches!(ops[1], SurfaceOp::SetVisual { visual, .. } if visual == ItemVisual::LIFTED));

        // Already lifted: nothing new to draw.
        g.set_lift(ids[0], LiftInput::Press);
        assert!(g.take_surface_ops().is_empty());

        assert_eq!(g.set_lift(ItemId(77), LiftInput::Press), None);
    }

    #[test]
    fn test_reorder_target_finds_slot_under_pointer() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        // Inside item 0's rect (0..180, 0..100).
        assert_eq!(g.reorder_target(ids[2], Point::new(90.0, 50.0)), Some(0));
        // The dragged item's own slot never matches.
        assert_eq!(g.reorder_target(ids[0], Point::new(90.0, 50.0)), None);
        // In the padding gap between rows.
        assert_eq!(g.reorder_target(ids[2], Point::new(90.0, 110.0)), None);
        // Right column, clamped past the right edge.
        assert_eq!(g.reorder_target(ids[0], Point::new(390.0, 10.0)), Some(1));
    }

    #[test]
    fn test_live_reorder_respects_flag() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0, 120.0]);

        g.set_reorderable(false);
        assert!(!g.live_reorder(ids[2], Point::new(90.0, 50.0)));

        g.set_reorderable(true);
        assert!(g.live_reorder(ids[2], Point::new(90.0, 50.0)));
        assert_eq!(g.item_ids(), vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn test_tracking_follows_pointer_and_snaps_back() {
        let mut g = grid(400.0, 180.0, 20.0);
        let mut f = factory();
        let ids = fill(&mut g, &mut f, &[100.0, 150.0]);
        g.take_surface_ops();

        assert!(g.begin_tracking(ids[0]));
        g.track_pointer(ids[0], Point::new(300.0, 300.0));
        assert_eq!(
            g.item(ids[0]).unwrap().display_rect(),
            Some(Rect::new(210.0, 250.0, 180.0, 100.0))
        );
        assert_eq!(
            g.take_surface_ops(),
            vec![SurfaceOp::Move {
                item: ids[0],
                origin: Point::new(210.0, 250.0),
                animated: false,
            }]
        );

        g.end_tracking(ids[0]);
        assert_eq!(g.tracking(), None);
        assert_eq!(
            g.item(ids[0]).unwrap().display_rect(),
            Some(Rect::new(0.0, 0.0, 180.0, 100.0))
        );
    }

    #[test]
    fn test_coordinate_conversion() {
        let mut g = GridContainer::new(
            ContainerId(3),
            Rect::new(100.0, 50.0, 400.0, 300.0),
            GridOptions::new(180.0),
        );
        let mut f = factory();
        fill(&mut g, &mut f, &[500.0, 500.0]);
        g.scroll_to(40.0);

        let local = g.to_local(Point::new(150.0, 60.0));
        assert_eq!(local, Point::new(50.0, 50.0));
        assert_eq!(g.to_board(local), Point::new(150.0, 60.0));
    }

    #[test]
    fn test_default_options() {
        let options = GridOptions::new(180.0);
        assert_eq!(options.vertical_padding, 10.0);
        assert!(options.reorderable);
        assert!(options.draggable);
    }
}
