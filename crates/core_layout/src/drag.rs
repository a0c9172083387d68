//! Drag coordinator: turns a pointer-gesture stream into lift, live reorder
//! and cross-container drag notifications.
//!
//! States: `Idle -> Lifted -> Dragging -> (Committed | Cancelled) -> Idle`.
//! Only one item can be lifted at a time; events for other items are ignored
//! until the current gesture finishes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{ContainerId, GridBoard};
use crate::geometry::Point;
use crate::item::{ItemId, LiftInput};
use crate::lifecycle::{DelegateId, DragContext, DragLifecycle, ReorderLifecycle};

/// Kind of pointer gesture delivered for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    LongPress,
    Tap,
    DragBegan,
    DragMoved,
    DragEnded,
    DragCancelled,
}

/// A pointer gesture targeting one item. `location` is in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub item: ItemId,
    pub phase: GesturePhase,
    pub location: Point,
}

impl GestureEvent {
    pub fn new(item: ItemId, phase: GesturePhase, location: Point) -> Self {
        Self {
            item,
            phase,
            location,
        }
    }
}

/// Current state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Lifted {
        container: ContainerId,
        item: ItemId,
    },
    Dragging {
        container: ContainerId,
        item: ItemId,
    },
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragOutcome {
    /// The event didn't apply in the current state.
    Ignored,
    /// The item entered reorder mode.
    Lifted,
    /// A second tap left reorder mode without moving anything.
    Lowered,
    DragStarted,
    /// The item followed the pointer; `reordered` if the sequence changed.
    Moved { reordered: bool },
    Committed,
    Cancelled,
}

/// Drives lift state, live reordering and drag delegates from gestures.
#[derive(Default)]
pub struct DragCoordinator {
    state: DragState,
    reorder_delegates: Vec<Box<dyn ReorderLifecycle>>,
    drag_delegates: Vec<Box<dyn DragLifecycle>>,
}

impl fmt::Debug for DragCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragCoordinator")
            .field("state", &self.state)
            .field("reorder_delegates", &self.reorder_delegates.len())
            .field("drag_delegates", &self.drag_delegates.len())
            .finish()
    }
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Register a reorder observer. Attach it to containers with
    /// [`GridContainer::set_reorder_delegate`](crate::GridContainer::set_reorder_delegate).
    pub fn add_reorder_delegate(&mut self, delegate: Box<dyn ReorderLifecycle>) -> DelegateId {
        self.reorder_delegates.push(delegate);
        DelegateId(self.reorder_delegates.len() - 1)
    }

    /// Register a drag delegate. Attach it to containers with
    /// [`GridContainer::set_drag_delegate`](crate::GridContainer::set_drag_delegate).
    pub fn add_drag_delegate(&mut self, delegate: Box<dyn DragLifecycle>) -> DelegateId {
        self.drag_delegates.push(delegate);
        DelegateId(self.drag_delegates.len() - 1)
    }

    /// Process one gesture event synchronously.
    pub fn handle(&mut self, board: &mut GridBoard, event: GestureEvent) -> DragOutcome {
        if let Some((container, item)) = self.active() {
            if !board.container(container).is_some_and(|c| c.contains(item)) {
                warn!(
                    "Item {} left grid {} mid-gesture; cancelling",
                    item, container
                );
                self.state = DragState::Idle;
                if event.item == item {
                    return DragOutcome::Cancelled;
                }
            } else if event.item != item {
                debug!("Ignoring {:?} for item {} while {} is active", event.phase, event.item, item);
                return DragOutcome::Ignored;
            }
        }

        match (self.state, event.phase) {
            (DragState::Idle, GesturePhase::LongPress | GesturePhase::Tap) => {
                self.lift(board, event.item)
            }
            (DragState::Lifted { container, item }, GesturePhase::Tap) => {
                self.finish(board, container, item, event.location, false);
                DragOutcome::Lowered
            }
            (DragState::Lifted { container, item }, GesturePhase::DragBegan) => {
                if let Some(grid) = board.container_mut(container) {
                    grid.begin_tracking(item);
                }
                self.state = DragState::Dragging { container, item };
                debug!("Item {} dragging in grid {}", item, container);
                DragOutcome::DragStarted
            }
            (DragState::Lifted { container, item }, GesturePhase::DragCancelled) => {
                self.finish(board, container, item, event.location, false);
                DragOutcome::Cancelled
            }
            (DragState::Dragging { container, item }, GesturePhase::DragMoved) => {
                self.drag_moved(board, container, item, event.location)
            }
            (DragState::Dragging { container, item }, GesturePhase::DragEnded) => {
                self.drag_moved(board, container, item, event.location);
                self.finish(board, container, item, event.location, true);
                DragOutcome::Committed
            }
            (DragState::Dragging { container, item }, GesturePhase::DragCancelled) => {
                self.finish(board, container, item, event.location, false);
                DragOutcome::Cancelled
            }
            (state, phase) => {
                debug!("Ignoring {:?} in state {:?}", phase, state);
                DragOutcome::Ignored
            }
        }
    }

    fn active(&self) -> Option<(ContainerId, ItemId)> {
        match self.state {
            DragState::Idle => None,
            DragState::Lifted { container, item } | DragState::Dragging { container, item } => {
                Some((container, item))
            }
        }
    }

    fn lift(&mut self, board: &mut GridBoard, item: ItemId) -> DragOutcome {
        let Some(container) = board.locate(item) else {
            warn!("Gesture for item {} which is in no grid", item);
            return DragOutcome::Ignored;
        };
        let Some(grid) = board.container_mut(container) else {
            return DragOutcome::Ignored;
        };

        grid.set_lift(item, LiftInput::Press);
        let reorder = grid.reorder_delegate();
        let drag = grid.active_drag_delegate();
        let location = item_center(board, container, item);

        self.state = DragState::Lifted { container, item };
        debug!("Item {} lifted in grid {}", item, container);

        if let Some(delegate) = reorder.and_then(|id| self.reorder_delegates.get_mut(id.0)) {
            delegate.reorder_started(item);
        }
        if let Some(delegate) = drag.and_then(|id| self.drag_delegates.get_mut(id.0)) {
            delegate.drag_started(
                board,
                DragContext {
                    container,
                    item,
                    location,
                },
            );
        }
        DragOutcome::Lifted
    }

    fn drag_moved(
        &mut self,
        board: &mut GridBoard,
        container: ContainerId,
        item: ItemId,
        location: Point,
    ) -> DragOutcome {
        let Some(grid) = board.container_mut(container) else {
            return DragOutcome::Ignored;
        };
        let local = grid.to_local(location);
        grid.track_pointer(item, local);
        let reorder = grid.reorder_delegate();
        let drag = grid.active_drag_delegate();

        if let Some(delegate) = drag.and_then(|id| self.drag_delegates.get_mut(id.0)) {
            delegate.dragged(
                board,
                DragContext {
                    container,
                    item,
                    location,
                },
            );
        }

        // The delegate may have pulled the item out of the grid.
        let reordered = match board.container_mut(container) {
            Some(grid) if grid.contains(item) => grid.live_reorder(item, local),
            _ => false,
        };

        if let Some(delegate) = reorder.and_then(|id| self.reorder_delegates.get_mut(id.0)) {
            delegate.reorder_moved(item, location);
        }
        DragOutcome::Moved { reordered }
    }

    /// Return the item to rest and go idle. `commit` fires the drag-end
    /// delegate after the source grid has settled.
    fn finish(
        &mut self,
        board: &mut GridBoard,
        container: ContainerId,
        item: ItemId,
        location: Point,
        commit: bool,
    ) {
        self.state = DragState::Idle;

        let Some(grid) = board.container_mut(container) else {
            return;
        };
        grid.end_tracking(item);
        grid.set_lift(item, LiftInput::Release);
        if grid.reorderable() {
            grid.recompute_layout();
        }
        let reorder = grid.reorder_delegate();
        let drag = grid.active_drag_delegate();

        if let Some(delegate) = reorder.and_then(|id| self.reorder_delegates.get_mut(id.0)) {
            delegate.reorder_ended(item, location);
        }

        if commit {
            if let Some(delegate) = drag.and_then(|id| self.drag_delegates.get_mut(id.0)) {
                delegate.drag_ended(
                    board,
                    DragContext {
                        container,
                        item,
                        location,
                    },
                );
            }
            debug!("Drag of item {} committed", item);
        } else {
            debug!("Item {} returned to rest", item);
        }
    }
}

/// Center of the item's displayed rect, in board coordinates.
fn item_center(board: &GridBoard, container: ContainerId, item: ItemId) -> Point {
    board
        .container(container)
        .and_then(|grid| {
            let rect = grid.item(item)?.display_rect()?;
            Some(grid.to_board(rect.center()))
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::container::GridOptions;
    use crate::geometry::Rect;
    use crate::item::{ItemFactory, ItemStyle};

    #[derive(Debug, Clone, PartialEq)]
    enum Note {
        ReorderStarted(ItemId),
        ReorderMoved(ItemId),
        ReorderEnded(ItemId),
        DragStarted(ContainerId, ItemId),
        Dragged(ContainerId, ItemId),
        DragEnded(ContainerId, ItemId, Point),
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Note>>>);

    impl Recorder {
        fn notes(&self) -> Vec<Note> {
            self.0.borrow().clone()
        }
    }

    impl ReorderLifecycle for Recorder {
        fn reorder_started(&mut self, item: ItemId) {
            self.0.borrow_mut().push(Note::ReorderStarted(item));
        }

        fn reorder_moved(&mut self, item: ItemId, _location: Point) {
            self.0.borrow_mut().push(Note::ReorderMoved(item));
        }

        fn reorder_ended(&mut self, item: ItemId, _location: Point) {
            self.0.borrow_mut().push(Note::ReorderEnded(item));
        }
    }

    impl DragLifecycle for Recorder {
        fn drag_started(&mut self, _board: &GridBoard, ctx: DragContext) {
            self.0.borrow_mut().push(Note::DragStarted(ctx.container, ctx.item));
        }

        fn dragged(&mut self, _board: &GridBoard, ctx: DragContext) {
            self.0.borrow_mut().push(Note::Dragged(ctx.container, ctx.item));
        }

        fn drag_ended(&mut self, _board: &mut GridBoard, ctx: DragContext) {
            self.0
                .borrow_mut()
                .push(Note::DragEnded(ctx.container, ctx.item, ctx.location));
        }
    }

    fn setup(heights: &[f64]) -> (GridBoard, ContainerId, Vec<ItemId>) {
        let mut board = GridBoard::new();
        let grid = board.add_container(
            Rect::new(0.0, 0.0, 400.0, 600.0),
            GridOptions::new(180.0).with_vertical_padding(20.0),
        );
        let mut factory = ItemFactory::new(180.0, ItemStyle::default());
        let ids = heights
            .iter()
            .map(|&h| {
                let item = factory.create(h);
                let id = item.id();
                board.container_mut(grid).unwrap().append(item).unwrap();
                id
            })
            .collect();
        (board, grid, ids)
    }

    fn event(item: ItemId, phase: GesturePhase, x: f64, y: f64) -> GestureEvent {
        GestureEvent::new(item, phase, Point::new(x, y))
    }

    #[test]
    fn test_long_press_lifts() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        let mut coordinator = DragCoordinator::new();

        let outcome = coordinator.handle(&mut board, event(ids[1], GesturePhase::LongPress, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Lifted);
        assert_eq!(
            coordinator.state(),
            DragState::Lifted {
                container: grid,
                item: ids[1]
            }
        );
        assert!(board.container(grid).unwrap().item(ids[1]).unwrap().is_lifted());
    }

    #[test]
    fn test_second_tap_lowers_without_moving() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[0], GesturePhase::Tap, 0.0, 0.0));
        let outcome = coordinator.handle(&mut board, event(ids[0], GesturePhase::Tap, 0.0, 0.0));

        assert_eq!(outcome, DragOutcome::Lowered);
        assert_eq!(coordinator.state(), DragState::Idle);
        let g = board.container(grid).unwrap();
        assert!(!g.item(ids[0]).unwrap().is_lifted());
        assert_eq!(g.item_ids(), ids);
    }

    #[test]
    fn test_long_press_while_lifted_is_ignored() {
        let (mut board, _grid, ids) = setup(&[100.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        let outcome = coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Ignored);
    }

    #[test]
    fn test_drag_without_lift_is_ignored() {
        let (mut board, _grid, ids) = setup(&[100.0, 150.0]);
        let mut coordinator = DragCoordinator::new();

        let outcome = coordinator.handle(&mut board, event(ids[0], GesturePhase::DragBegan, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Ignored);
        assert_eq!(coordinator.state(), DragState::Idle);
    }

    #[test]
    fn test_other_item_ignored_while_active() {
        let (mut board, _grid, ids) = setup(&[100.0, 150.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        let outcome = coordinator.handle(&mut board, event(ids[1], GesturePhase::LongPress, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Ignored);
        assert!(matches!(coordinator.state(), DragState::Lifted { item, .. } if item == ids[0]));
    }

    #[test]
    fn test_drag_over_first_slot_reorders() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[2], GesturePhase::LongPress, 90.0, 180.0));
        coordinator.handle(&mut board, event(ids[2], GesturePhase::DragBegan, 90.0, 180.0));
        let outcome = coordinator.handle(&mut board, event(ids[2], GesturePhase::DragMoved, 90.0, 50.0));
        assert_eq!(outcome, DragOutcome::Moved { reordered: true });

        let g = board.container(grid).unwrap();
        assert_eq!(g.item_ids(), vec![ids[2], ids[0], ids[1]]);
        assert!(g.positions_consistent());
        // Still following the pointer, not snapped into its new slot.
        assert_eq!(
            g.item(ids[2]).unwrap().display_rect().unwrap().center(),
            Point::new(90.0, 50.0)
        );

        let outcome = coordinator.handle(&mut board, event(ids[2], GesturePhase::DragEnded, 90.0, 50.0));
        assert_eq!(outcome, DragOutcome::Committed);
        assert_eq!(coordinator.state(), DragState::Idle);

        let g = board.container(grid).unwrap();
        let item = g.item(ids[2]).unwrap();
        assert!(!item.is_lifted());
        assert_eq!(item.display_rect(), item.frame());
        assert_eq!(item.frame().unwrap().origin(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_non_reorderable_grid_only_tracks() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        board.container_mut(grid).unwrap().set_reorderable(false);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[2], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[2], GesturePhase::DragBegan, 0.0, 0.0));
        let outcome = coordinator.handle(&mut board, event(ids[2], GesturePhase::DragMoved, 90.0, 50.0));

        assert_eq!(outcome, DragOutcome::Moved { reordered: false });
        assert_eq!(board.container(grid).unwrap().item_ids(), ids);
    }

    #[test]
    fn test_degraded_grid_skips_reorder() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[1], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[1], GesturePhase::DragBegan, 0.0, 0.0));
        board
            .container_mut(grid)
            .unwrap()
            .set_frame(Rect::new(0.0, 0.0, 100.0, 600.0));

        let outcome = coordinator.handle(&mut board, event(ids[1], GesturePhase::DragMoved, 50.0, 50.0));
        assert_eq!(outcome, DragOutcome::Moved { reordered: false });
        assert_eq!(board.container(grid).unwrap().item_ids(), ids);
    }

    #[test]
    fn test_delegates_notified_in_order() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        let mut coordinator = DragCoordinator::new();
        let recorder = Recorder::default();
        let reorder_id = coordinator.add_reorder_delegate(Box::new(recorder.clone()));
        let drag_id = coordinator.add_drag_delegate(Box::new(recorder.clone()));
        let g = board.container_mut(grid).unwrap();
        g.set_reorder_delegate(Some(reorder_id));
        g.set_drag_delegate(Some(drag_id));

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragBegan, 90.0, 50.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragMoved, 95.0, 55.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragEnded, 95.0, 55.0));

        assert_eq!(
            recorder.notes(),
            vec![
                Note::ReorderStarted(ids[0]),
                Note::DragStarted(grid, ids[0]),
                Note::Dragged(grid, ids[0]),
                Note::ReorderMoved(ids[0]),
                // The end event also moves the item to the drop point.
                Note::Dragged(grid, ids[0]),
                Note::ReorderMoved(ids[0]),
                Note::ReorderEnded(ids[0]),
                Note::DragEnded(grid, ids[0], Point::new(95.0, 55.0)),
            ]
        );
    }

    #[test]
    fn test_non_draggable_grid_skips_drag_delegate() {
        let (mut board, grid, ids) = setup(&[100.0]);
        let mut coordinator = DragCoordinator::new();
        let recorder = Recorder::default();
        let drag_id = coordinator.add_drag_delegate(Box::new(recorder.clone()));
        let g = board.container_mut(grid).unwrap();
        g.set_drag_delegate(Some(drag_id));
        g.set_draggable(false);

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragBegan, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragEnded, 10.0, 10.0));

        assert!(recorder.notes().is_empty());
    }

    #[test]
    fn test_item_removed_mid_drag_cancels() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0, 120.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[2], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[2], GesturePhase::DragBegan, 0.0, 0.0));
        board.container_mut(grid).unwrap().remove_item(ids[2]).unwrap();

        let outcome = coordinator.handle(&mut board, event(ids[2], GesturePhase::DragMoved, 90.0, 50.0));
        assert_eq!(outcome, DragOutcome::Cancelled);
        assert_eq!(coordinator.state(), DragState::Idle);
        assert_eq!(board.container(grid).unwrap().item_ids(), vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_removed_lifted_item_frees_coordinator() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        let removed = board.container_mut(grid).unwrap().remove_item(ids[0]).unwrap();
        assert!(!removed.is_lifted());

        let outcome = coordinator.handle(&mut board, event(ids[1], GesturePhase::LongPress, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Lifted);
        assert_eq!(
            coordinator.state(),
            DragState::Lifted {
                container: grid,
                item: ids[1]
            }
        );
    }

    #[test]
    fn test_cancel_restores_rest_state() {
        let (mut board, grid, ids) = setup(&[100.0, 150.0]);
        let mut coordinator = DragCoordinator::new();

        coordinator.handle(&mut board, event(ids[0], GesturePhase::LongPress, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragBegan, 0.0, 0.0));
        coordinator.handle(&mut board, event(ids[0], GesturePhase::DragMoved, 300.0, 400.0));
        let outcome = coordinator.handle(&mut board, event(ids[0], GesturePhase::DragCancelled, 300.0, 400.0));

        assert_eq!(outcome, DragOutcome::Cancelled);
        let g = board.container(grid).unwrap();
        let item = g.item(ids[0]).unwrap();
        assert!(!item.is_lifted());
        assert_eq!(item.display_rect(), item.frame());
        assert_eq!(g.tracking(), None);
    }

    #[test]
    fn test_unknown_item_ignored() {
        let (mut board, _grid, _ids) = setup(&[100.0]);
        let mut coordinator = DragCoordinator::new();
        let outcome = coordinator.handle(&mut board, event(ItemId(42), GesturePhase::LongPress, 0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Ignored);
    }
}
