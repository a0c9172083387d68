//! Host session: a board of named grids driven by protocol commands.

use std::collections::VecDeque;

use anyhow::{anyhow, bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reflow_grid_core::{
    ContainerId, DragCoordinator, DragOutcome, DragState, GestureEvent, GesturePhase,
    GridBoard, GridContainer, GridOptions, GridPosition, Item, ItemFactory, ItemId, Point, Rect,
    SurfaceOp,
};
use reflow_grid_ipc::{
    GridInfo, HostCommand, HostResponse, ItemInfo, SurfaceInfo, WirePhase, WireRect,
};
use tracing::{debug, info, warn};

use crate::config::{Config, ItemsConfig};
use crate::controller::{ReorderLog, TransferController};

/// Render operations kept for `query_surface`; older ones are dropped first.
pub const MAX_PENDING_SURFACE: usize = 1024;

/// Draws item heights from the configured range.
#[derive(Debug)]
struct HeightSource {
    rng: StdRng,
    base: f64,
    variance: u32,
}

impl HeightSource {
    fn new(config: &ItemsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            base: config.base_height,
            variance: config.height_variance,
        }
    }

    fn next(&mut self) -> f64 {
        if self.variance == 0 {
            return self.base;
        }
        self.base + f64::from(self.rng.gen_range(0..self.variance))
    }
}

/// All grids on one board plus the gesture state machine driving them.
#[derive(Debug)]
pub struct Session {
    board: GridBoard,
    coordinator: DragCoordinator,
    factory: ItemFactory,
    heights: HeightSource,
    /// Grid names in creation order.
    names: Vec<(String, ContainerId)>,
    /// Render operations not yet fetched by `query_surface`, newest last.
    pending_surface: VecDeque<SurfaceInfo>,
}

impl Session {
    /// Build the board described by a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut board = GridBoard::new();
        let mut coordinator = DragCoordinator::new();
        let transfer = coordinator.add_drag_delegate(Box::new(TransferController::new()));
        let reorder_log = coordinator.add_reorder_delegate(Box::new(ReorderLog));

        let mut factory = ItemFactory::new(config.layout.item_width, config.style.item_style());
        let mut heights = HeightSource::new(&config.items);
        let mut names: Vec<(String, ContainerId)> = Vec::new();

        for grid in &config.grids {
            if names.iter().any(|(name, _)| *name == grid.name) {
                bail!("Grid '{}' is defined twice", grid.name);
            }

            let options = GridOptions::new(config.layout.item_width)
                .with_vertical_padding(config.layout.vertical_padding)
                .with_reorderable(grid.reorderable.unwrap_or(config.layout.reorderable))
                .with_draggable(grid.draggable.unwrap_or(config.layout.draggable));
            let frame = Rect::new(grid.x, grid.y, grid.width, grid.height);
            let id = board.add_container(frame, options);
            names.push((grid.name.clone(), id));

            let container = board.try_container_mut(id)?;
            container.set_drag_delegate(Some(transfer));
            container.set_reorder_delegate(Some(reorder_log));

            for _ in 0..grid.initial_items {
                container.append(factory.create(heights.next()))?;
            }
            info!(
                "Grid '{}' created at ({}, {}) {}x{} with {} items in {} columns",
                grid.name,
                grid.x,
                grid.y,
                grid.width,
                grid.height,
                container.len(),
                container.cols_in_row()
            );
        }

        let mut session = Self {
            board,
            coordinator,
            factory,
            heights,
            names,
            pending_surface: VecDeque::new(),
        };
        session.collect_surface();
        Ok(session)
    }

    pub fn board(&self) -> &GridBoard {
        &self.board
    }

    pub fn drag_state(&self) -> DragState {
        self.coordinator.state()
    }

    /// Grid names in creation order.
    pub fn grid_names(&self) -> Vec<&str> {
        self.names.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Look up a grid by name.
    pub fn grid(&self, name: &str) -> Option<&GridContainer> {
        let id = self.grid_id(name).ok()?;
        self.board.container(id)
    }

    /// Execute one command. Failures become error responses.
    pub fn handle_command(&mut self, cmd: HostCommand) -> HostResponse {
        let response = match self.execute(cmd) {
            Ok(response) => response,
            Err(e) => HostResponse::error(e.to_string()),
        };
        self.collect_surface();
        response
    }

    fn execute(&mut self, cmd: HostCommand) -> Result<HostResponse> {
        match cmd {
            HostCommand::AddItem { grid, height } => {
                let id = self.grid_id(&grid)?;
                let item = self.create_item(height)?;
                let item_id = item.id();
                let slot = self.container_mut(id)?.append(item)?;
                info!("Added item {} to grid '{}'", item_id, grid);
                Ok(item_added(item_id, slot))
            }
            HostCommand::InsertItem {
                grid,
                col,
                row,
                height,
            } => {
                let id = self.grid_id(&grid)?;
                let item = self.create_item(height)?;
                let item_id = item.id();
                let slot = self
                    .container_mut(id)?
                    .add_at(item, GridPosition::new(col, row))?;
                info!("Inserted item {} into grid '{}'", item_id, grid);
                Ok(item_added(item_id, slot))
            }
            HostCommand::RemoveAt { grid, col, row } => {
                let id = self.grid_id(&grid)?;
                let position = GridPosition::new(col, row);
                match self.container_mut(id)?.remove_at(position) {
                    Some(item) => {
                        info!("Removed item {} from grid '{}'", item.id(), grid);
                        Ok(HostResponse::Ok)
                    }
                    None => bail!("No item at {} in grid '{}'", position, grid),
                }
            }
            HostCommand::RemoveItem { item } => {
                let item = ItemId(item);
                let id = self
                    .board
                    .locate(item)
                    .ok_or_else(|| anyhow!("Item {} is in no grid", item))?;
                self.container_mut(id)?.remove_item(item)?;
                info!("Removed item {}", item);
                Ok(HostResponse::Ok)
            }
            HostCommand::ResizeGrid {
                grid,
                width,
                height,
            } => {
                if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                    bail!("Invalid size {}x{}", width, height);
                }
                let id = self.grid_id(&grid)?;
                let container = self.container_mut(id)?;
                let frame = container.frame();
                container.set_frame(Rect::new(frame.x, frame.y, width, height));
                info!(
                    "Grid '{}' resized to {}x{} ({} columns)",
                    grid,
                    width,
                    height,
                    container.cols_in_row()
                );
                Ok(HostResponse::Ok)
            }
            HostCommand::Scroll { grid, delta } => {
                if !delta.is_finite() {
                    bail!("Invalid scroll delta {}", delta);
                }
                let id = self.grid_id(&grid)?;
                let container = self.container_mut(id)?;
                container.scroll_by(delta);
                debug!(
                    "Grid '{}' scrolled to {:.1}",
                    grid,
                    container.viewport().y
                );
                Ok(HostResponse::Ok)
            }
            HostCommand::Gesture { item, phase, x, y } => {
                let event = GestureEvent::new(ItemId(item), gesture_phase(phase), Point::new(x, y));
                let outcome = self.coordinator.handle(&mut self.board, event);
                let (outcome, reordered) = outcome_name(outcome);
                Ok(HostResponse::Gesture {
                    outcome: outcome.to_string(),
                    state: state_name(self.coordinator.state()).to_string(),
                    reordered,
                })
            }
            HostCommand::QueryGrid { grid } => {
                let id = self.grid_id(&grid)?;
                let container = self
                    .board
                    .container(id)
                    .ok_or_else(|| anyhow!("Grid '{}' not found", grid))?;
                Ok(HostResponse::GridState(grid_info(&grid, container)))
            }
            HostCommand::QueryGrids => {
                let grids = self
                    .names
                    .iter()
                    .filter_map(|(name, id)| {
                        self.board.container(*id).map(|c| grid_info(name, c))
                    })
                    .collect();
                Ok(HostResponse::GridList { grids })
            }
            HostCommand::QuerySurface => {
                self.collect_surface();
                Ok(HostResponse::Surface {
                    ops: self.pending_surface.drain(..).collect(),
                })
            }
            HostCommand::Stop => {
                info!("Stop requested");
                Ok(HostResponse::Ok)
            }
        }
    }

    fn grid_id(&self, name: &str) -> Result<ContainerId> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow!("Unknown grid '{}'", name))
    }

    fn container_mut(&mut self, id: ContainerId) -> Result<&mut GridContainer> {
        Ok(self.board.try_container_mut(id)?)
    }

    fn create_item(&mut self, height: Option<f64>) -> Result<Item> {
        let height = match height {
            Some(h) if h.is_finite() && h > 0.0 => h,
            Some(h) => bail!("Invalid item height {}", h),
            None => self.heights.next(),
        };
        Ok(self.factory.create(height))
    }

    fn grid_name(&self, id: ContainerId) -> String {
        self.names
            .iter()
            .find(|(_, c)| *c == id)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Drain render operations from the board into the pending queue.
    fn collect_surface(&mut self) {
        let mut dropped = 0;
        for (container, op) in self.board.take_surface_ops() {
            let info = surface_info(self.grid_name(container), op);
            debug!(
                "Surface: {} item {} in '{}'",
                info.op, info.item, info.grid
            );
            if self.pending_surface.len() == MAX_PENDING_SURFACE {
                self.pending_surface.pop_front();
                dropped += 1;
            }
            self.pending_surface.push_back(info);
        }
        if dropped > 0 {
            warn!(
                "Dropped {} unfetched surface operations (limit {})",
                dropped, MAX_PENDING_SURFACE
            );
        }
    }
}

fn item_added(item: ItemId, slot: Option<GridPosition>) -> HostResponse {
    HostResponse::ItemAdded {
        item: item.0,
        slot: slot.map(|p| [p.col, p.row]),
    }
}

fn gesture_phase(phase: WirePhase) -> GesturePhase {
    match phase {
        WirePhase::LongPress => GesturePhase::LongPress,
        WirePhase::Tap => GesturePhase::Tap,
        WirePhase::DragBegan => GesturePhase::DragBegan,
        WirePhase::DragMoved => GesturePhase::DragMoved,
        WirePhase::DragEnded => GesturePhase::DragEnded,
        WirePhase::DragCancelled => GesturePhase::DragCancelled,
    }
}

fn outcome_name(outcome: DragOutcome) -> (&'static str, bool) {
    match outcome {
        DragOutcome::Ignored => ("ignored", false),
        DragOutcome::Lifted => ("lifted", false),
        DragOutcome::Lowered => ("lowered", false),
        DragOutcome::DragStarted => ("drag_started", false),
        DragOutcome::Moved { reordered } => ("moved", reordered),
        DragOutcome::Committed => ("committed", false),
        DragOutcome::Cancelled => ("cancelled", false),
    }
}

fn state_name(state: DragState) -> &'static str {
    match state {
        DragState::Idle => "idle",
        DragState::Lifted { .. } => "lifted",
        DragState::Dragging { .. } => "dragging",
    }
}

fn wire_rect(rect: Rect) -> WireRect {
    WireRect::new(rect.x, rect.y, rect.width, rect.height)
}

fn grid_info(name: &str, container: &GridContainer) -> GridInfo {
    let items = container
        .placements()
        .into_iter()
        .map(|p| ItemInfo {
            item: p.item.0,
            label: container
                .item(p.item)
                .map(|item| item.label().to_string())
                .unwrap_or_default(),
            index: p.index,
            slot: p.grid_position.map(|pos| [pos.col, pos.row]),
            rect: p.rect.map(wire_rect),
            attached: p.attached,
            lifted: p.lifted,
        })
        .collect();

    GridInfo {
        name: name.to_string(),
        frame: wire_rect(container.frame()),
        cols_in_row: container.cols_in_row(),
        horizontal_padding: container.horizontal_padding(),
        content_height: container.content_height(),
        scroll_offset: container.viewport().y,
        reorderable: container.reorderable(),
        draggable: container.draggable(),
        items,
    }
}

fn surface_info(grid: String, op: SurfaceOp) -> SurfaceInfo {
    let (item, name, rect, animated) = match op {
        SurfaceOp::Attach { item, rect } => (item, "attach", Some(wire_rect(rect)), None),
        SurfaceOp::Detach { item } => (item, "detach", None, None),
        SurfaceOp::Move {
            item,
            origin,
            animated,
        } => (
            item,
            "move",
            Some(WireRect::new(origin.x, origin.y, 0.0, 0.0)),
            Some(animated),
        ),
        SurfaceOp::Raise { item } => (item, "raise", None, None),
        SurfaceOp::SetVisual { item, .. } => (item, "set_visual", None, None),
    };
    SurfaceInfo {
        grid,
        item: item.0,
        op: name.to_string(),
        rect,
        animated,
    }
}
