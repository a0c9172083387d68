//! Arena of grid containers sharing one coordinate space.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::container::{GridContainer, GridOptions, SurfaceOp};
use crate::geometry::{Point, Rect};
use crate::item::ItemId;
use crate::GridError;

/// Identifier of a container within a [`GridBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns every container on screen. Items refer to their container by id.
#[derive(Debug, Default)]
pub struct GridBoard {
    containers: Vec<GridContainer>,
    next_id: u32,
}

impl GridBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container occupying `frame` (board coordinates).
    pub fn add_container(&mut self, frame: Rect, options: GridOptions) -> ContainerId {
        let id = ContainerId(self.next_id);
        self.next_id += 1;
        self.containers.push(GridContainer::new(id, frame, options));
        id
    }

    /// Destroy a container, returning it with its items.
    pub fn remove_container(&mut self, id: ContainerId) -> Option<GridContainer> {
        let index = self.containers.iter().position(|c| c.id() == id)?;
        Some(self.containers.remove(index))
    }

    pub fn container(&self, id: ContainerId) -> Option<&GridContainer> {
        self.containers.iter().find(|c| c.id() == id)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut GridContainer> {
        self.containers.iter_mut().find(|c| c.id() == id)
    }

    /// Like [`container_mut`](Self::container_mut), as an error.
    pub fn try_container_mut(&mut self, id: ContainerId) -> Result<&mut GridContainer, GridError> {
        self.container_mut(id).ok_or(GridError::ContainerNotFound(id))
    }

    pub fn containers(&self) -> impl Iterator<Item = &GridContainer> {
        self.containers.iter()
    }

    pub fn ids(&self) -> Vec<ContainerId> {
        self.containers.iter().map(GridContainer::id).collect()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Container whose sequence holds `item`.
    pub fn locate(&self, item: ItemId) -> Option<ContainerId> {
        self.containers
            .iter()
            .find(|c| c.contains(item))
            .map(GridContainer::id)
    }

    /// Topmost container whose frame contains `point`, skipping `exclude`.
    pub fn container_at(&self, point: Point, exclude: Option<ContainerId>) -> Option<ContainerId> {
        self.containers
            .iter()
            .rev()
            .filter(|c| Some(c.id()) != exclude)
            .find(|c| c.frame().contains(point))
            .map(GridContainer::id)
    }

    /// Move an item from one container's sequence to the end of another's.
    ///
    /// Removal and append run one after the other; each container relays out.
    pub fn transfer(&mut self, item: ItemId, from: ContainerId, to: ContainerId) -> Result<(), GridError> {
        if from == to {
            return Ok(());
        }
        match self.container(to) {
            None => return Err(GridError::ContainerNotFound(to)),
            Some(dest) if dest.contains(item) => return Err(GridError::DuplicateItem(item)),
            Some(_) => {}
        }

        let moved = self.try_container_mut(from)?.remove_item(item)?;
        self.try_container_mut(to)?.append(moved)?;

        info!("Transferred item {} from grid {} to grid {}", item, from, to);
        Ok(())
    }

    /// Drain pending render operations from every container.
    pub fn take_surface_ops(&mut self) -> Vec<(ContainerId, SurfaceOp)> {
        self.containers
            .iter_mut()
            .flat_map(|c| {
                let id = c.id();
                c.take_surface_ops().into_iter().map(move |op| (id, op))
            })
            .collect()
    }
}
