//! Grid items and the factory that mints them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::ContainerId;
use crate::geometry::{Point, Rect};
use crate::position::GridPosition;

/// Stable item identifier. Assigned by [`ItemFactory`] in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scale applied to an item while lifted.
pub const LIFTED_SCALE: f64 = 1.2;
/// Opacity applied to an item while lifted.
pub const LIFTED_ALPHA: f64 = 0.6;
/// Duration of the lift/settle animation, in seconds.
pub const LIFT_ANIMATION_SECS: f64 = 0.25;

/// Visual parameters the render surface applies to an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemVisual {
    pub scale: f64,
    pub alpha: f64,
}

impl ItemVisual {
    pub const RESTING: ItemVisual = ItemVisual {
        scale: 1.0,
        alpha: 1.0,
    };
    pub const LIFTED: ItemVisual = ItemVisual {
        scale: LIFTED_SCALE,
        alpha: LIFTED_ALPHA,
    };
}

/// Whether an item is in reorder mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LiftState {
    #[default]
    Resting,
    Lifted,
}

/// Inputs that drive [`LiftState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftInput {
    /// Long press: enters reorder mode, never leaves it.
    Press,
    /// Tap: flips reorder mode.
    Toggle,
    /// Gesture finished or cancelled.
    Release,
}

impl LiftState {
    /// Transition function for the lifted visual state.
    pub fn next(self, input: LiftInput) -> LiftState {
        match (self, input) {
            (_, LiftInput::Press) => LiftState::Lifted,
            (LiftState::Resting, LiftInput::Toggle) => LiftState::Lifted,
            (LiftState::Lifted, LiftInput::Toggle) => LiftState::Resting,
            (_, LiftInput::Release) => LiftState::Resting,
        }
    }

    pub fn is_lifted(self) -> bool {
        self == LiftState::Lifted
    }

    /// The visual parameters for this state.
    pub fn visual(self) -> ItemVisual {
        match self {
            LiftState::Resting => ItemVisual::RESTING,
            LiftState::Lifted => ItemVisual::LIFTED,
        }
    }
}

/// Presentation parameters stamped onto items by the factory.
///
/// The layout core never reads these; they travel with the item so the
/// render surface can draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    /// Height of the label strip at the top of the item.
    pub header_height: f64,
    /// Height of the accent bar at the bottom of the item.
    pub footer_height: f64,
    pub background: [u8; 3],
    pub border: [u8; 3],
    pub accent: [u8; 3],
}

impl Default for ItemStyle {
    fn default() -> Self {
        Self {
            header_height: 50.0,
            footer_height: 5.0,
            background: [255, 255, 255],
            border: [233, 233, 233],
            accent: [65, 65, 65],
        }
    }
}

/// A variable-height rectangle placed in a grid.
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    label: String,
    width: f64,
    height: f64,
    style: ItemStyle,
    /// Slot assigned by the last layout pass.
    pub(crate) grid_position: Option<GridPosition>,
    /// Slot rectangle assigned by the last layout pass, in content coordinates.
    pub(crate) frame: Option<Rect>,
    /// Origin while the item tracks the pointer instead of its slot.
    pub(crate) floating_origin: Option<Point>,
    pub(crate) lift: LiftState,
    /// Container whose sequence holds this item.
    pub(crate) owner: Option<ContainerId>,
    /// Container whose render tree currently shows this item.
    pub(crate) render_parent: Option<ContainerId>,
}

impl Item {
    /// Create an item directly. Prefer [`ItemFactory::create`] so ids stay unique.
    pub fn new(id: ItemId, width: f64, height: f64) -> Self {
        Self {
            id,
            label: id.0.to_string(),
            width,
            height,
            style: ItemStyle::default(),
            grid_position: None,
            frame: None,
            floating_origin: None,
            lift: LiftState::Resting,
            owner: None,
            render_parent: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn style(&self) -> &ItemStyle {
        &self.style
    }

    /// Slot assigned by the last layout pass, if any.
    pub fn grid_position(&self) -> Option<GridPosition> {
        self.grid_position
    }

    /// Slot rectangle assigned by the last layout pass, if any.
    pub fn frame(&self) -> Option<Rect> {
        self.frame
    }

    /// Rectangle the item is currently displayed at.
    ///
    /// This is the pointer-tracking rectangle during a drag, otherwise the
    /// slot frame.
    pub fn display_rect(&self) -> Option<Rect> {
        match self.floating_origin {
            Some(origin) => Some(Rect::new(origin.x, origin.y, self.width, self.height)),
            None => self.frame,
        }
    }

    pub fn lift_state(&self) -> LiftState {
        self.lift
    }

    pub fn is_lifted(&self) -> bool {
        self.lift.is_lifted()
    }

    pub fn owner(&self) -> Option<ContainerId> {
        self.owner
    }

    /// Whether the item is attached to some container's render tree.
    pub fn is_attached(&self) -> bool {
        self.render_parent.is_some()
    }

    /// Apply a lift transition. Returns true if the state changed.
    pub(crate) fn apply_lift(&mut self, input: LiftInput) -> bool {
        let next = self.lift.next(input);
        let changed = next != self.lift;
        self.lift = next;
        changed
    }

    /// Drop all placement state, as when leaving a container.
    pub(crate) fn reset_placement(&mut self) {
        self.grid_position = None;
        self.frame = None;
        self.floating_origin = None;
        self.owner = None;
        self.render_parent = None;
        self.lift = LiftState::Resting;
    }
}

/// Mints items with unique, increasing ids and a shared style.
#[derive(Debug, Clone)]
pub struct ItemFactory {
    next_id: u64,
    item_width: f64,
    style: ItemStyle,
}

impl ItemFactory {
    /// Create a factory producing items `item_width` wide.
    pub fn new(item_width: f64, style: ItemStyle) -> Self {
        Self {
            next_id: 0,
            item_width,
            style,
        }
    }

    pub fn item_width(&self) -> f64 {
        self.item_width
    }

    pub fn style(&self) -> &ItemStyle {
        &self.style
    }

    /// Create an item of the given height. The label is its tag number.
    pub fn create(&mut self, height: f64) -> Item {
        let id = ItemId(self.next_id);
        self.next_id += 1;

        let mut item = Item::new(id, self.item_width, height);
        item.style = self.style.clone();
        item
    }

    /// Number of items created so far.
    pub fn created(&self) -> u64 {
        self.next_id
    }
}
