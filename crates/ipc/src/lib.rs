//! Reflow Grid Host Protocol
//!
//! Line-delimited JSON commands and responses spoken by the grid host over
//! stdin/stdout. One JSON object per line in each direction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted length of a single command line, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Errors decoding a protocol line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Message of {0} bytes exceeds the 64 KiB limit")]
    TooLarge(usize),

    #[error("Invalid message: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Gesture phases accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WirePhase {
    LongPress,
    Tap,
    DragBegan,
    DragMoved,
    DragEnded,
    DragCancelled,
}

/// Commands that can be sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// Append a new item to a grid.
    AddItem {
        grid: String,
        /// Item height; drawn from the configured range when omitted.
        #[serde(default)]
        height: Option<f64>,
    },
    /// Insert a new item at a grid slot (clamped to the end).
    InsertItem {
        grid: String,
        col: usize,
        row: usize,
        #[serde(default)]
        height: Option<f64>,
    },
    /// Remove the item at a grid slot.
    RemoveAt { grid: String, col: usize, row: usize },
    /// Remove an item by id from whichever grid holds it.
    RemoveItem { item: u64 },
    /// Change a grid's size and relay it out.
    ResizeGrid { grid: String, width: f64, height: f64 },
    /// Scroll a grid vertically.
    Scroll {
        grid: String,
        /// Scroll delta in pixels (positive = down).
        delta: f64,
    },
    /// Deliver a pointer gesture for an item, in board coordinates.
    Gesture {
        item: u64,
        phase: WirePhase,
        x: f64,
        y: f64,
    },
    /// Query one grid.
    QueryGrid { grid: String },
    /// Query every grid.
    QueryGrids,
    /// Fetch the render operations applied since the last query.
    QuerySurface,
    /// Stop the host.
    Stop,
}

/// A rectangle on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WireRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One item as reported by `query_grid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub item: u64,
    pub label: String,
    pub index: usize,
    /// `[col, row]`, absent while the grid has no columns.
    pub slot: Option<[usize; 2]>,
    pub rect: Option<WireRect>,
    pub attached: bool,
    pub lifted: bool,
}

/// Summary of one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    pub name: String,
    pub frame: WireRect,
    pub cols_in_row: usize,
    pub horizontal_padding: f64,
    pub content_height: f64,
    pub scroll_offset: f64,
    pub reorderable: bool,
    pub draggable: bool,
    pub items: Vec<ItemInfo>,
}

/// A render operation on the wire, tagged with the grid it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    pub grid: String,
    pub item: u64,
    /// attach, detach, move, raise or set_visual.
    pub op: String,
    /// Target rect for `attach`; for `move` only the origin is meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<WireRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

/// Responses from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostResponse {
    /// Command executed successfully.
    Ok,
    /// A new item was created.
    ItemAdded { item: u64, slot: Option<[usize; 2]> },
    /// Command failed with an error.
    Error {
        /// Error message describing what went wrong.
        message: String,
    },
    /// Result of delivering a gesture.
    Gesture {
        /// Outcome of the event, e.g. `lifted`, `moved`, `committed`.
        outcome: String,
        /// Coordinator state after the event.
        state: String,
        #[serde(default)]
        reordered: bool,
    },
    /// One grid.
    GridState(GridInfo),
    /// Every grid.
    GridList { grids: Vec<GridInfo> },
    /// Pending render operations.
    Surface { ops: Vec<SurfaceInfo> },
}

impl HostResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Parse one protocol line into a command.
pub fn decode_command(line: &str) -> Result<HostCommand, ProtocolError> {
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge(line.len()));
    }
    Ok(serde_json::from_str(line.trim())?)
}

/// Serialize a response as one newline-terminated line.
pub fn encode_response(response: &HostResponse) -> String {
    match serde_json::to_string(response) {
        Ok(json) => json + "\n",
        Err(_) => "{\"status\":\"error\",\"message\":\"Internal serialization error\"}\n".to_string(),
    }
}
