use serde::{Deserialize, Serialize};

use crate::models::{Cell, Pos};

/// Input sent by a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    /// Primary activation (left click).
    #[serde(rename = "reveal")]
    Reveal { pos: Pos },
    /// Secondary activation (right click), cycles the mark.
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "restart")]
    Restart,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub pos: Pos,
    pub value: Cell,
}

/// Output consumed by a presentation layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        width: usize,
        height: usize,
        mines: usize,
        flags_remaining: isize,
        elapsed: String,
        field: Vec<Vec<Cell>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<CellUpdate>,
        flags_remaining: isize,
        won: bool,
        lost: bool,
    },
    #[serde(rename = "tick")]
    Tick { elapsed: String },
    #[serde(rename = "error")]
    Error { message: String },
}
