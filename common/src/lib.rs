//! Types shared between the minesweeper game core and whatever draws it.
//!
//! `models` holds the per-cell render state and board parameters, `protocol`
//! the tagged input/output messages used when the game is driven over JSON
//! lines.

pub mod models;
pub mod protocol;
