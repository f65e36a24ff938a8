//! Single-player minesweeper.
//!
//! [`data`] and [`logic`] hold the board model (mine placement, adjacency
//! counts, reveal and marking), [`game`] the session controller that turns
//! player input into board operations and tracks win/loss and the clock.
//! [`render`] and [`frontend`] adapt a session to text or JSON-lines I/O.

pub mod config;
pub mod data;
pub mod error;
pub mod frontend;
pub mod game;
pub mod logic;
pub mod render;

pub use data::{Board, Cell, Content, Mark};
pub use error::GameError;
pub use game::{Game, InputOutcome};
pub use logic::RevealOutcome;
