use thiserror::Error;

/// Errors raised by the board model and the game controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid board configuration {width}x{height} with {mines} mines: {reason}")]
    InvalidConfiguration {
        width: usize,
        height: usize,
        mines: usize,
        reason: &'static str,
    },

    #[error("position ({x}, {y}) is outside the {width}x{height} board")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}
