use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, instrument, warn};

use minesweeper_common::models::{self, CellView, GameParams, GameStatus, Pos};

use crate::{
    data::{Board, Mark},
    error::GameError,
    logic::{RevealOutcome, validate_params},
};

pub const LOSS_MESSAGE: &str = "Game over! Try again.";
pub const WIN_MESSAGE: &str = "Congratulations! You won!";

/// What an input event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The event was not applicable (game over, marked cell, ...).
    Ignored,
    Continuing,
    Won,
    Lost,
}

impl InputOutcome {
    /// Message to show the player when the event ended the game.
    pub fn notification(self) -> Option<&'static str> {
        match self {
            Self::Won => Some(WIN_MESSAGE),
            Self::Lost => Some(LOSS_MESSAGE),
            Self::Ignored | Self::Continuing => None,
        }
    }
}

/// One playthrough: owns the board, the elapsed-time counter and the
/// lifecycle state. `reset` drops the old board and builds a fresh one.
#[derive(Debug)]
pub struct Game {
    params: GameParams,
    board: Option<Board>,
    status: GameStatus,
    elapsed: u64,
    rng: StdRng,
}

impl Game {
    /// Creates a session that has not started yet. The configuration is
    /// checked here so a bad one never reaches play.
    pub fn new(params: GameParams) -> Result<Self, GameError> {
        Self::with_rng(params, StdRng::from_rng(&mut rand::rng()))
    }

    /// Like [`Game::new`] but with a reproducible sequence of boards.
    pub fn with_seed(params: GameParams, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: GameParams, rng: StdRng) -> Result<Self, GameError> {
        validate_params(&params)?;
        Ok(Self {
            params,
            board: None,
            status: GameStatus::NotStarted,
            elapsed: 0,
            rng,
        })
    }

    /// Starts play on a prepared board instead of a random one.
    pub fn from_board(board: Board) -> Self {
        Self {
            params: board.params(),
            board: Some(board),
            status: GameStatus::InProgress,
            elapsed: 0,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn start(&mut self) -> Result<(), GameError> {
        info!(
            "Starting game: {}x{} with {} mines",
            self.params.width, self.params.height, self.params.mines
        );
        self.board = Some(Board::with_rng(self.params, &mut self.rng)?);
        self.elapsed = 0;
        self.status = GameStatus::InProgress;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn reset(&mut self) -> Result<(), GameError> {
        debug!("Discarding board in state {:?}", self.status);
        self.board = None;
        self.start()
    }

    pub fn params(&self) -> GameParams {
        self.params
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Elapsed time as `mm:ss`. Minutes keep counting past an hour.
    pub fn elapsed_display(&self) -> String {
        format!("{:02}:{:02}", self.elapsed / 60, self.elapsed % 60)
    }

    pub fn flags_remaining(&self) -> isize {
        match &self.board {
            Some(board) => board.flags_remaining(),
            None => self.params.mines as isize,
        }
    }

    pub fn count_unrevealed(&self) -> usize {
        match &self.board {
            Some(board) => board.count_unrevealed(),
            None => self.params.width * self.params.height,
        }
    }

    fn validate_pos(&self, pos: Pos) -> Result<(), GameError> {
        if pos.x < self.params.width && pos.y < self.params.height {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.params.width,
                height: self.params.height,
            })
        }
    }

    /// Board of the running game, `None` once it is over or before start.
    fn playable_board(&mut self) -> Option<&mut Board> {
        if self.status.is_terminal() {
            return None;
        }
        self.board.as_mut()
    }

    /// Primary activation (left click) on a cell.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub fn on_primary_input(&mut self, pos: Pos) -> Result<InputOutcome, GameError> {
        self.validate_pos(pos)?;

        let Some(board) = self.playable_board() else {
            debug!("Ignoring reveal at ({}, {}) outside of play", pos.x, pos.y);
            return Ok(InputOutcome::Ignored);
        };

        if board.cell(pos)?.mark != Mark::None {
            debug!("Ignoring reveal on marked cell ({}, {})", pos.x, pos.y);
            return Ok(InputOutcome::Ignored);
        }

        match board.reveal(pos)? {
            RevealOutcome::Lost => {
                warn!("Player hit a mine at ({}, {}) - game over!", pos.x, pos.y);
                board.reveal_all();
                self.status = GameStatus::Lost;
                info!("Game lost after {}s", self.elapsed);
                Ok(InputOutcome::Lost)
            }
            RevealOutcome::Continuing => Ok(self.check_win()),
        }
    }

    /// Secondary activation (right click): cycles the cell's mark.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub fn on_secondary_input(&mut self, pos: Pos) -> Result<InputOutcome, GameError> {
        self.validate_pos(pos)?;

        let Some(board) = self.playable_board() else {
            debug!("Ignoring mark at ({}, {}) outside of play", pos.x, pos.y);
            return Ok(InputOutcome::Ignored);
        };

        if board.cell(pos)?.revealed {
            debug!("Ignoring mark on revealed cell ({}, {})", pos.x, pos.y);
            return Ok(InputOutcome::Ignored);
        }

        let mark = board.toggle_mark(pos)?;
        debug!(
            "Cell ({}, {}) now {:?}, {} flags remaining",
            pos.x,
            pos.y,
            mark,
            board.flags_remaining()
        );

        Ok(self.check_win())
    }

    /// Won as soon as the number of hidden cells equals the mine count. The
    /// hidden cells are not checked against the mine positions.
    fn check_win(&mut self) -> InputOutcome {
        let Some(board) = self.board.as_mut() else {
            return InputOutcome::Ignored;
        };

        if board.count_unrevealed() != board.mines() {
            return InputOutcome::Continuing;
        }

        board.disable_all();
        self.status = GameStatus::Won;
        info!("Game won in {}s", self.elapsed);
        InputOutcome::Won
    }

    /// One second of play has passed. Returns whether the clock advanced.
    pub fn on_tick(&mut self) -> bool {
        if self.status.is_terminal() || self.board.is_none() {
            return false;
        }
        self.elapsed += 1;
        true
    }

    pub fn cell_view(&self, pos: Pos) -> Result<CellView, GameError> {
        self.validate_pos(pos)?;
        Ok(match &self.board {
            Some(board) => {
                let cell = board.cell(pos)?;
                CellView {
                    pos,
                    interactive: cell.enabled,
                    value: cell.into(),
                }
            }
            None => CellView {
                pos,
                interactive: false,
                value: models::Cell::Hidden,
            },
        })
    }

    /// Render state of every cell in row-major order.
    pub fn snapshot(&self) -> Vec<CellView> {
        match &self.board {
            Some(board) => board
                .cells()
                .map(|(pos, cell)| CellView {
                    pos,
                    interactive: cell.enabled,
                    value: cell.into(),
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Displayed cells grouped by row.
    pub fn field(&self) -> Vec<Vec<models::Cell>> {
        self.snapshot()
            .iter()
            .map(|view| view.value)
            .collect::<Vec<_>>()
            .chunks(self.params.width)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}
