use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, trace};

use minesweeper_common::models::{GameParams, Pos};

use crate::{
    data::{Board, Cell, Content, Mark},
    error::GameError,
};

/// Largest board accepted, in cells.
pub const MAX_CELLS: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Continuing,
    Lost,
}

fn invalid(params: &GameParams, reason: &'static str) -> GameError {
    GameError::InvalidConfiguration {
        width: params.width,
        height: params.height,
        mines: params.mines,
        reason,
    }
}

/// Checks dimensions and mine count, returning the number of cells.
pub fn validate_params(params: &GameParams) -> Result<usize, GameError> {
    if params.width == 0 || params.height == 0 {
        return Err(invalid(params, "dimensions must be positive"));
    }

    let area = params
        .width
        .checked_mul(params.height)
        .filter(|&area| area <= MAX_CELLS)
        .ok_or_else(|| invalid(params, "board is too large"))?;

    if params.mines >= area {
        return Err(invalid(params, "at least one cell must be free of mines"));
    }

    Ok(area)
}

/// Selection sampling: walks the cells once and takes each with probability
/// `mines_left / cells_left`, which picks exactly `mines` distinct cells
/// uniformly at random.
fn generate_mines<R: Rng + ?Sized>(params: &GameParams, area: usize, rng: &mut R) -> Vec<bool> {
    let mut mines = Vec::with_capacity(area);

    let mut mines_left = params.mines;
    for cells_left in (1..=area).rev() {
        let value = rng.random_range(0..cells_left) < mines_left;
        mines.push(value);
        if value {
            mines_left -= 1;
        }
    }

    mines
}

/// Moore neighborhood of `pos`, clipped at the board edges. Empty for a
/// board with a zero dimension.
pub fn neighbours(pos: Pos, width: usize, height: usize) -> impl Iterator<Item = Pos> {
    let xs = pos.x.saturating_sub(1)..=pos.x.saturating_add(1);
    let ys = pos.y.saturating_sub(1)..=pos.y.saturating_add(1);

    ys.flat_map(move |y| xs.clone().map(move |x| Pos { x, y }))
        .filter(move |other| other.x < width && other.y < height && *other != pos)
}

fn count_adjacent_mines(mines: &[bool], pos: Pos, width: usize, height: usize) -> u8 {
    neighbours(pos, width, height)
        .filter(|other| mines[other.x + other.y * width])
        .count() as u8
}

impl Board {
    /// Builds a board with mines drawn from the thread-local generator.
    pub fn new(params: GameParams) -> Result<Self, GameError> {
        Self::with_rng(params, &mut rand::rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(params: GameParams, rng: &mut R) -> Result<Self, GameError> {
        let area = validate_params(&params)?;
        let mines = generate_mines(&params, area, rng);
        Ok(Self::from_layout(params, mines))
    }

    /// Builds a board with mines at exactly the given positions.
    pub fn with_mines(params: GameParams, positions: &[Pos]) -> Result<Self, GameError> {
        let area = validate_params(&params)?;
        if positions.len() != params.mines {
            return Err(invalid(&params, "mine list does not match the mine count"));
        }

        let mut mines = vec![false; area];
        for &pos in positions {
            if pos.x >= params.width || pos.y >= params.height {
                return Err(GameError::OutOfBounds {
                    x: pos.x,
                    y: pos.y,
                    width: params.width,
                    height: params.height,
                });
            }

            let index = pos.x + pos.y * params.width;
            if mines[index] {
                return Err(invalid(&params, "mine positions must be unique"));
            }
            mines[index] = true;
        }

        Ok(Self::from_layout(params, mines))
    }

    fn from_layout(params: GameParams, mines: Vec<bool>) -> Self {
        let GameParams { width, height, .. } = params;
        let cells = mines
            .iter()
            .enumerate()
            .map(|(i, &mine)| {
                let content = if mine {
                    Content::Mine
                } else {
                    let pos = Pos {
                        x: i % width,
                        y: i / width,
                    };
                    match count_adjacent_mines(&mines, pos, width, height) {
                        0 => Content::Empty,
                        n => Content::Number(n),
                    }
                };
                Cell::new(content)
            })
            .collect();

        debug!("Built {}x{} board with {} mines", width, height, params.mines);

        Self {
            width,
            height,
            mines: params.mines,
            flagged: 0,
            revealed: 0,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn params(&self) -> GameParams {
        GameParams {
            width: self.width,
            height: self.height,
            mines: self.mines,
        }
    }

    pub fn flagged(&self) -> usize {
        self.flagged
    }

    /// Mine count minus flagged cells. Goes negative when the player places
    /// more flags than there are mines.
    pub fn flags_remaining(&self) -> isize {
        self.mines as isize - self.flagged as isize
    }

    pub fn count_unrevealed(&self) -> usize {
        self.cells.len() - self.revealed
    }

    pub fn validate_pos(&self, pos: Pos) -> Result<(), GameError> {
        if pos.x < self.width && pos.y < self.height {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn index(&self, pos: Pos) -> Result<usize, GameError> {
        self.validate_pos(pos)?;
        Ok(pos.x + pos.y * self.width)
    }

    fn pos_of(&self, index: usize) -> Pos {
        Pos {
            x: index % self.width,
            y: index / self.width,
        }
    }

    pub fn cell(&self, pos: Pos) -> Result<&Cell, GameError> {
        let index = self.index(pos)?;
        Ok(&self.cells[index])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (self.pos_of(i), cell))
    }

    /// Opens one cell. A flag on it is released since a forced reveal
    /// overrides any marking.
    fn open(&mut self, index: usize) {
        let cell = &mut self.cells[index];
        if cell.mark == Mark::Flagged {
            self.flagged -= 1;
        }
        cell.mark = Mark::None;
        cell.revealed = true;
        cell.enabled = false;
        self.revealed += 1;
    }

    pub fn reveal(&mut self, pos: Pos) -> Result<RevealOutcome, GameError> {
        let index = self.index(pos)?;
        let cell = &self.cells[index];
        if cell.revealed || cell.mark == Mark::Flagged {
            trace!("Reveal of ({}, {}) has no effect", pos.x, pos.y);
            return Ok(RevealOutcome::Continuing);
        }

        self.open(index);

        match self.cells[index].content {
            Content::Mine => Ok(RevealOutcome::Lost),
            Content::Empty => {
                let opened = self.flood_reveal(index);
                debug!(
                    "Flood reveal from ({}, {}) opened {} cells",
                    pos.x, pos.y, opened
                );
                Ok(RevealOutcome::Continuing)
            }
            Content::Number(_) => Ok(RevealOutcome::Continuing),
        }
    }

    /// Work-list traversal outward from an opened empty cell. Every cell is
    /// visited at most once, so the cost is bounded by the board size and the
    /// stack depth stays constant.
    fn flood_reveal(&mut self, start: usize) -> usize {
        let mut visited = vec![false; self.cells.len()];
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut opened = 0;

        while let Some(index) = queue.pop_front() {
            for neighbour in neighbours(self.pos_of(index), self.width, self.height) {
                let next = neighbour.x + neighbour.y * self.width;
                if visited[next] {
                    continue;
                }
                visited[next] = true;

                let cell = &self.cells[next];
                if cell.revealed || !cell.enabled {
                    continue;
                }
                if cell.mark == Mark::Flagged {
                    trace!(
                        "Releasing flag on ({}, {}) during flood reveal",
                        neighbour.x, neighbour.y
                    );
                }

                self.open(next);
                opened += 1;

                if self.cells[next].content == Content::Empty {
                    queue.push_back(next);
                }
            }
        }

        opened
    }

    /// Cycles None -> Flagged -> Questioned -> None and returns the new mark.
    /// Revealed cells keep their mark untouched.
    pub fn toggle_mark(&mut self, pos: Pos) -> Result<Mark, GameError> {
        let index = self.index(pos)?;
        let cell = &mut self.cells[index];
        if cell.revealed {
            return Ok(cell.mark);
        }

        cell.mark = match cell.mark {
            Mark::None => {
                self.flagged += 1;
                Mark::Flagged
            }
            Mark::Flagged => {
                self.flagged -= 1;
                Mark::Questioned
            }
            Mark::Questioned => Mark::None,
        };

        Ok(cell.mark)
    }

    /// Shows every cell's true content and disables the whole board. Marks
    /// are left in place so the flag counter keeps its last value.
    pub fn reveal_all(&mut self) {
        for cell in &mut self.cells {
            cell.revealed = true;
            cell.enabled = false;
        }
        self.revealed = self.cells.len();
    }

    pub fn disable_all(&mut self) {
        for cell in &mut self.cells {
            cell.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn params(width: usize, height: usize, mines: usize) -> GameParams {
        GameParams {
            width,
            height,
            mines,
        }
    }

    fn content(board: &Board, x: usize, y: usize) -> Content {
        board.cell(Pos { x, y }).unwrap().content
    }

    // . . . . .
    // . 1 1 1 .
    // . 1 * 1 .
    // . 1 1 1 .
    // . . . . .
    fn centred_mine() -> Board {
        Board::with_mines(params(5, 5, 1), &[Pos::new(2, 2)]).unwrap()
    }

    #[test]
    fn rejects_invalid_configurations() {
        for bad in [
            params(0, 10, 1),
            params(10, 0, 1),
            params(3, 3, 9),
            params(3, 3, 12),
            params(usize::MAX, 2, 1),
            params(usize::MAX, 1, 0),
            params(MAX_CELLS + 1, 1, 0),
            params(1 << 16, 1 << 16, 10),
        ] {
            assert!(
                matches!(
                    Board::new(bad),
                    Err(GameError::InvalidConfiguration { .. })
                ),
                "{bad:?} should be rejected"
            );
        }

        assert!(Board::new(params(3, 3, 8)).is_ok());
        assert!(Board::new(params(1, 1, 0)).is_ok());
        assert!(validate_params(&params(MAX_CELLS, 1, 0)).is_ok());
    }

    #[test]
    fn places_exactly_the_requested_number_of_mines() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::with_rng(params(10, 10, 10), &mut rng).unwrap();
            let mines: HashSet<Pos> = board
                .cells()
                .filter(|(_, cell)| cell.content == Content::Mine)
                .map(|(pos, _)| pos)
                .collect();
            assert_eq!(mines.len(), 10);
        }

        let mut rng = StdRng::seed_from_u64(7);
        let dense = Board::with_rng(params(4, 4, 15), &mut rng).unwrap();
        assert_eq!(
            dense
                .cells()
                .filter(|(_, cell)| cell.content == Content::Mine)
                .count(),
            15
        );
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let layout = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            Board::with_rng(params(10, 10, 10), &mut rng)
                .unwrap()
                .cells()
                .map(|(_, cell)| cell.content)
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(42), layout(42));
    }

    #[test]
    fn numbers_match_surrounding_mines() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::with_rng(params(10, 8, 20), &mut rng).unwrap();

        for (pos, cell) in board.cells() {
            if cell.content == Content::Mine {
                continue;
            }

            let mut expected = 0u8;
            for y in pos.y.saturating_sub(1)..=pos.y + 1 {
                for x in pos.x.saturating_sub(1)..=pos.x + 1 {
                    if (x, y) != (pos.x, pos.y)
                        && x < board.width()
                        && y < board.height()
                        && content(&board, x, y) == Content::Mine
                    {
                        expected += 1;
                    }
                }
            }

            let actual = match cell.content {
                Content::Empty => 0,
                Content::Number(n) => {
                    assert!(n > 0);
                    n
                }
                Content::Mine => unreachable!(),
            };
            assert_eq!(actual, expected, "wrong count at {pos:?}");
        }
    }

    #[test]
    fn neighbourhood_is_clipped_at_edges() {
        assert_eq!(neighbours(Pos::new(0, 0), 10, 10).count(), 3);
        assert_eq!(neighbours(Pos::new(9, 9), 10, 10).count(), 3);
        assert_eq!(neighbours(Pos::new(0, 5), 10, 10).count(), 5);
        assert_eq!(neighbours(Pos::new(5, 9), 10, 10).count(), 5);
        assert_eq!(neighbours(Pos::new(4, 4), 10, 10).count(), 8);
        assert_eq!(neighbours(Pos::new(0, 0), 1, 1).count(), 0);
        assert!(neighbours(Pos::new(4, 4), 10, 10).all(|p| p != Pos::new(4, 4)));
    }

    #[test]
    fn neighbourhood_of_degenerate_input_stays_on_the_board() {
        assert_eq!(neighbours(Pos::new(0, 0), 0, 5).count(), 0);
        assert_eq!(neighbours(Pos::new(0, 0), 5, 0).count(), 0);
        assert_eq!(neighbours(Pos::new(usize::MAX, usize::MAX), 3, 3).count(), 0);
        assert_eq!(
            neighbours(Pos::new(3, 3), 3, 3).collect::<Vec<_>>(),
            vec![Pos::new(2, 2)]
        );
    }

    #[test]
    fn corner_surrounded_by_mines_counts_three() {
        let board = Board::with_mines(
            params(3, 3, 3),
            &[Pos::new(1, 0), Pos::new(0, 1), Pos::new(1, 1)],
        )
        .unwrap();
        assert_eq!(content(&board, 0, 0), Content::Number(3));
        assert_eq!(content(&board, 2, 2), Content::Number(1));
        assert_eq!(content(&board, 2, 0), Content::Number(2));
    }

    #[test]
    fn explicit_layout_is_validated() {
        assert!(matches!(
            Board::with_mines(params(3, 3, 1), &[Pos::new(3, 0)]),
            Err(GameError::OutOfBounds { x: 3, y: 0, .. })
        ));
        assert!(matches!(
            Board::with_mines(params(3, 3, 2), &[Pos::new(1, 1), Pos::new(1, 1)]),
            Err(GameError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Board::with_mines(params(3, 3, 2), &[Pos::new(1, 1)]),
            Err(GameError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn revealing_a_number_opens_only_that_cell() {
        let mut board = centred_mine();
        assert_eq!(
            board.reveal(Pos::new(1, 1)).unwrap(),
            RevealOutcome::Continuing
        );

        let cell = board.cell(Pos::new(1, 1)).unwrap();
        assert!(cell.revealed);
        assert!(!cell.enabled);
        assert_eq!(board.count_unrevealed(), 24);
    }

    #[test]
    fn revealing_a_mine_loses() {
        let mut board = centred_mine();
        assert_eq!(board.reveal(Pos::new(2, 2)).unwrap(), RevealOutcome::Lost);
    }

    #[test]
    fn flood_reveal_opens_region_and_border_but_not_the_mine() {
        let mut board = centred_mine();
        assert_eq!(
            board.reveal(Pos::new(0, 0)).unwrap(),
            RevealOutcome::Continuing
        );

        for (pos, cell) in board.cells() {
            assert_eq!(cell.revealed, pos != Pos::new(2, 2), "at {pos:?}");
        }
        assert_eq!(board.count_unrevealed(), 1);
    }

    #[test]
    fn flood_reveal_stops_at_numbers() {
        // . 1 * 1 .
        // . 1 1 1 .
        // . . . . .
        // 1 1 . . .
        // * 1 . . .
        let mut board =
            Board::with_mines(params(5, 5, 2), &[Pos::new(2, 0), Pos::new(0, 4)]).unwrap();
        board.reveal(Pos::new(4, 4)).unwrap();

        assert!(!board.cell(Pos::new(2, 0)).unwrap().revealed);
        assert!(!board.cell(Pos::new(0, 4)).unwrap().revealed);
        // The left column above the bottom-left mine is reached through the
        // empty middle row.
        assert!(board.cell(Pos::new(0, 0)).unwrap().revealed);
        assert_eq!(board.count_unrevealed(), 2);
    }

    #[test]
    fn flood_reveal_releases_flags() {
        let mut board = centred_mine();
        board.toggle_mark(Pos::new(4, 4)).unwrap();
        board.toggle_mark(Pos::new(4, 3)).unwrap();
        board.toggle_mark(Pos::new(4, 3)).unwrap();
        assert_eq!(board.flags_remaining(), 0);

        board.reveal(Pos::new(0, 0)).unwrap();

        let flagged = board.cell(Pos::new(4, 4)).unwrap();
        assert!(flagged.revealed);
        assert_eq!(flagged.mark, Mark::None);
        assert!(board.cell(Pos::new(4, 3)).unwrap().revealed);
        assert_eq!(board.flagged(), 0);
        assert_eq!(board.flags_remaining(), 1);
    }

    #[test]
    fn flagged_cells_cannot_be_revealed_directly() {
        let mut board = centred_mine();
        board.toggle_mark(Pos::new(2, 2)).unwrap();
        assert_eq!(
            board.reveal(Pos::new(2, 2)).unwrap(),
            RevealOutcome::Continuing
        );
        assert!(!board.cell(Pos::new(2, 2)).unwrap().revealed);
        assert_eq!(board.count_unrevealed(), 25);
    }

    #[test]
    fn revealing_twice_is_a_no_op() {
        let mut board = centred_mine();
        board.reveal(Pos::new(1, 1)).unwrap();
        board.reveal(Pos::new(1, 1)).unwrap();
        assert_eq!(board.count_unrevealed(), 24);
    }

    #[test]
    fn toggle_mark_cycles_and_tracks_budget() {
        let mut board = centred_mine();
        let pos = Pos::new(0, 0);

        assert_eq!(board.toggle_mark(pos).unwrap(), Mark::Flagged);
        assert_eq!(board.flags_remaining(), 0);
        assert_eq!(board.toggle_mark(pos).unwrap(), Mark::Questioned);
        assert_eq!(board.flags_remaining(), 1);
        assert_eq!(board.toggle_mark(pos).unwrap(), Mark::None);
        assert_eq!(board.flags_remaining(), 1);

        board.toggle_mark(Pos::new(1, 0)).unwrap();
        board.toggle_mark(Pos::new(2, 0)).unwrap();
        assert_eq!(board.flags_remaining(), -1);
    }

    #[test]
    fn toggle_mark_ignores_revealed_cells() {
        let mut board = centred_mine();
        board.reveal(Pos::new(1, 1)).unwrap();
        assert_eq!(board.toggle_mark(Pos::new(1, 1)).unwrap(), Mark::None);
        assert_eq!(board.flags_remaining(), 1);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut board = centred_mine();
        let outside = Pos::new(5, 0);
        assert!(matches!(
            board.reveal(outside),
            Err(GameError::OutOfBounds { .. })
        ));
        assert!(matches!(
            board.toggle_mark(outside),
            Err(GameError::OutOfBounds { .. })
        ));
        assert!(board.cell(Pos::new(0, 5)).is_err());
    }

    #[test]
    fn reveal_all_and_disable_all() {
        let mut board = centred_mine();
        board.toggle_mark(Pos::new(0, 0)).unwrap();
        board.disable_all();
        assert!(board.cells().all(|(_, cell)| !cell.enabled));
        assert_eq!(board.count_unrevealed(), 25);

        board.reveal_all();
        assert_eq!(board.count_unrevealed(), 0);
        assert!(board.cells().all(|(_, cell)| cell.revealed));
        assert_eq!(board.flags_remaining(), 0);
    }
}
