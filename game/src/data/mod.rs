/// True content of a cell, fixed once the board is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    Empty,
    Number(u8),
    Mine,
}

/// Player annotation on an unrevealed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    None,
    Flagged,
    Questioned,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub content: Content,
    pub mark: Mark,
    pub revealed: bool,
    pub enabled: bool,
}

impl Cell {
    pub(crate) fn new(content: Content) -> Self {
        Self {
            content,
            mark: Mark::None,
            revealed: false,
            enabled: true,
        }
    }
}

/// Row-major grid of cells plus the counters the game rules need.
#[derive(Debug)]
pub struct Board {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) mines: usize,
    pub(crate) flagged: usize,
    pub(crate) revealed: usize,
    pub(crate) cells: Vec<Cell>,
}
