use std::fmt::Write;

use minesweeper_common::{
    models::{self, CellView, GameStatus},
    protocol::CellUpdate,
};

use crate::{
    data::{Cell, Content, Mark},
    game::Game,
};

impl From<&Cell> for models::Cell {
    fn from(value: &Cell) -> Self {
        if value.revealed {
            return match value.content {
                Content::Empty => Self::Empty,
                Content::Number(adjacent) => Self::Number { adjacent },
                Content::Mine => Self::Mine,
            };
        }

        match value.mark {
            Mark::None => Self::Hidden,
            Mark::Flagged => Self::Flagged,
            Mark::Questioned => Self::Questioned,
        }
    }
}

pub fn glyph(cell: models::Cell) -> char {
    match cell {
        models::Cell::Hidden => '#',
        models::Cell::Flagged => 'F',
        models::Cell::Questioned => '?',
        models::Cell::Empty => '.',
        models::Cell::Number { adjacent } => char::from(b'0' + adjacent.min(9)),
        models::Cell::Mine => '*',
    }
}

fn status_label(status: GameStatus) -> &'static str {
    match status {
        GameStatus::NotStarted => "not started",
        GameStatus::InProgress => "in progress",
        GameStatus::Won => "won",
        GameStatus::Lost => "lost",
    }
}

/// Plain-text board with a header line and column/row indices.
///
/// ```text
/// flags: 10  time: 00:00  in progress
///    0 1 2
///  0 # # #
///  1 # F #
///  2 . 1 #
/// ```
pub fn render_text(game: &Game) -> String {
    let params = game.params();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "flags: {}  time: {}  {}",
        game.flags_remaining(),
        game.elapsed_display(),
        status_label(game.status())
    );

    out.push_str("  ");
    for x in 0..params.width {
        let _ = write!(out, " {}", x % 10);
    }
    out.push('\n');

    for (y, row) in game.field().iter().enumerate() {
        let _ = write!(out, "{:>2}", y);
        for cell in row {
            out.push(' ');
            out.push(glyph(*cell));
        }
        out.push('\n');
    }

    out
}

/// Cells whose displayed value differs between two snapshots of the same
/// board. A snapshot of a different size counts as entirely changed.
pub fn diff(before: &[CellView], after: &[CellView]) -> Vec<CellUpdate> {
    if before.len() != after.len() {
        return after
            .iter()
            .map(|view| CellUpdate {
                pos: view.pos,
                value: view.value,
            })
            .collect();
    }

    before
        .iter()
        .zip(after)
        .filter(|(old, new)| old.value != new.value)
        .map(|(_, new)| CellUpdate {
            pos: new.pos,
            value: new.value,
        })
        .collect()
}
