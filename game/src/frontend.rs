//! Line-oriented driver for a [`Game`].
//!
//! One task owns the session and multiplexes player input with a periodic
//! tick, so every mutation happens on the same task in the order it arrives.

use std::{str::FromStr, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    time::{self, Instant},
};
use tracing::{debug, info, instrument, warn};

use minesweeper_common::{
    models::{CellView, GameStatus, Pos},
    protocol::{ClientMessage, ServerMessage},
};

use crate::{
    config::OutputMode,
    error::GameError,
    game::{Game, InputOutcome},
    render::{diff, render_text},
};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Game(#[from] GameError),

    #[error("unrecognised command '{0}'")]
    Command(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reveal(Pos),
    Flag(Pos),
    Restart,
    Quit,
}

impl From<ClientMessage> for Command {
    fn from(value: ClientMessage) -> Self {
        match value {
            ClientMessage::Reveal { pos } => Self::Reveal(pos),
            ClientMessage::Flag { pos } => Self::Flag(pos),
            ClientMessage::Restart => Self::Restart,
        }
    }
}

impl FromStr for Command {
    type Err = FrontendError;

    /// Accepts `r X Y`, `reveal X Y`, `f X Y`, `flag X Y`, `reset`,
    /// `restart`, `q`, `quit` and `exit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognised = || FrontendError::Command(s.trim().to_string());
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or_else(unrecognised)?.to_ascii_lowercase();

        let mut pos = || -> Result<Pos, FrontendError> {
            let x = words.next().and_then(|w| w.parse().ok());
            let y = words.next().and_then(|w| w.parse().ok());
            match (x, y, words.next()) {
                (Some(x), Some(y), None) => Ok(Pos { x, y }),
                _ => Err(unrecognised()),
            }
        };

        match verb.as_str() {
            "r" | "reveal" => Ok(Self::Reveal(pos()?)),
            "f" | "flag" => Ok(Self::Flag(pos()?)),
            "reset" | "restart" => Ok(Self::Restart),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            _ => Err(unrecognised()),
        }
    }
}

fn parse_line(line: &str, mode: OutputMode) -> Result<Command, FrontendError> {
    match mode {
        OutputMode::Text => line.parse(),
        OutputMode::Json => match line.trim().to_ascii_lowercase().as_str() {
            "quit" | "exit" => Ok(Command::Quit),
            _ => Ok(serde_json::from_str::<ClientMessage>(line)?.into()),
        },
    }
}

/// Writes game state to the output in the configured format.
struct Presenter<W> {
    writer: W,
    mode: OutputMode,
    last: Vec<CellView>,
}

impl<W: AsyncWrite + Unpin> Presenter<W> {
    async fn send(&mut self, message: &ServerMessage) -> Result<(), FrontendError> {
        let mut text = serde_json::to_string(message)?;
        text.push('\n');
        self.writer.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn init(&mut self, game: &Game) -> Result<(), FrontendError> {
        self.last = game.snapshot();
        match self.mode {
            OutputMode::Text => {
                self.writer
                    .write_all(render_text(game).as_bytes())
                    .await?;
            }
            OutputMode::Json => {
                let params = game.params();
                self.send(&ServerMessage::Init {
                    width: params.width,
                    height: params.height,
                    mines: params.mines,
                    flags_remaining: game.flags_remaining(),
                    elapsed: game.elapsed_display(),
                    field: game.field(),
                })
                .await?;
            }
        }
        self.writer.flush().await?;
        Ok(())
    }

    async fn update(&mut self, game: &Game, outcome: InputOutcome) -> Result<(), FrontendError> {
        let snapshot = game.snapshot();
        let updates = diff(&self.last, &snapshot);
        self.last = snapshot;

        match self.mode {
            OutputMode::Text => {
                if outcome != InputOutcome::Ignored {
                    self.writer
                        .write_all(render_text(game).as_bytes())
                        .await?;
                }
                if let Some(notification) = outcome.notification() {
                    self.writer
                        .write_all(format!("{notification}\n").as_bytes())
                        .await?;
                }
            }
            OutputMode::Json => {
                if !updates.is_empty() || outcome.notification().is_some() {
                    self.send(&ServerMessage::Update {
                        updates,
                        flags_remaining: game.flags_remaining(),
                        won: outcome == InputOutcome::Won,
                        lost: outcome == InputOutcome::Lost,
                    })
                    .await?;
                }
            }
        }
        self.writer.flush().await?;
        Ok(())
    }

    async fn tick(&mut self, game: &Game) -> Result<(), FrontendError> {
        if self.mode == OutputMode::Json {
            self.send(&ServerMessage::Tick {
                elapsed: game.elapsed_display(),
            })
            .await?;
            self.writer.flush().await?;
        }
        Ok(())
    }

    async fn error(&mut self, error: &FrontendError) -> Result<(), FrontendError> {
        match self.mode {
            OutputMode::Text => {
                self.writer
                    .write_all(format!("error: {error}\n").as_bytes())
                    .await?;
            }
            OutputMode::Json => {
                self.send(&ServerMessage::Error {
                    message: error.to_string(),
                })
                .await?;
            }
        }
        self.writer.flush().await?;
        Ok(())
    }
}

/// Starts `game` (unless it is already running) and plays it until the
/// input ends or a quit command arrives. The clock ticks every `tick` while
/// the game is in progress.
#[instrument(level = "trace", skip(game, reader, writer))]
pub async fn run<R, W>(
    mut game: Game,
    mode: OutputMode,
    reader: R,
    writer: W,
    tick: Duration,
) -> Result<Game, FrontendError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut presenter = Presenter {
        writer,
        mode,
        last: Vec::new(),
    };

    if game.status() == GameStatus::NotStarted {
        game.start()?;
    }
    presenter.init(&game).await?;

    let mut lines = reader.lines();
    let mut ticker = time::interval_at(Instant::now() + tick, tick);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match parse_line(&line, mode) {
                    Ok(command) => command,
                    Err(e) => {
                        warn!("Rejected input {:?}: {}", line, e);
                        presenter.error(&e).await?;
                        continue;
                    }
                };

                // `None` marks a restart, which redraws the whole board.
                let result = match command {
                    Command::Quit => {
                        info!("Player quit");
                        break;
                    }
                    Command::Reveal(pos) => game.on_primary_input(pos).map(Some),
                    Command::Flag(pos) => game.on_secondary_input(pos).map(Some),
                    Command::Restart => game.reset().map(|()| None),
                };

                match result {
                    Ok(Some(outcome)) => presenter.update(&game, outcome).await?,
                    Ok(None) => {
                        debug!("Restarted");
                        presenter.init(&game).await?;
                    }
                    Err(e) => {
                        warn!("Rejected {:?}: {}", command, e);
                        presenter.error(&FrontendError::from(e)).await?;
                    }
                }
            }
            _ = ticker.tick() => {
                if game.on_tick() {
                    presenter.tick(&game).await?;
                }
            }
        }
    }

    presenter.writer.flush().await?;
    Ok(game)
}
