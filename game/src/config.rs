use std::{env, fmt::Display, str::FromStr};

use tracing::warn;

use minesweeper_common::models::GameParams;

/// How the front-end talks to whatever sits on the other end of stdio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable commands in, text board out.
    #[default]
    Text,
    /// `ClientMessage` JSON lines in, `ServerMessage` JSON lines out.
    Json,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output mode '{other}'")),
        }
    }
}

impl Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub params: GameParams,
    pub seed: Option<u64>,
    pub output: OutputMode,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

impl Config {
    /// Reads `MINESWEEPER_WIDTH`, `MINESWEEPER_HEIGHT`, `MINESWEEPER_MINES`,
    /// `MINESWEEPER_SEED` and `MINESWEEPER_OUTPUT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GameParams::default();

        let params = GameParams {
            width: parse_or(&lookup, "MINESWEEPER_WIDTH", defaults.width),
            height: parse_or(&lookup, "MINESWEEPER_HEIGHT", defaults.height),
            mines: parse_or(&lookup, "MINESWEEPER_MINES", defaults.mines),
        };

        let seed = lookup("MINESWEEPER_SEED").and_then(|raw| match raw.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!("Ignoring invalid MINESWEEPER_SEED={:?}", raw);
                None
            }
        });

        let output = parse_or(&lookup, "MINESWEEPER_OUTPUT", OutputMode::default());

        Self {
            params,
            seed,
            output,
        }
    }
}
