use minesweeper_game::{
    config::Config,
    frontend::{self, TICK_INTERVAL},
    game::Game,
};
use tokio::io::{self, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    info!(
        "💣 Starting Minesweeper: {}x{} with {} mines, {} output",
        config.params.width, config.params.height, config.params.mines, config.output
    );

    let game = match config.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Game::with_seed(config.params, seed)?
        }
        None => Game::new(config.params)?,
    };

    let game = frontend::run(
        game,
        config.output,
        BufReader::new(io::stdin()),
        io::stdout(),
        TICK_INTERVAL,
    )
    .await?;

    info!(
        "Session ended: {:?} after {}",
        game.status(),
        game.elapsed_display()
    );
    Ok(())
}
