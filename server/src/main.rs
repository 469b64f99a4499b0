use clap::Parser;
use log::info;
use server::game::run_game_loop;
use server::lobby::Lobby;
use server::session::Session;
use shared::world::World;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Path to the world grid file (one row per line)
    #[arg(short, long, default_value = "world.txt")]
    world: PathBuf,

    /// Initial tick interval in milliseconds
    #[arg(short, long, default_value_t = shared::INITIAL_TICK_MS)]
    tick: u64,

    /// Head start for players before the monster moves, in seconds
    #[arg(short, long, default_value_t = 3.0)]
    grace: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let world = Arc::new(World::load(&args.world)?);
    info!(
        "loaded {}x{} world from {}",
        world.size(),
        world.size(),
        args.world.display()
    );

    let session = Session::shared(world);
    let lobby = Lobby::bind(&format!("{}:{}", args.host, args.port), Arc::clone(&session)).await?;

    lobby.run().await?;
    run_game_loop(session, args.tick, Duration::from_secs_f32(args.grace)).await;

    Ok(())
}
