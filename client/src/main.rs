use clap::Parser;
use client::network::Client;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server host to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to connect to
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Player count to request if this client is the host (1-4)
    #[arg(short = 'n', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=shared::MAX_PLAYERS as i64))]
    players: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("Controls: up/down/left/right or w/a/s/d, one move per line");

    let addr = format!("{}:{}", args.host, args.port);
    let mut client = match Client::connect(&addr, args.players).await {
        Ok(client) => client,
        Err(e) => {
            // Keep the operator-facing message generic; the details go to the log.
            error!("connect to {} failed: {}", addr, e);
            eprintln!("There was an error connecting to the server.");
            return Ok(());
        }
    };

    client.run().await?;
    Ok(())
}
