use clap::Parser;
use log::{error, info};
use server::game::GameSettings;
use server::network::Server;
use shared::{BLOCK_CHANCE, GRID_HEIGHT, GRID_WIDTH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Probability that a board cell is blocked
    #[arg(short, long, default_value_t = BLOCK_CHANCE, value_parser = parse_chance)]
    block_chance: f64,

    /// Seed for reproducible board layouts
    #[arg(short, long)]
    seed: Option<u64>,
}

fn parse_chance(raw: &str) -> Result<f64, String> {
    let chance: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&chance) {
        Ok(chance)
    } else {
        Err(format!("{} is not between 0 and 1", chance))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let settings = GameSettings {
        width: GRID_WIDTH,
        height: GRID_HEIGHT,
        block_chance: args.block_chance,
        seed: args.seed,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, settings).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
