use clap::{Parser, Subcommand};

use meditation_service::config::AppConfig;
use meditation_service::serve::serve_meditations;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Guided-meditation catalog and asset-generation API"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the meditation API over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Serve { port } => {
            let config = AppConfig::from_env();
            if let Err(e) = serve_meditations(config, port) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
