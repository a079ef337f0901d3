mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{call::CallArgs, client::ClientArgs, serve::ServeArgs};

#[derive(Parser)]
#[command(
    name = "portal",
    about = "Learning portal backend-for-frontend — run the server or talk to one",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the BFF HTTP server
    Serve(ServeArgs),

    /// Show the session the BFF resolves for these credentials
    Session {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Send one request to a BFF route and print the response
    Call {
        #[command(flatten)]
        client: ClientArgs,
        #[command(flatten)]
        call: CallArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => cmd::serve::run(args),
        Commands::Session { client } => cmd::session::run(&client, cli.json),
        Commands::Call { client, call } => cmd::call::run(&client, call),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
