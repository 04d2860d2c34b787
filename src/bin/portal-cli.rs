use clap::{Parser, Subcommand};
use portal_sdk::{resolve_api_base, ApiError, Payload, PortalClient};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(about = "Command-line client for the customer portal gateway", long_about = None)]
struct Cli {
    /// Gateway base URL (defaults to PORTAL_API_BASE, then PORTAL_GATEWAY_URL).
    #[arg(short, long)]
    url: Option<String>,

    /// Bearer token.
    #[arg(short, long, env = "PORTAL_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your vehicles
    Vehicles,
    /// Show your service history
    History,
    /// Show your customer profile
    Me,
    /// GET an arbitrary gateway path
    Get { path: String },
    /// POST a JSON body to a gateway path
    Post { path: String, body: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let base = cli.url.unwrap_or_else(resolve_api_base);
    let mut client = PortalClient::new(&base);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    let result = match cli.command {
        Commands::Vehicles => client.vehicles().await,
        Commands::History => client.history().await,
        Commands::Me => client.me().await,
        Commands::Get { path } => client.get(&path).await,
        Commands::Post { path, body } => {
            let body: Value = serde_json::from_str(&body)?;
            client.post(&path, &body).await
        }
    };

    print_result(result)
}

fn print_result(result: Result<Option<Payload>, ApiError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(None) => println!("(no content)"),
        Ok(Some(Payload::Json(json))) => println!("{}", serde_json::to_string_pretty(&json)?),
        Ok(Some(Payload::Text(text))) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
