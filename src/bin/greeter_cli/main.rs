//! greeter-cli: command-line client for the greeting REST API.

mod args;

use std::process::ExitCode;

use clap::Parser;
use greeter::application::ports::{ExternalGreetingClient, RemoteError};
use greeter::domain::greeting::{Greeting, parse_greeting_id};
use greeter::infra::remote::HttpGreetingClient;
use thiserror::Error;

use args::{Cli, Commands};

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("greeting {0} not found")]
    NotFound(String),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = HttpGreetingClient::new(&cli.url)?;

    let greeting = match cli.command {
        Commands::Create { name } => client.create_remote_greeting(&name).await?,
        Commands::Get { id } => {
            let parsed =
                parse_greeting_id(&id).map_err(|err| CliError::InvalidInput(err.to_string()))?;
            client
                .fetch_greeting(parsed)
                .await?
                .ok_or(CliError::NotFound(id))?
        }
    };

    print_greeting(&greeting, cli.json)
}

fn print_greeting(greeting: &Greeting, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(greeting)?);
    } else {
        println!("{}\t{}", greeting.id, greeting.message);
    }
    Ok(())
}
