//! Command-line surface for `greeter-cli`.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "greeter-cli", version, about = "Talk to a running greeting service", long_about = None)]
pub struct Cli {
    /// Service base URL, e.g. <http://127.0.0.1:3000>
    #[arg(long, env = "GREETER_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Print the raw JSON instead of the greeting message.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a greeting for NAME
    Create {
        /// Name to greet
        name: String,
    },
    /// Fetch a greeting by id
    Get {
        /// Greeting id (UUID)
        id: String,
    },
}
