//! boreal-provision: factory provisioning tool for field devices.
//!
//! Runs on the provisioning bench: derives the factory token for a device id
//! and prints the QR setup URL. The raw factory token stays on the bench —
//! it is never embedded in the URL and is only printed on explicit request.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use boreal_core::defaults::SETUP_BASE_URL;
use boreal_core::token::{derive_factory_token, derive_factory_token_hash, setup_url};

#[derive(Parser)]
#[command(name = "boreal-provision")]
#[command(author, version, about = "Factory provisioning for boreal devices")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the QR setup URL for a device
    Url {
        /// Device identifier (assigned at manufacture)
        #[arg(short, long)]
        device_id: String,

        /// Base URL of the setup page
        #[arg(short, long, default_value = SETUP_BASE_URL)]
        base_url: String,
    },

    /// Print the derived values for a device (bench diagnostics)
    Derive {
        /// Device identifier
        #[arg(short, long)]
        device_id: String,

        /// Also print the raw factory token (sensitive)
        #[arg(long)]
        show_token: bool,
    },
}

fn factory_secret() -> Result<String, ExitCode> {
    std::env::var("FACTORY_SECRET").map_err(|_| {
        eprintln!("Error: FACTORY_SECRET environment variable is not set");
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let secret = match factory_secret() {
        Ok(s) => s,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Url {
            device_id,
            base_url,
        } => {
            println!("{}", setup_url(&base_url, &device_id, &secret));
        }
        Commands::Derive {
            device_id,
            show_token,
        } => {
            let token = derive_factory_token(&device_id, &secret);
            let fth = derive_factory_token_hash(&token);
            println!("device_id:          {}", device_id);
            println!("factory_token_hash: {}", fth);
            if show_token {
                println!("factory_token:      {}", token);
            }
        }
    }

    ExitCode::SUCCESS
}
