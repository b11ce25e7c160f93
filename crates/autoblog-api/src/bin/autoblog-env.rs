//! autoblog-env: adds placeholder webhook settings to a `.env` file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use autoblog_api::env_file::add_webhook_placeholders;

#[derive(Parser)]
#[command(name = "autoblog-env")]
#[command(
    author,
    version,
    about = "Adds WEBHOOK_URL and WEBHOOK_SECRET to the .env file if they do not exist."
)]
struct Cli {
    /// Path of the .env file to update
    #[arg(short, long, default_value = ".env")]
    env_file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match add_webhook_placeholders(&cli.env_file) {
        Ok(update) if update.changed() => {
            println!("WEBHOOK_URL and WEBHOOK_SECRET added to .env file.");
            ExitCode::SUCCESS
        }
        Ok(_) => {
            println!("WEBHOOK_URL and WEBHOOK_SECRET already exist in .env file.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
