//! Command dispatch

mod export;
mod remote;

use medex_core::error::Result;

use crate::cli::{Cli, Commands, RemoteCommands};

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Export(args) => export::execute(cli, args),
        Commands::Remote {
            command: RemoteCommands::Ls(args),
        } => remote::ls(cli, args),
    }
}
