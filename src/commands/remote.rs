//! `medex remote ls` command

use std::path::Path;

use medex_core::config::Config;
use medex_core::error::{MedexError, Result};
use medex_core::pathlike::gdrive::{GDriveConfig, GDriveRoot};
use medex_core::pathlike::local::LocalRoot;
use medex_core::pathlike::{ListedFile, PathLike};

use crate::cli::{Cli, RemoteLsArgs};

pub fn ls(cli: &Cli, args: &RemoteLsArgs) -> Result<()> {
    if args.local {
        let root = LocalRoot::new(Path::new(&args.locator))?;
        return print_listing(cli, &root, args.flat);
    }

    let config = Config::discover(&cli.collection)?;
    let api_key = args
        .api_key
        .clone()
        .or(config.gdrive.api_key)
        .ok_or_else(|| {
            MedexError::Usage(
                "a Google Drive API key is required; pass --api-key or set [gdrive] api_key"
                    .to_string(),
            )
        })?;
    let mut drive_config = GDriveConfig::new(api_key);
    if let Some(seconds) = config.gdrive.timeout_seconds {
        drive_config = drive_config.with_timeout_seconds(seconds);
    }
    let root = GDriveRoot::new(drive_config, &args.locator)?;
    print_listing(cli, &root, args.flat)
}

fn print_listing<B: PathLike>(cli: &Cli, root: &B, flat: bool) -> Result<()> {
    let mut count = 0usize;
    for file in root.list_files(!flat) {
        let ListedFile { path, entry } = file?;
        if entry.is_container {
            println!("{}/", path);
        } else {
            println!("{}", path);
            count += 1;
        }
    }
    if !cli.quiet {
        eprintln!("{} files", count);
    }
    Ok(())
}
