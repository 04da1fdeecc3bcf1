//! `medex export` command
//!
//! Builds the remote exclusion set first (when requested), then streams
//! the export with batched progress on stderr. Ctrl-C cancels between
//! batches; files already copied stay on disk.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use medex_core::collection::Collection;
use medex_core::config::Config;
use medex_core::error::{MedexError, Result};
use medex_core::export::{self, ExportProgress, MediaExporter, DEFAULT_PROGRESS_BATCH};
use medex_core::pathlike::gdrive::{GDriveConfig, GDriveRoot};
use medex_core::pathlike::PathLike;

use crate::cli::{Cli, ExportArgs};

/// Remote entries between progress lines while building the exclusion set
const REMOTE_WALK_PROGRESS_STEP: usize = 100;

pub fn execute(cli: &Cli, args: &ExportArgs) -> Result<()> {
    let collection = Collection::open(&cli.collection)?;
    let config = Config::discover(collection.root())?;

    let cancel = install_cancel_flag();

    let excluded = match &args.exclude_remote {
        Some(locator) => {
            let names = build_exclusion_set(cli, args, &config, locator, &cancel)?;
            if cancel.load(Ordering::Relaxed) {
                println!("cancelled media export");
                return Ok(());
            }
            names
        }
        None => HashSet::new(),
    };

    let audio_only = args.audio_only || config.export.audio_only;
    let field = args
        .field
        .clone()
        .or_else(|| config.export.search_in_field.clone());
    let batch = args
        .batch
        .or(config.export.progress_batch)
        .unwrap_or(DEFAULT_PROGRESS_BATCH);
    let include_subdecks = !args.no_subdecks;

    let note_total = collection.note_count(&args.deck, include_subdecks)?;
    debug!(deck = %args.deck, note_total, "starting export");

    let exporter = MediaExporter::new(collection.media_dir(), &args.to)
        .audio_only(audio_only)
        .with_excluded(excluded)
        .with_field(field);
    let run = exporter.export(collection.notes(&args.deck, include_subdecks)?)?;

    let quiet = cli.quiet;
    let mut progress = |p: ExportProgress| {
        if !quiet {
            eprintln!(
                "processed {}/{} notes, exported {} files",
                p.notes_processed, p.note_total, p.files_exported
            );
        }
    };
    let summary = export::drive(run, note_total, batch, &mut progress, &cancel)?;

    if summary.cancelled {
        println!(
            "cancelled media export after {} files",
            summary.files_exported
        );
    } else {
        println!("exported {} media files", summary.files_exported);
    }
    Ok(())
}

fn install_cancel_flag() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }
    cancel
}

/// Walk the remote tree and collect every leaf filename
///
/// A backend failure aborts the export before anything is copied.
fn build_exclusion_set(
    cli: &Cli,
    args: &ExportArgs,
    config: &Config,
    locator: &str,
    cancel: &AtomicBool,
) -> Result<HashSet<String>> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.gdrive.api_key.clone())
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

    let root = GDriveRoot::new(drive_config, locator)?;
    let mut names = HashSet::new();
    for (count, file) in root.list_files(true).enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Ok(names);
        }
        let file = file?;
        if !cli.quiet && count % REMOTE_WALK_PROGRESS_STEP == 0 {
            eprintln!("looking up remote files... found {}", count);
        }
        names.insert(file.entry.name);
    }
    debug!(excluded = names.len(), "remote exclusion set built");
    Ok(names)
}
