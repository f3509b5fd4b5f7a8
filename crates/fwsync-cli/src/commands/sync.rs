use super::{json_pretty, style_note, style_updated, EXIT_SUCCESS};
use fwsync_core::{SyncOptions, Synchronizer};
use tracing::debug;

pub fn run(sync: &Synchronizer, dry_run: bool, json: bool) -> Result<u8, String> {
    let options = SyncOptions { dry_run };
    debug!(
        "repository root {}, url base {}",
        sync.layout().root().display(),
        sync.config().url_base()
    );

    if json {
        let report = sync.run(options).map_err(|e| e.to_string())?;
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    let verb = if dry_run { "Would update" } else { "Updated" };
    let report = sync
        .run_with(options, |outcome| {
            for note in &outcome.notes {
                println!("  {}", style_note(&format!("Note: {note}")));
            }
            println!(
                "{}",
                style_updated(&format!("{verb} {}", outcome.manifest_file_name()))
            );
        })
        .map_err(|e| e.to_string())?;
    if report.devices.is_empty() {
        println!("No device directories found; nothing to do.");
        return Ok(EXIT_SUCCESS);
    }

    println!();
    if dry_run {
        println!(
            "Done. {} manifest(s) would be updated ({} changed).",
            report.devices.len(),
            report.manifests_changed()
        );
    } else {
        println!("Done. {} manifest(s) updated.", report.manifests_written());
    }
    Ok(EXIT_SUCCESS)
}
