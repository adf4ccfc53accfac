// UI layer: a simple interactive menu using `dialoguer`, plus the summary
// printed after each run. The flows are small and synchronous; all real
// work happens in `run`.

use crate::api::AssetApi;
use crate::config::Config;
use crate::error::UploaderError;
use crate::run::{run_retry, run_upload, RunReport};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use std::path::PathBuf;

/// Main interactive menu. Runs until the user chooses "Exit".
pub fn main_menu<A: AssetApi>(api: A, config: &Config) -> Result<()> {
    loop {
        let items = vec!["Upload images from a folder", "Retry failed polls", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => upload_flow(&api, config)?,
            1 => retry_flow(&api, config)?,
            2 => break,
            _ => {}
        }
    }
    Ok(())
}

/// Upload the configured folder, asking for one when none is set.
pub fn upload_flow<A: AssetApi>(api: A, config: &Config) -> Result<()> {
    let folder = match &config.upload_folder {
        Some(folder) => folder.clone(),
        None => match choose_folder()? {
            Some(folder) => folder,
            None => {
                println!("No folder selected.");
                return Ok(());
            }
        },
    };

    match run_upload(api, config, &folder) {
        Ok(report) => print_summary(&report),
        Err(UploaderError::NotFound(path)) => {
            tracing::error!(folder = %path.display(), "Folder not found");
            println!("{} Folder '{}' not found.", "[ERROR]".red(), path.display());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Re-poll operations recorded by an earlier run.
pub fn retry_flow<A: AssetApi>(api: A, config: &Config) -> Result<()> {
    match run_retry(api, config) {
        Ok(report) => print_summary(&report),
        Err(UploaderError::NotFound(path)) => {
            tracing::error!(path = %path.display(), "Failed-polls file not found");
            println!("{} File not found: {}", "[ERROR]".red(), path.display());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Ask for a folder, either typed in or picked with the native dialog.
fn choose_folder() -> Result<Option<PathBuf>> {
    let choices = vec!["Type a path", "Browse...", "Cancel"];
    match Select::new().items(&choices).default(0).interact()? {
        0 => {
            let path: String = Input::new().with_prompt("Folder path").interact_text()?;
            Ok(Some(crate::config::expand_home(path.trim())))
        }
        1 => Ok(rfd::FileDialog::new().pick_folder()),
        _ => Ok(None),
    }
}

fn print_summary(report: &RunReport) {
    let outcome = &report.outcome;
    if outcome.total() == 0 && report.resolved_file.is_none() {
        println!("Nothing to do.");
        return;
    }

    println!("\n=== Upload Summary ===");
    for (name, asset_id) in outcome.resolved.iter() {
        println!("{} {} => {}", "[SUCCESS]".green(), name, asset_id);
    }
    for op in &outcome.unresolved {
        println!("{} {} (still processing)", "[FAILED]".yellow(), op.name);
    }
    for name in &outcome.errored {
        println!("{} {} (no asset id returned)", "[ERROR]".red(), name);
    }

    if let Some(path) = &report.resolved_file {
        println!("\nSaved {} asset ids to '{}'", outcome.resolved.len(), path.display());
    }
    match &report.unresolved_file {
        Some(path) => println!(
            "{} {} operations still pending, saved to '{}'",
            "[WARNING]".yellow(),
            outcome.unresolved.len(),
            path.display()
        ),
        None => println!("{}", "All polled operations finished.".green()),
    }
}
