// Submission stage: find images in a folder and start one upload per image.
// Failed submissions are logged and dropped; only accepted uploads come back
// as pending operations for the reconciler.

use crate::api::{AssetApi, AssetUpload};
use crate::error::{Result, UploaderError};
use crate::model::{Item, PendingOperation};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

/// MIME type for a supported image file, matched on extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// List supported images directly inside `folder`, sorted by file name.
/// Each item is named `prefix + file stem`.
pub fn discover_items(folder: &Path, name_prefix: &str) -> Result<Vec<Item>> {
    if !folder.is_dir() {
        return Err(UploaderError::NotFound(folder.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && mime_type_for(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    // Names are output-file keys, so a stem shared by two files (`a.png`,
    // `a.jpg`) keeps only the first file in sorted order.
    let mut taken = HashSet::new();
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let name = format!("{}{}", name_prefix, stem);
        if !taken.insert(name.clone()) {
            tracing::warn!(name = %name, path = %path.display(), "Another file already uses this name, skipping");
            continue;
        }
        items.push(Item { name, path });
    }
    Ok(items)
}

pub struct Submitter<A> {
    api: A,
    pacing: Duration,
    show_progress: bool,
}

impl<A: AssetApi> Submitter<A> {
    /// The progress bar is only drawn when stderr is a terminal.
    pub fn new(api: A) -> Self {
        Self {
            api,
            pacing: Duration::from_millis(500),
            show_progress: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Pause between consecutive submissions.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Start the upload for one item. `None` means the item was skipped or
    /// the server did not accept it.
    pub fn submit(&self, item: &Item) -> Option<PendingOperation> {
        let Some(mime_type) = mime_type_for(&item.path) else {
            tracing::warn!(path = %item.path.display(), "Unsupported format, skipping");
            return None;
        };

        let upload = AssetUpload {
            display_name: item.name.clone(),
            path: item.path.clone(),
            mime_type,
        };

        match self.api.create_asset(&upload) {
            Ok(operation_url) => {
                tracing::info!(name = %item.name, operation_url = %operation_url, "Added to waitlist");
                Some(PendingOperation::new(item.name.clone(), operation_url))
            }
            Err(e) => {
                tracing::error!(name = %item.name, path = %item.path.display(), error = %e, "Upload failed");
                None
            }
        }
    }

    /// Submit every item in order and collect the accepted ones.
    pub fn submit_all(&self, items: &[Item]) -> Vec<PendingOperation> {
        let pb = progress_bar(items.len() as u64, self.show_progress);

        let mut waitlist = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            pb.set_message(item.name.clone());
            // log lines share stderr with the bar
            if let Some(op) = pb.suspend(|| self.submit(item)) {
                waitlist.push(op);
            }
            pb.inc(1);
            if i + 1 < items.len() && !self.pacing.is_zero() {
                std::thread::sleep(self.pacing);
            }
        }
        pb.finish_and_clear();

        tracing::info!(submitted = items.len(), accepted = waitlist.len(), "Submission finished");
        waitlist
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        pb.set_style(style);
    }
    pb
}
