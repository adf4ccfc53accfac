// The two batch entry points: a fresh upload of a folder, and a retry of
// operations left unresolved by an earlier run.

use crate::api::AssetApi;
use crate::config::{output_file_for, Config};
use crate::error::Result;
use crate::model::BatchOutcome;
use crate::poll::Poller;
use crate::reconcile::reconcile;
use crate::store;
use crate::submit::{discover_items, Submitter};
use std::path::{Path, PathBuf};

/// What a run produced and which files it left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: BatchOutcome,
    pub resolved_file: Option<PathBuf>,
    pub unresolved_file: Option<PathBuf>,
}

/// Upload every supported image in `folder`, poll the resulting operations
/// and persist both partitions. A folder without images writes nothing.
pub fn run_upload<A: AssetApi>(api: A, config: &Config, folder: &Path) -> Result<RunReport> {
    let items = discover_items(folder, &config.name_prefix)?;
    if items.is_empty() {
        tracing::info!(folder = %folder.display(), "No image files found");
        return Ok(RunReport::default());
    }
    tracing::info!(count = items.len(), folder = %folder.display(), "Uploading images");

    let waitlist = Submitter::new(&api)
        .with_pacing(config.submit_pacing)
        .submit_all(&items);

    let poller = Poller::new(&api, config.backoff);
    let outcome = reconcile(&poller, waitlist);

    let resolved_file = config.output_dir.join(output_file_for(folder));
    persist(outcome, resolved_file, &config.failed_polls_file)
}

/// Poll the operations recorded in the failed-polls file again. A missing
/// file fails the run before anything is written.
pub fn run_retry<A: AssetApi>(api: A, config: &Config) -> Result<RunReport> {
    let waitlist = store::load_pending(&config.failed_polls_file)?;

    let poller = Poller::new(&api, config.backoff);
    let outcome = reconcile(&poller, waitlist);

    persist(outcome, config.retried_file.clone(), &config.still_failed_file)
}

fn persist(outcome: BatchOutcome, resolved_file: PathBuf, unresolved_path: &Path) -> Result<RunReport> {
    store::save_resolved(&resolved_file, &outcome.resolved)?;

    let unresolved_file = if store::save_unresolved(unresolved_path, &outcome.unresolved)? {
        Some(unresolved_path.to_path_buf())
    } else {
        tracing::info!("No unresolved operations left");
        None
    };

    Ok(RunReport {
        outcome,
        resolved_file: Some(resolved_file),
        unresolved_file,
    })
}
