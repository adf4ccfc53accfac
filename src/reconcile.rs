// Drives the poller over a whole waitlist and partitions the outcomes.

use crate::api::AssetApi;
use crate::model::{BatchOutcome, PendingOperation, Resolution};
use crate::poll::Poller;

/// Poll every operation once, in order, and sort the results into
/// resolved, still-pending and dropped. One item's failure never stops
/// the rest of the batch.
pub fn reconcile<A: AssetApi>(poller: &Poller<A>, waitlist: Vec<PendingOperation>) -> BatchOutcome {
    let total = waitlist.len();
    tracing::info!(count = total, "Polling waitlisted operations");

    let mut outcome = BatchOutcome::default();
    for (i, op) in waitlist.into_iter().enumerate() {
        tracing::debug!(name = %op.name, position = i + 1, total, "Polling operation");
        match poller.poll(&op) {
            Resolution::Resolved { asset_id } => {
                if outcome.resolved.contains(&op.name) {
                    tracing::warn!(name = %op.name, "Duplicate name in batch, replacing earlier asset id");
                }
                outcome.resolved.insert(op.name, asset_id);
            }
            Resolution::Unresolved(pending) => {
                tracing::warn!(name = %pending.name, "Could not get asset id, keeping for a later retry");
                outcome.unresolved.push(pending);
            }
            Resolution::Errored { reason } => {
                tracing::error!(name = %op.name, reason = %reason, "Dropping operation");
                outcome.errored.push(op.name);
            }
        }
    }

    tracing::info!(
        resolved = outcome.resolved.len(),
        unresolved = outcome.unresolved.len(),
        errored = outcome.errored.len(),
        "Reconciliation finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssetUpload, OperationStatus};
    use crate::error::{Result, UploaderError};
    use crate::poll::BackoffPolicy;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Answers by operation URL; each URL has its own script.
    struct ByUrl {
        scripts: RefCell<HashMap<String, Vec<Option<&'static str>>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ByUrl {
        // `Some(id)` = done with id, `None` = pending, "" = done without id
        fn new(entries: &[(&str, Vec<Option<&'static str>>)]) -> Self {
            Self {
                scripts: RefCell::new(
                    entries
                        .iter()
                        .map(|(url, s)| (url.to_string(), s.iter().rev().cloned().collect()))
                        .collect(),
                ),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl AssetApi for ByUrl {
        fn create_asset(&self, _upload: &AssetUpload) -> Result<String> {
            unreachable!()
        }

        fn get_operation(&self, url: &str) -> Result<OperationStatus> {
            self.calls.borrow_mut().push(url.to_string());
            let next = self
                .scripts
                .borrow_mut()
                .get_mut(url)
                .and_then(|s| s.pop())
                .ok_or_else(|| UploaderError::Http { status: 404, body: String::new() })?;
            Ok(match next {
                None => OperationStatus::Pending,
                Some("") => OperationStatus::Done { asset_id: None },
                Some(id) => OperationStatus::Done { asset_id: Some(id.to_string()) },
            })
        }
    }

    fn quick_policy(attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: attempts,
            initial_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn test_partitions_every_item_exactly_once() {
        let api = ByUrl::new(&[
            ("u/a", vec![Some("1")]),
            ("u/b", vec![None, None, None]),
            ("u/c", vec![Some("")]),
            ("u/d", vec![None, Some("4")]),
        ]);
        let poller = Poller::new(&api, quick_policy(3)).with_sleeper(|_| {});
        let waitlist = vec![
            PendingOperation::new("a", "u/a"),
            PendingOperation::new("b", "u/b"),
            PendingOperation::new("c", "u/c"),
            PendingOperation::new("d", "u/d"),
        ];

        let outcome = reconcile(&poller, waitlist);

        assert_eq!(outcome.total(), 4);
        let resolved: Vec<(&str, &str)> = outcome.resolved.iter().collect();
        assert_eq!(resolved, vec![("a", "1"), ("d", "4")]);
        assert_eq!(outcome.unresolved, vec![PendingOperation::new("b", "u/b")]);
        assert_eq!(outcome.errored, vec!["c".to_string()]);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        // unknown URLs answer 404 every time
        let api = ByUrl::new(&[("u/ok", vec![Some("9")])]);
        let poller = Poller::new(&api, quick_policy(2)).with_sleeper(|_| {});
        let waitlist = vec![
            PendingOperation::new("gone", "u/gone"),
            PendingOperation::new("ok", "u/ok"),
        ];

        let outcome = reconcile(&poller, waitlist);

        assert_eq!(outcome.resolved.get("ok"), Some("9"));
        assert_eq!(outcome.unresolved, vec![PendingOperation::new("gone", "u/gone")]);
        assert_eq!(
            *api.calls.borrow(),
            vec!["u/gone".to_string(), "u/gone".to_string(), "u/ok".to_string()]
        );
    }

    #[test]
    fn test_empty_waitlist() {
        let api = ByUrl::new(&[]);
        let poller = Poller::new(&api, quick_policy(3));
        let outcome = reconcile(&poller, Vec::new());
        assert_eq!(outcome, BatchOutcome::default());
        assert!(outcome.is_complete());
    }
}
