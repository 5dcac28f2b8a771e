//! Sequential batch runner.
//!
//! Looks up one brand at a time in list order, pausing between requests,
//! and publishes the completed results to [`RunState`] after each brand so
//! an interrupt can save them.

use std::time::Duration;

use brandfind_client::BrandFinder;
use brandfind_core::BrandResult;

use crate::interrupt::RunState;

/// Something that can look up one brand's website.
pub(crate) trait BrandLookup {
    async fn lookup(&self, brand: &str) -> BrandResult;
}

impl BrandLookup for BrandFinder {
    async fn lookup(&self, brand: &str) -> BrandResult {
        self.find_brand(brand).await
    }
}

/// The contiguous slice `[start, start + count)` of `brands`, clamped to the
/// list length.
pub(crate) fn batch_slice(brands: &[String], start: usize, count: usize) -> &[String] {
    let start = start.min(brands.len());
    let end = start.saturating_add(count).min(brands.len());
    &brands[start..end]
}

/// Look up `batch` in order and return one result per completed brand.
///
/// Stops before the next brand once `state` is interrupted; the brand in
/// flight at that moment is not part of the published snapshot.
pub(crate) async fn run_batch<L: BrandLookup>(
    lookup: &L,
    batch: &[String],
    delay: Duration,
    state: &RunState,
) -> Vec<BrandResult> {
    let total = batch.len();
    let mut results = Vec::with_capacity(total);

    for (position, brand) in batch.iter().enumerate() {
        if state.is_interrupted() {
            tracing::info!(completed = results.len(), total, "run interrupted, stopping");
            break;
        }

        println!("[{}/{total}] {brand}", position + 1);
        let result = lookup.lookup(brand).await;
        print_outcome(&result);
        tracing::debug!(
            brand = %brand,
            success = result.success,
            error_type = result.error_type.map_or("-", |e| e.as_str()),
            "brand processed"
        );

        if state.is_interrupted() {
            break;
        }
        results.push(result);
        state.publish(&results);

        let is_last = position + 1 == total;
        if !is_last && !delay.is_zero() && state.pause(delay).await {
            break;
        }
    }

    results
}

fn print_outcome(result: &BrandResult) {
    match (&result.website_url, result.error_type) {
        (Some(url), None) => println!("  found {url} ({} confidence)", result.search_confidence),
        (None, None) => println!("  no website found"),
        (_, Some(error_type)) => println!(
            "  failed: {error_type}: {}",
            result.notes.as_deref().unwrap_or("no details")
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use brandfind_core::{CompletionStore, ErrorType, RunDescriptor, RunRecord, TokenUsage};
    use chrono::Utc;

    use super::*;
    use crate::interrupt::SignalAction;

    fn descriptor() -> RunDescriptor {
        RunDescriptor {
            model_key: "sonar".to_owned(),
            model_name: "Perplexity Sonar".to_owned(),
            model_id: "perplexity/sonar".to_owned(),
            start_index: 0,
            requested_count: 10,
        }
    }

    fn brands(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn found(brand: &str) -> BrandResult {
        BrandResult {
            brand_name: brand.to_owned(),
            website_url: Some(format!("https://{}.example", brand.to_lowercase())),
            description: None,
            additional_info: brandfind_core::AdditionalInfo::default(),
            search_confidence: brandfind_core::SearchConfidence::High,
            notes: None,
            model_used: "perplexity/sonar".to_owned(),
            timestamp: Utc::now(),
            raw_response: None,
            error_type: None,
            success: true,
            token_usage: TokenUsage::default(),
        }
    }

    /// Records every brand it is asked for; fails brands starting with `X`.
    #[derive(Default)]
    struct FakeLookup {
        seen: Mutex<Vec<String>>,
    }

    impl BrandLookup for FakeLookup {
        async fn lookup(&self, brand: &str) -> BrandResult {
            self.seen.lock().unwrap().push(brand.to_owned());
            if brand.starts_with('X') {
                BrandResult::failure(
                    brand,
                    "perplexity/sonar",
                    ErrorType::ModelError,
                    "Empty response from model".to_owned(),
                    None,
                    TokenUsage::default(),
                )
            } else {
                found(brand)
            }
        }
    }

    /// Signals an interrupt while looking up the brand at `interrupt_at`.
    struct InterruptingLookup {
        state: Arc<RunState>,
        interrupt_at: usize,
        calls: AtomicUsize,
    }

    impl BrandLookup for InterruptingLookup {
        async fn lookup(&self, brand: &str) -> BrandResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.interrupt_at {
                self.state.on_signal();
            }
            found(brand)
        }
    }

    fn state() -> (tempfile::TempDir, Arc<RunState>) {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(RunState::new(
            descriptor(),
            CompletionStore::new(dir.path()),
        ));
        (dir, state)
    }

    #[test]
    fn slice_is_clamped_to_list() {
        let list = brands(&["A", "B", "C", "D", "E"]);
        assert_eq!(batch_slice(&list, 0, 2), &list[0..2]);
        assert_eq!(batch_slice(&list, 3, 10), &list[3..5]);
        assert_eq!(batch_slice(&list, 4, usize::MAX), &list[4..5]);
        assert!(batch_slice(&list, 5, 3).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn processes_slice_in_order_with_one_result_each() {
        let (_dir, state) = state();
        let list = brands(&["A", "B", "Xfail", "D", "E"]);
        let lookup = FakeLookup::default();

        let results = run_batch(
            &lookup,
            batch_slice(&list, 1, 3),
            Duration::from_millis(1000),
            &state,
        )
        .await;

        let names: Vec<&str> = results.iter().map(|r| r.brand_name.as_str()).collect();
        assert_eq!(names, ["B", "Xfail", "D"]);
        assert_eq!(*lookup.seen.lock().unwrap(), ["B", "Xfail", "D"]);
        assert!(!results[1].success);
        assert_eq!(results[1].error_type, Some(ErrorType::ModelError));
        assert_eq!(state.snapshot().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_brands_but_not_after_last() {
        let (_dir, state) = state();
        let list = brands(&["A", "B", "C"]);
        let lookup = FakeLookup::default();

        let started = tokio::time::Instant::now();
        run_batch(&lookup, &list, Duration::from_secs(1), &state).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_brand_k_keeps_k_results() {
        let (dir, state) = state();
        let list = brands(&["A", "B", "C", "D", "E"]);
        let lookup = InterruptingLookup {
            state: Arc::clone(&state),
            interrupt_at: 2,
            calls: AtomicUsize::new(0),
        };

        let results = run_batch(&lookup, &list, Duration::from_secs(1), &state).await;
        assert_eq!(results.len(), 2);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);

        let (path, record) = state.save_partial().unwrap().expect("partial save");
        assert!(path.starts_with(dir.path()));
        assert!(record.is_partial());
        let names: Vec<&str> = record.results.iter().map(|r| r.brand_name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[tokio::test]
    async fn already_interrupted_run_looks_up_nothing() {
        let (_dir, state) = state();
        state.on_signal();
        let lookup = FakeLookup::default();

        let results = run_batch(&lookup, &brands(&["A", "B"]), Duration::ZERO, &state).await;
        assert!(results.is_empty());
        assert!(lookup.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signal_after_completed_batch_saves_one_run() {
        let (dir, state) = state();
        let lookup = FakeLookup::default();

        let results = run_batch(&lookup, &brands(&["A", "B"]), Duration::ZERO, &state).await;
        assert!(state.begin_finishing());
        assert_eq!(state.on_signal(), SignalAction::Ignore);

        let store = CompletionStore::new(dir.path());
        store
            .save_run(&RunRecord::build(&descriptor(), results, false, Utc::now()))
            .unwrap();
        let files = store.list_run_files().unwrap();
        assert_eq!(files.len(), 1);
        assert!(!CompletionStore::load_run(&files[0]).unwrap().is_partial());
    }
}
