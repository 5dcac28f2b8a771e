//! The two shapes a model-bound finder takes: one that can query the API and
//! one that can only inspect saved runs.

use brandfind_client::BrandFinder;
use brandfind_core::{CompletionStatus, CompletionStore, ModelSpec, StoreError};

use crate::summary::{print_run_overview, print_run_summary};

/// A catalog entry picked for this invocation.
#[derive(Debug, Clone)]
pub(crate) struct SelectedModel {
    pub key: String,
    pub spec: ModelSpec,
}

pub(crate) enum Finder {
    /// Has credentials and an HTTP client.
    Live {
        client: BrandFinder,
        model: SelectedModel,
    },
    /// No API key; can only report on saved runs.
    ReadOnly { model: SelectedModel },
}

impl Finder {
    pub(crate) fn model(&self) -> &SelectedModel {
        match self {
            Self::Live { model, .. } | Self::ReadOnly { model } => model,
        }
    }

    pub(crate) fn client(&self) -> Option<&BrandFinder> {
        match self {
            Self::Live { client, .. } => Some(client),
            Self::ReadOnly { .. } => None,
        }
    }

    pub(crate) fn check_completion(
        &self,
        store: &CompletionStore,
        threshold: usize,
    ) -> CompletionStatus {
        store.check_completion(&self.model().spec.id, threshold)
    }

    /// Print every saved run of this model and the details of the most
    /// recent complete one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the results directory cannot be read.
    pub(crate) fn print_summary(&self, store: &CompletionStore) -> Result<(), StoreError> {
        let model = self.model();
        let all = store.load_all()?;
        let runs: Vec<_> = all
            .iter()
            .filter(|run| run.file_name.is_for_model(&model.spec.id))
            .collect();

        if runs.is_empty() {
            println!(
                "no saved results for {} ({}) in {}",
                model.spec.name,
                model.spec.id,
                store.dir().display()
            );
        } else {
            println!(
                "saved runs for {} ({}) [{}]",
                model.spec.name, model.spec.id, model.key
            );
            print_run_overview(&runs);

            let latest = runs
                .iter()
                .rev()
                .find(|run| !run.record.is_partial())
                .or_else(|| runs.last());
            if let Some(run) = latest {
                print_run_summary(&run.record);
            }
        }

        if let Self::Live { client, .. } = self {
            if client.request_count() > 0 {
                let usage = client.usage_totals();
                println!(
                    "\nthis session: {} requests, {} tokens, ${:.4}",
                    client.request_count(),
                    usage.total_tokens,
                    usage.cost
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brandfind_core::{RunDescriptor, RunRecord};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn model() -> SelectedModel {
        SelectedModel {
            key: "sonar".to_owned(),
            spec: ModelSpec {
                id: "perplexity/sonar".to_owned(),
                name: "Perplexity Sonar".to_owned(),
            },
        }
    }

    #[test]
    fn read_only_has_no_client() {
        let finder = Finder::ReadOnly { model: model() };
        assert!(finder.client().is_none());
        assert_eq!(finder.model().key, "sonar");
    }

    #[test]
    fn read_only_checks_and_summarizes_saved_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = CompletionStore::new(dir.path());
        let finder = Finder::ReadOnly { model: model() };

        assert!(matches!(
            finder.check_completion(&store, 1),
            CompletionStatus::NoResults { .. }
        ));
        finder.print_summary(&store).unwrap();

        let descriptor = RunDescriptor {
            model_key: "sonar".to_owned(),
            model_name: "Perplexity Sonar".to_owned(),
            model_id: "perplexity/sonar".to_owned(),
            start_index: 0,
            requested_count: 0,
        };
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        store
            .save_run(&RunRecord::build(&descriptor, Vec::new(), false, ts))
            .unwrap();

        assert!(matches!(
            finder.check_completion(&store, 0),
            CompletionStatus::Sufficient { qualifying: 0, .. }
        ));
        finder.print_summary(&store).unwrap();
    }
}
