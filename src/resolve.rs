//! End-to-end resolution of a lookup key to exactly one instance record.
//!
//! The resolver wires the classifier, query builder, inventory provider,
//! projector, and disambiguation prompt into one pipeline. It is generic
//! over the [`Inventory`] capability so the whole flow runs against canned
//! record sets in tests, and the provider's error type is surfaced through
//! [`ResolveError`] unchanged.

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::debug;

use crate::candidate::{Candidate, ProjectError, project};
use crate::inventory::{InstanceRecord, Inventory};
use crate::lookup::classify;
use crate::query::InstanceQuery;
use crate::select::{SelectError, Selection, choose};

/// Outcome of a resolution run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// Exactly one instance was resolved.
    Instance(InstanceRecord),
    /// The user closed the selection prompt; the invocation aborts cleanly.
    Cancelled,
}

/// Errors surfaced while resolving a lookup key.
#[derive(Debug, Error)]
pub enum ResolveError<ProviderError>
where
    ProviderError: std::error::Error + 'static,
{
    /// Raised when the query matches no running or pending instance.
    #[error("found no instance '{key}'")]
    NoMatch {
        /// The original lookup key.
        key: String,
    },
    /// Raised when the inventory provider fails; no retry is attempted.
    #[error("inventory query failed: {0}")]
    Provider(#[source] ProviderError),
    /// Raised when a returned record is missing required fields.
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// Raised when the selection prompt fails terminally.
    #[error(transparent)]
    Selection(#[from] SelectError),
    /// Raised when a chosen candidate has no matching record, which would
    /// mean the candidate list and the query result diverged.
    #[error("unable to find instance {id} in the query result")]
    MissingRecord {
        /// Identifier of the chosen candidate.
        id: String,
    },
}

/// Runs the classify → query → project → disambiguate pipeline.
#[derive(Clone, Debug)]
pub struct Resolver<I: Inventory> {
    inventory: I,
}

impl<I: Inventory> Resolver<I> {
    /// Creates a resolver over the given inventory provider.
    #[must_use]
    pub const fn new(inventory: I) -> Self {
        Self { inventory }
    }

    /// Resolves `key` to exactly one instance record.
    ///
    /// A single match bypasses the prompt entirely; multiple matches are
    /// put to the user on the injected prompt streams.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoMatch`] when nothing matches,
    /// [`ResolveError::Provider`] when the inventory call fails, and
    /// projection or selection failures otherwise.
    pub async fn resolve(
        &self,
        key: &str,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<Resolution, ResolveError<I::Error>> {
        let kind = classify(key);
        debug!(?kind, key, "classified lookup key");

        let query = InstanceQuery::for_key(key, kind);
        let records = self
            .inventory
            .describe(&query)
            .await
            .map_err(ResolveError::Provider)?;
        debug!(count = records.len(), "inventory returned records");

        match records.as_slice() {
            [] => Err(ResolveError::NoMatch {
                key: key.to_owned(),
            }),
            [only] => Ok(Resolution::Instance(only.clone())),
            _ => self.disambiguate(key, &records, input, output),
        }
    }

    /// Lists every running or pending instance as sorted candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Provider`] when the inventory call fails, or
    /// a projection error for integrity holes in the response.
    pub async fn list(&self) -> Result<Vec<Candidate>, ResolveError<I::Error>> {
        let records = self
            .inventory
            .describe(&InstanceQuery::running_instances())
            .await
            .map_err(ResolveError::Provider)?;
        debug!(count = records.len(), "inventory returned records");
        Ok(project(&records)?)
    }

    fn disambiguate(
        &self,
        key: &str,
        records: &[InstanceRecord],
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<Resolution, ResolveError<I::Error>> {
        let candidates = project(records)?;
        let index = match choose(key, &candidates, input, output)? {
            Selection::Cancelled => return Ok(Resolution::Cancelled),
            Selection::Chosen(index) => index,
        };

        let chosen = index
            .checked_sub(1)
            .and_then(|position| candidates.get(position))
            .ok_or_else(|| ResolveError::MissingRecord {
                id: index.to_string(),
            })?;
        let record = find_record(records, chosen).ok_or_else(|| ResolveError::MissingRecord {
            id: chosen.id.clone(),
        })?;
        Ok(Resolution::Instance(record.clone()))
    }
}

/// Maps a chosen candidate back to its originating record by identifier.
fn find_record<'a>(
    records: &'a [InstanceRecord],
    candidate: &Candidate,
) -> Option<&'a InstanceRecord> {
    records
        .iter()
        .find(|record| record.id.as_deref() == Some(candidate.id.as_str()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;
    use crate::query::{NAME_TAG_FILTER_NAME, PRIVATE_IP_FILTER_NAME};
    use crate::test_support::{FakeInventory, record_with_name, unnamed_record};

    async fn resolve_with_input(
        inventory: FakeInventory,
        key: &str,
        input_text: &str,
    ) -> (
        Result<Resolution, ResolveError<crate::test_support::FakeInventoryError>>,
        String,
    ) {
        let resolver = Resolver::new(inventory);
        let mut input = Cursor::new(input_text.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = resolver.resolve(key, &mut input, &mut output).await;
        (result, String::from_utf8(output).expect("prompt is utf8"))
    }

    #[tokio::test]
    async fn empty_result_is_a_no_match_naming_the_key() {
        let inventory = FakeInventory::new();
        inventory.push_records(Vec::new());
        let (result, output) = resolve_with_input(inventory, "api-server", "").await;

        match result {
            Err(ResolveError::NoMatch { key }) => assert_eq!(key, "api-server"),
            other => panic!("expected NoMatch, got {other:?}"),
        }
        assert!(output.is_empty(), "no prompt should be shown");
    }

    #[tokio::test]
    async fn single_record_bypasses_the_prompt() {
        let inventory = FakeInventory::new();
        let record = record_with_name("i-000000a1", "10.0.0.1", "api-server");
        inventory.push_records(vec![record.clone()]);
        let (result, output) = resolve_with_input(inventory, "api-server", "").await;

        assert_eq!(result.expect("resolves"), Resolution::Instance(record));
        assert!(output.is_empty(), "prompt must be bypassed for one match");
    }

    #[tokio::test]
    async fn multiple_records_prompt_and_resolve_the_chosen_index() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![
            record_with_name("i-000000b2", "10.0.0.2", "beta"),
            record_with_name("i-000000a1", "10.0.0.1", "alpha"),
        ]);
        let (result, output) = resolve_with_input(inventory, "worker", "2\n").await;

        // Candidates are sorted by name, so index 2 is "beta".
        match result.expect("resolves") {
            Resolution::Instance(record) => {
                assert_eq!(record.id.as_deref(), Some("i-000000b2"));
            }
            Resolution::Cancelled => panic!("unexpected cancellation"),
        }
        assert!(output.contains("Found more than one instance for 'worker'."));
    }

    #[tokio::test]
    async fn empty_selection_defaults_to_the_first_candidate() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![
            record_with_name("i-000000b2", "10.0.0.2", "beta"),
            record_with_name("i-000000a1", "10.0.0.1", "alpha"),
        ]);
        let (result, _) = resolve_with_input(inventory, "worker", "\n").await;

        match result.expect("resolves") {
            Resolution::Instance(record) => {
                assert_eq!(record.id.as_deref(), Some("i-000000a1"));
            }
            Resolution::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[tokio::test]
    async fn end_of_input_cancels_the_invocation() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![
            record_with_name("i-000000a1", "10.0.0.1", "alpha"),
            record_with_name("i-000000b2", "10.0.0.2", "beta"),
        ]);
        let (result, _) = resolve_with_input(inventory, "worker", "").await;

        assert_eq!(result.expect("cancels cleanly"), Resolution::Cancelled);
    }

    #[tokio::test]
    async fn out_of_range_selection_is_terminal() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![
            record_with_name("i-000000a1", "10.0.0.1", "alpha"),
            record_with_name("i-000000b2", "10.0.0.2", "beta"),
            record_with_name("i-000000c3", "10.0.0.3", "gamma"),
        ]);
        let (result, _) = resolve_with_input(inventory, "worker", "9\n").await;

        assert!(
            matches!(
                result,
                Err(ResolveError::Selection(SelectError::IndexOutOfRange { index: 9 }))
            ),
            "expected invalid index 9, got {result:?}"
        );
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced_without_retry() {
        let inventory = FakeInventory::new();
        inventory.push_failure("RequestExpired: credentials lapsed");
        let (result, _) = resolve_with_input(inventory.clone(), "api-server", "").await;

        match result {
            Err(ResolveError::Provider(err)) => {
                assert!(err.to_string().contains("RequestExpired"));
            }
            other => panic!("expected provider failure, got {other:?}"),
        }
        assert_eq!(inventory.queries().len(), 1, "exactly one round-trip");
    }

    #[tokio::test]
    async fn integrity_holes_propagate_from_projection() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![
            record_with_name("i-000000a1", "10.0.0.1", "alpha"),
            crate::inventory::InstanceRecord {
                id: Some("i-000000b2".to_owned()),
                ..crate::inventory::InstanceRecord::default()
            },
        ]);
        let (result, _) = resolve_with_input(inventory, "worker", "1\n").await;

        assert!(
            matches!(result, Err(ResolveError::Project(_))),
            "expected projection failure, got {result:?}"
        );
    }

    #[rstest]
    #[case("10.0.0.5", PRIVATE_IP_FILTER_NAME)]
    #[case("api-server", NAME_TAG_FILTER_NAME)]
    #[tokio::test]
    async fn resolution_queries_the_classified_dimension(
        #[case] key: &str,
        #[case] filter_name: &str,
    ) {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![unnamed_record("i-000000a1", "10.0.0.5")]);
        let (_, _) = resolve_with_input(inventory.clone(), key, "").await;

        let queries = inventory.queries();
        let query = queries.first().expect("one query issued");
        assert!(
            query.filters.iter().any(|filter| filter.name == filter_name),
            "query should filter on {filter_name}: {query:?}"
        );
    }

    #[tokio::test]
    async fn instance_id_key_queries_by_explicit_id() {
        let inventory = FakeInventory::new();
        inventory.push_records(vec![unnamed_record("i-0017c8b3", "10.0.0.5")]);
        let (_, _) = resolve_with_input(inventory.clone(), "i-0017c8b3", "").await;

        let queries = inventory.queries();
        let query = queries.first().expect("one query issued");
        assert_eq!(query.instance_ids, vec!["i-0017c8b3"]);
    }
}
