//! Inventory provider abstraction.
//!
//! The resolution engine only needs one capability from the cloud provider:
//! execute a query and return the matching instance records. The trait keeps
//! that seam injectable so the engine is tested against canned record sets
//! without network access.

use std::future::Future;
use std::pin::Pin;

use crate::query::InstanceQuery;

/// A single tag attached to an instance record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl RecordTag {
    /// Convenience constructor used by providers and tests.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Provider-shaped instance record.
///
/// Field optionality mirrors the provider wire format; records missing the
/// identifier or private address are rejected later, during projection, as a
/// data-integrity failure rather than silently dropped here.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstanceRecord {
    /// Provider instance identifier.
    pub id: Option<String>,
    /// Primary private IPv4 address.
    pub private_ip: Option<String>,
    /// Name of the key pair the instance was launched with.
    pub key_name: Option<String>,
    /// Tags attached to the instance.
    pub tags: Vec<RecordTag>,
}

impl InstanceRecord {
    /// Returns the value of the `Name` tag, when present.
    #[must_use]
    pub fn name_tag(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == "Name")
            .map(|tag| tag.value.as_str())
    }
}

/// Future returned by inventory operations.
pub type InventoryFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by inventory providers.
///
/// Providers return the flattened record list; any reservation-style grouping
/// in the wire response is not semantically significant to resolution and is
/// collapsed before records reach the engine.
pub trait Inventory {
    /// Provider specific error type returned by queries.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes `query` and returns the matching records.
    fn describe<'a>(
        &'a self,
        query: &'a InstanceQuery,
    ) -> InventoryFuture<'a, Vec<InstanceRecord>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::{InstanceRecord, RecordTag};

    #[test]
    fn name_tag_scans_tags_by_key() {
        let record = InstanceRecord {
            tags: vec![
                RecordTag::new("env", "prod"),
                RecordTag::new("Name", "api-server"),
            ],
            ..InstanceRecord::default()
        };
        assert_eq!(record.name_tag(), Some("api-server"));
    }

    #[test]
    fn name_tag_is_absent_when_no_tag_matches() {
        let record = InstanceRecord {
            tags: vec![RecordTag::new("env", "prod")],
            ..InstanceRecord::default()
        };
        assert_eq!(record.name_tag(), None);
    }
}
