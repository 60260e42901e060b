//! Provider-neutral inventory query model.
//!
//! A query is an explicit instance-ID list plus zero or more named-value
//! filters, ANDed together by the provider. Construction is pure and cannot
//! fail: malformed lookup keys have already been routed to a name lookup by
//! the classifier.

use crate::lookup::KeyKind;

/// Filter name matching on the instance lifecycle state.
pub const STATE_FILTER_NAME: &str = "instance-state-name";

/// Filter name matching on the primary private IPv4 address.
pub const PRIVATE_IP_FILTER_NAME: &str = "private-ip-address";

/// Filter name matching on the `Name` tag value.
pub const NAME_TAG_FILTER_NAME: &str = "tag:Name";

/// Lifecycle states a connectable instance may be in.
pub const CONNECTABLE_STATES: [&str; 2] = ["running", "pending"];

/// A single named-value predicate understood by the inventory provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryFilter {
    /// Provider-side filter name.
    pub name: String,
    /// Values the filter matches; multiple values are ORed by the provider.
    pub values: Vec<String>,
}

impl QueryFilter {
    fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_owned(),
            values,
        }
    }
}

/// Inventory query: explicit IDs plus ANDed filters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceQuery {
    /// Explicit instance identifiers to restrict the query to.
    pub instance_ids: Vec<String>,
    /// Named-value filters, ANDed together.
    pub filters: Vec<QueryFilter>,
}

impl InstanceQuery {
    fn state_filter() -> QueryFilter {
        QueryFilter::new(
            STATE_FILTER_NAME,
            CONNECTABLE_STATES.iter().map(|s| (*s).to_owned()).collect(),
        )
    }

    /// Builds the query for a classified lookup key.
    ///
    /// Every query carries the running/pending state filter; the key kind
    /// selects the additional predicate.
    #[must_use]
    pub fn for_key(raw: &str, kind: KeyKind) -> Self {
        match kind {
            KeyKind::PrivateIp => Self {
                instance_ids: Vec::new(),
                filters: vec![
                    QueryFilter::new(PRIVATE_IP_FILTER_NAME, vec![raw.to_owned()]),
                    Self::state_filter(),
                ],
            },
            KeyKind::InstanceId => Self {
                instance_ids: vec![raw.to_owned()],
                filters: vec![Self::state_filter()],
            },
            KeyKind::Name => Self {
                instance_ids: Vec::new(),
                filters: vec![
                    QueryFilter::new(NAME_TAG_FILTER_NAME, vec![raw.to_owned()]),
                    Self::state_filter(),
                ],
            },
        }
    }

    /// Builds the query used by list mode: every running or pending
    /// instance, no key predicate.
    #[must_use]
    pub fn running_instances() -> Self {
        Self {
            instance_ids: Vec::new(),
            filters: vec![Self::state_filter()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_named<'a>(query: &'a InstanceQuery, name: &str) -> Option<&'a QueryFilter> {
        query.filters.iter().find(|filter| filter.name == name)
    }

    #[test]
    fn every_query_carries_the_state_filter() {
        for query in [
            InstanceQuery::for_key("10.0.0.5", KeyKind::PrivateIp),
            InstanceQuery::for_key("i-0017c8b3", KeyKind::InstanceId),
            InstanceQuery::for_key("api-server", KeyKind::Name),
            InstanceQuery::running_instances(),
        ] {
            let state = filter_named(&query, STATE_FILTER_NAME).expect("state filter present");
            assert_eq!(state.values, vec!["running", "pending"]);
        }
    }

    #[test]
    fn private_ip_key_filters_on_private_ip() {
        let query = InstanceQuery::for_key("10.0.0.5", KeyKind::PrivateIp);
        assert!(query.instance_ids.is_empty());
        let filter = filter_named(&query, PRIVATE_IP_FILTER_NAME).expect("ip filter present");
        assert_eq!(filter.values, vec!["10.0.0.5"]);
    }

    #[test]
    fn instance_id_key_restricts_the_id_list() {
        let query = InstanceQuery::for_key("i-0017c8b3", KeyKind::InstanceId);
        assert_eq!(query.instance_ids, vec!["i-0017c8b3"]);
        assert_eq!(query.filters.len(), 1, "only the state filter remains");
    }

    #[test]
    fn name_key_filters_on_the_name_tag() {
        let query = InstanceQuery::for_key("api-server", KeyKind::Name);
        assert!(query.instance_ids.is_empty());
        let filter = filter_named(&query, NAME_TAG_FILTER_NAME).expect("tag filter present");
        assert_eq!(filter.values, vec!["api-server"]);
    }

    #[test]
    fn list_query_has_no_key_predicate() {
        let query = InstanceQuery::running_instances();
        assert!(query.instance_ids.is_empty());
        assert_eq!(query.filters.len(), 1);
    }
}
