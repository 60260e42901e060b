//! EC2 implementation of the inventory capability.
//!
//! Executes `DescribeInstances` against the AWS API and flattens the
//! reservation grouping in the response; reservations carry no meaning for
//! resolution. The call is a single synchronous round-trip with no
//! client-side retry: any provider failure aborts the invocation with the
//! service's own error code and message.

use aws_config::Region;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::types::{Filter, Reservation};
use thiserror::Error;
use tracing::debug;

use crate::inventory::{InstanceRecord, Inventory, InventoryFuture, RecordTag};
use crate::query::InstanceQuery;

/// Errors raised by the EC2 inventory.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Ec2InventoryError {
    /// Wrapper for provider level failures.
    #[error("provider error: {message}")]
    Provider {
        /// Code and message as reported by the service.
        message: String,
    },
}

/// Inventory backed by the EC2 `DescribeInstances` API.
#[derive(Clone, Debug)]
pub struct Ec2Inventory {
    client: Client,
}

impl Ec2Inventory {
    /// Constructs an inventory from the default AWS configuration chain,
    /// with optional profile and region overrides taking precedence.
    pub async fn from_env(profile: Option<String>, region: Option<String>) -> Self {
        let region_provider =
            RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();
        let mut loader =
            aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region_provider);
        if let Some(profile_name) = profile {
            loader = loader.profile_name(profile_name);
        }
        let config = loader.load().await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Wraps an existing client, used when the caller owns SDK setup.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Inventory for Ec2Inventory {
    type Error = Ec2InventoryError;

    fn describe<'a>(
        &'a self,
        query: &'a InstanceQuery,
    ) -> InventoryFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(async move {
            debug!("aws api: describing instances");
            let mut request = self.client.describe_instances();
            for id in &query.instance_ids {
                request = request.instance_ids(id);
            }
            for filter in sdk_filters(query) {
                request = request.filters(filter);
            }

            let response = request.send().await.map_err(|err| {
                let message = err.message().map_or_else(
                    || DisplayErrorContext(&err).to_string(),
                    |detail| {
                        err.code().map_or_else(
                            || detail.to_owned(),
                            |code| format!("{code}: {detail}"),
                        )
                    },
                );
                Ec2InventoryError::Provider { message }
            })?;

            let reservations = response.reservations();
            debug!(count = reservations.len(), "aws api: got reservations");
            Ok(flatten_reservations(reservations))
        })
    }
}

/// Translates the provider-neutral query filters into SDK filters.
fn sdk_filters(query: &InstanceQuery) -> Vec<Filter> {
    query
        .filters
        .iter()
        .map(|filter| {
            Filter::builder()
                .name(&filter.name)
                .set_values(Some(filter.values.clone()))
                .build()
        })
        .collect()
}

/// Flattens the reservation grouping into the plain record list the
/// resolution engine consumes.
fn flatten_reservations(reservations: &[Reservation]) -> Vec<InstanceRecord> {
    let mut records = Vec::new();
    for reservation in reservations {
        for instance in reservation.instances() {
            records.push(InstanceRecord {
                id: instance.instance_id().map(str::to_owned),
                private_ip: instance.private_ip_address().map(str::to_owned),
                key_name: instance.key_name().map(str::to_owned),
                tags: instance
                    .tags()
                    .iter()
                    .filter_map(|tag| match (tag.key(), tag.value()) {
                        (Some(key), Some(value)) => Some(RecordTag::new(key, value)),
                        _ => None,
                    })
                    .collect(),
            });
        }
    }
    records
}
