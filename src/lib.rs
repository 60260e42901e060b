//! Core library for the `awssh` instance resolution tool.
//!
//! The crate resolves a lookup key — an EC2 instance ID, a private IPv4
//! address, or a `Name` tag value — to exactly one running or pending
//! instance, prompting the user to disambiguate when several match, and
//! hands the result to the system `ssh` client. The inventory provider and
//! the subprocess spawner are injectable capabilities so the whole pipeline
//! runs against fakes in tests.

pub mod candidate;
pub mod config;
pub mod ec2;
pub mod inventory;
pub mod launch;
pub mod lookup;
pub mod query;
pub mod resolve;
pub mod select;
pub mod test_support;

pub use candidate::{Candidate, ProjectError, UNNAMED, project, render_numbered_table, render_table};
pub use config::{ConfigError, ConnectConfig, expand_tilde};
pub use ec2::{Ec2Inventory, Ec2InventoryError};
pub use inventory::{InstanceRecord, Inventory, InventoryFuture, RecordTag};
pub use launch::{
    CommandSpawner, ExitOutcome, LaunchError, LaunchOptions, ProcessSpawner, SshLauncher,
};
pub use lookup::{KeyKind, classify};
pub use query::{InstanceQuery, QueryFilter};
pub use resolve::{Resolution, ResolveError, Resolver};
pub use select::{SelectError, Selection, choose};
