//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::inventory::{InstanceRecord, Inventory, InventoryFuture, RecordTag};
use crate::launch::{CommandSpawner, ExitOutcome, LaunchError};
use crate::query::InstanceQuery;

/// Error type returned by [`FakeInventory`] when scripted to fail.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct FakeInventoryError {
    /// Scripted failure message.
    pub message: String,
}

/// Inventory double returning pre-seeded responses in FIFO order.
///
/// Used to drive deterministic resolution outcomes without network access.
#[derive(Clone, Debug, Default)]
pub struct FakeInventory {
    responses: Arc<Mutex<VecDeque<Result<Vec<InstanceRecord>, FakeInventoryError>>>>,
    queries: Arc<Mutex<Vec<InstanceQuery>>>,
}

impl FakeInventory {
    /// Creates a new fake with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    pub fn push_records(&self, records: Vec<InstanceRecord>) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.responses.lock().unwrap().push_back(Ok(records));
    }

    /// Queues a provider failure.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    pub fn push_failure(&self, message: &str) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FakeInventoryError {
                message: message.to_owned(),
            }));
    }

    /// Returns a snapshot of every query issued so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    #[must_use]
    pub fn queries(&self) -> Vec<InstanceQuery> {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.queries.lock().unwrap().clone()
    }
}

impl Inventory for FakeInventory {
    type Error = FakeInventoryError;

    fn describe<'a>(
        &'a self,
        query: &'a InstanceQuery,
    ) -> InventoryFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(async move {
            #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
            self.queries.lock().unwrap().push(query.clone());
            #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
            let response = self.responses.lock().unwrap().pop_front();
            response.unwrap_or_else(|| {
                Err(FakeInventoryError {
                    message: "no scripted response available".to_owned(),
                })
            })
        })
    }
}

/// Builds a record carrying a `Name` tag.
#[must_use]
pub fn record_with_name(id: &str, private_ip: &str, name: &str) -> InstanceRecord {
    InstanceRecord {
        id: Some(id.to_owned()),
        private_ip: Some(private_ip.to_owned()),
        key_name: Some("deploy".to_owned()),
        tags: vec![RecordTag::new("Name", name)],
    }
}

/// Builds a record with no tags at all.
#[must_use]
pub fn unnamed_record(id: &str, private_ip: &str) -> InstanceRecord {
    InstanceRecord {
        id: Some(id.to_owned()),
        private_ip: Some(private_ip.to_owned()),
        key_name: Some("deploy".to_owned()),
        tags: Vec::new(),
    }
}

/// Records a single invocation made through [`ScriptedSpawner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpawnInvocation {
    /// Program name as passed to the spawner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl SpawnInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// Scripted command spawner returning pre-seeded exit outcomes in FIFO
/// order, recording every invocation.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSpawner {
    outcomes: Arc<Mutex<VecDeque<ExitOutcome>>>,
    invocations: Arc<Mutex<Vec<SpawnInvocation>>>,
}

impl ScriptedSpawner {
    /// Creates a new spawner with no queued outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful exit.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    pub fn push_success(&self) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.outcomes.lock().unwrap().push_back(ExitOutcome::Code(0));
    }

    /// Queues a specific exit code.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    pub fn push_exit_code(&self, code: i32) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ExitOutcome::Code(code));
    }

    /// Returns a snapshot of all invocations recorded so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned, which only happens after a
    /// previous test panic.
    #[must_use]
    pub fn invocations(&self) -> Vec<SpawnInvocation> {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandSpawner for ScriptedSpawner {
    fn spawn(&self, program: &str, args: &[OsString]) -> Result<ExitOutcome, LaunchError> {
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        self.invocations.lock().unwrap().push(SpawnInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        #[expect(clippy::unwrap_used, reason = "poisoned lock means a test already failed")]
        let outcome = self.outcomes.lock().unwrap().pop_front();
        outcome.ok_or_else(|| LaunchError::Spawn {
            program: program.to_owned(),
            message: "no scripted outcome available".to_owned(),
        })
    }
}
