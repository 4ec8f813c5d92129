//! Service boundary exposed to foreground clients.
//!
//! The only operation is [`DeduplicatorService::delete_duplicate_contacts`],
//! which reports a bare [`ResultCode`]. Error detail is logged here and never
//! crosses the boundary.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::config::DedupConfig;
use crate::dedup::{DuplicateResolver, Outcome};
use crate::storage::ContactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    ErrorOccurred = 1,
    NoDuplicatesFound = 2,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::ErrorOccurred),
            2 => Some(Self::NoDuplicatesFound),
            _ => None,
        }
    }

    /// Status text shown to the user for this result.
    pub fn status_message(self) -> &'static str {
        match self {
            Self::Success => "Duplicates removed",
            Self::ErrorOccurred => "An error occurred",
            Self::NoDuplicatesFound => "No duplicates found",
        }
    }
}

impl From<Outcome> for ResultCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(_) => Self::Success,
            Outcome::Error => Self::ErrorOccurred,
            Outcome::NoDuplicatesFound => Self::NoDuplicatesFound,
        }
    }
}

/// Runs duplicate removal against a shared store.
///
/// Runs on one service instance are serialized; two services over the same
/// store are not coordinated with each other.
pub struct DeduplicatorService<S> {
    store: Arc<S>,
    bypass_sync_restriction: bool,
    run_guard: Mutex<()>,
}

impl<S> DeduplicatorService<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            bypass_sync_restriction: true,
            run_guard: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<S>, config: &DedupConfig) -> Self {
        Self {
            bypass_sync_restriction: config.bypass_sync_restriction,
            ..Self::new(store)
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs one detect-and-delete pass and returns the detailed outcome.
    pub fn run(&self) -> Outcome {
        let _running = self.run_guard.lock().unwrap_or_else(PoisonError::into_inner);
        info!(bypass_sync_restriction = self.bypass_sync_restriction, "duplicate removal started");

        DuplicateResolver::new(self.store.as_ref())
            .with_sync_bypass(self.bypass_sync_restriction)
            .find_and_remove_duplicates()
    }

    pub fn delete_duplicate_contacts(&self) -> ResultCode {
        self.run().into()
    }

    /// Runs [`delete_duplicate_contacts`](Self::delete_duplicate_contacts) on
    /// a background thread. Join the handle to get the result.
    pub fn spawn_delete_duplicate_contacts(self: &Arc<Self>) -> JoinHandle<ResultCode> {
        let service = Arc::clone(self);
        thread::spawn(move || service.delete_duplicate_contacts())
    }

    /// Runs [`run`](Self::run) on tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn run_async(self: &Arc<Self>) -> Outcome {
        let service = Arc::clone(self);
        match tokio::task::spawn_blocking(move || service.run()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "duplicate removal task did not complete");
                Outcome::Error
            }
        }
    }

    #[cfg(feature = "async")]
    pub async fn delete_duplicate_contacts_async(self: &Arc<Self>) -> ResultCode {
        self.run_async().await.into()
    }
}
