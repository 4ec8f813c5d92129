pub mod config;
pub mod dedup;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;

pub use config::{AppConfig, CoreConfig, DedupConfig, LoggingConfig};
pub use error::{DedupError, ExitCode, Result};
pub use models::*;

pub use dedup::{DuplicateGroup, DuplicateResolver, Fingerprint, KeyBuilder, Outcome, plan_deletion};
pub use service::{DeduplicatorService, ResultCode};
pub use storage::database::{ContactConnection, Database};
pub use storage::import::{import_contacts, load_contacts};
pub use storage::{ContactOrder, ContactStore};
