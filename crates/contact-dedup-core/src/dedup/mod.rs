//! Duplicate detection and removal.
//!
//! Contacts are fingerprinted by [`KeyBuilder`] and grouped by exact
//! fingerprint. [`DuplicateResolver`] keeps the first contact of each group
//! in name-sorted order and deletes the rest in one batch.

mod key;
mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use key::{Fingerprint, KeyBuilder};
pub use resolver::{DuplicateGroup, DuplicateResolver, Outcome, plan_deletion};
