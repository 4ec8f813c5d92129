use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::models::ContactId;
use crate::storage::{ContactOrder, ContactStore};

use super::key::{Fingerprint, KeyBuilder};

/// Result of one detect-and-delete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoDuplicatesFound,
    Success(usize),
    Error,
}

/// Contacts sharing one fingerprint, in name-sorted scan order.
/// The first id is the survivor. A group always has at least two members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    fingerprint: Fingerprint,
    ids: Vec<ContactId>,
}

impl DuplicateGroup {
    /// Returns `None` unless `ids` holds at least two contacts.
    pub fn new(fingerprint: Fingerprint, ids: Vec<ContactId>) -> Option<Self> {
        (ids.len() > 1).then_some(Self { fingerprint, ids })
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn ids(&self) -> &[ContactId] {
        &self.ids
    }

    pub fn survivor(&self) -> ContactId {
        self.ids[0]
    }

    pub fn duplicates(&self) -> &[ContactId] {
        &self.ids[1..]
    }
}

/// Flattens groups into the list of ids to delete: every member except the
/// survivor of each group.
pub fn plan_deletion(groups: &[DuplicateGroup]) -> Vec<ContactId> {
    groups
        .iter()
        .flat_map(|group| group.duplicates().iter().copied())
        .collect()
}

pub struct DuplicateResolver<S: ContactStore> {
    store: S,
    bypass_sync_restriction: bool,
}

impl<S: ContactStore> DuplicateResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            bypass_sync_restriction: true,
        }
    }

    pub fn with_sync_bypass(mut self, bypass: bool) -> Self {
        self.bypass_sync_restriction = bypass;
        self
    }

    /// Scans every named contact and returns the fingerprint groups with more
    /// than one member, ordered by the scan position of their survivor.
    /// Nothing is deleted.
    pub fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>> {
        let contacts = self.store.query_contacts(ContactOrder::DisplayNameNoCase)?;
        let keys = KeyBuilder::new(&self.store);

        let mut index: HashMap<Fingerprint, usize> = HashMap::new();
        let mut buckets: Vec<(Fingerprint, Vec<ContactId>)> = Vec::new();
        let mut skipped = 0usize;

        for contact in &contacts {
            let Some(name) = contact.name() else {
                skipped += 1;
                continue;
            };

            let fingerprint = keys.build_key(contact.id, name, contact.has_phone_number)?;
            match index.get(&fingerprint) {
                Some(&slot) => buckets[slot].1.push(contact.id),
                None => {
                    index.insert(fingerprint.clone(), buckets.len());
                    buckets.push((fingerprint, vec![contact.id]));
                }
            }
        }

        let groups: Vec<DuplicateGroup> = buckets
            .into_iter()
            .filter_map(|(fingerprint, ids)| DuplicateGroup::new(fingerprint, ids))
            .collect();

        info!(
            scanned = contacts.len(),
            skipped_unnamed = skipped,
            groups = groups.len(),
            "duplicate scan finished"
        );
        for group in &groups {
            debug!(
                fingerprint = %group.fingerprint,
                survivor = group.survivor(),
                duplicates = ?group.duplicates(),
                "duplicate group"
            );
        }

        Ok(groups)
    }

    /// Runs the full pipeline, returning the number of deleted contacts or
    /// `None` when no duplicates exist.
    pub fn remove_duplicates(&self) -> Result<Option<usize>> {
        let groups = self.find_duplicates()?;
        if groups.is_empty() {
            return Ok(None);
        }

        let candidates = plan_deletion(&groups);
        if !candidates.is_empty() {
            let removed = self
                .store
                .batch_delete(&candidates, self.bypass_sync_restriction)?;
            info!(
                requested = candidates.len(),
                removed, "deleted duplicate contacts"
            );
        }

        Ok(Some(candidates.len()))
    }

    /// Same as [`remove_duplicates`](Self::remove_duplicates) with every
    /// failure collapsed into [`Outcome::Error`].
    pub fn find_and_remove_duplicates(&self) -> Outcome {
        match self.remove_duplicates() {
            Ok(None) => Outcome::NoDuplicatesFound,
            Ok(Some(count)) => Outcome::Success(count),
            Err(e) => {
                error!(error = %e, "duplicate removal failed");
                Outcome::Error
            }
        }
    }
}
