//! In-memory [`ContactStore`] with call counting and failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{DedupError, Result};
use crate::models::{Contact, ContactId, EmailAddress, PhoneNumber};
use crate::storage::{ContactOrder, ContactStore};

#[derive(Default)]
pub(crate) struct FixtureStore {
    contacts: Vec<Contact>,
    phones: HashMap<ContactId, Vec<Option<String>>>,
    emails: HashMap<ContactId, Vec<Option<String>>>,
    failing_phones: HashSet<ContactId>,
    failing_emails: HashSet<ContactId>,
    fail_contacts: bool,
    fail_delete: bool,
    phone_queries: AtomicUsize,
    email_queries: AtomicUsize,
    batches: Mutex<Vec<(Vec<ContactId>, bool)>>,
}

fn injected(what: &'static str) -> DedupError {
    DedupError::QueryFailure {
        what,
        source: rusqlite::Error::InvalidQuery,
    }
}

impl FixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact(mut self, id: ContactId, name: Option<&str>, phones: &[&str], emails: &[&str]) -> Self {
        self.contacts.push(Contact {
            id,
            display_name: name.map(str::to_string),
            has_phone_number: !phones.is_empty(),
            account_type: None,
        });
        self.phones
            .insert(id, phones.iter().map(|p| Some(p.to_string())).collect());
        self.emails
            .insert(id, emails.iter().map(|e| Some(e.to_string())).collect());
        self
    }

    pub fn with_null_phone(mut self, id: ContactId) -> Self {
        self.phones.entry(id).or_default().push(None);
        self
    }

    pub fn with_null_email(mut self, id: ContactId) -> Self {
        self.emails.entry(id).or_default().push(None);
        self
    }

    pub fn failing_phones_for(mut self, id: ContactId) -> Self {
        self.failing_phones.insert(id);
        self
    }

    pub fn failing_emails_for(mut self, id: ContactId) -> Self {
        self.failing_emails.insert(id);
        self
    }

    pub fn failing_contacts(mut self) -> Self {
        self.fail_contacts = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn phone_queries(&self) -> usize {
        self.phone_queries.load(Ordering::SeqCst)
    }

    pub fn email_queries(&self) -> usize {
        self.email_queries.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<(Vec<ContactId>, bool)> {
        self.batches.lock().unwrap().clone()
    }
}

impl ContactStore for FixtureStore {
    fn query_contacts(&self, order: ContactOrder) -> Result<Vec<Contact>> {
        if self.fail_contacts {
            return Err(injected("contacts"));
        }
        let mut contacts = self.contacts.clone();
        match order {
            // Same ordering as SQLite NOCASE: ASCII-only folding, NULL first.
            ContactOrder::DisplayNameNoCase => contacts.sort_by(|a, b| {
                let fold = |c: &Contact| c.display_name.as_ref().map(|n| n.to_ascii_lowercase());
                fold(a).cmp(&fold(b)).then(a.id.cmp(&b.id))
            }),
            ContactOrder::Id => contacts.sort_by_key(|c| c.id),
        }
        Ok(contacts)
    }

    fn query_phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>> {
        self.phone_queries.fetch_add(1, Ordering::SeqCst);
        if self.failing_phones.contains(&contact_id) {
            return Err(injected("phone_numbers"));
        }
        Ok(self
            .phones
            .get(&contact_id)
            .into_iter()
            .flatten()
            .map(|number| PhoneNumber {
                contact_id,
                number: number.clone(),
            })
            .collect())
    }

    fn query_email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>> {
        self.email_queries.fetch_add(1, Ordering::SeqCst);
        if self.failing_emails.contains(&contact_id) {
            return Err(injected("email_addresses"));
        }
        Ok(self
            .emails
            .get(&contact_id)
            .into_iter()
            .flatten()
            .map(|address| EmailAddress {
                contact_id,
                address: address.clone(),
            })
            .collect())
    }

    fn batch_delete(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize> {
        if self.fail_delete {
            return Err(DedupError::BatchWriteFailure("injected".to_string()));
        }
        self.batches
            .lock()
            .unwrap()
            .push((ids.to_vec(), bypass_sync_restriction));
        Ok(ids.len())
    }
}
