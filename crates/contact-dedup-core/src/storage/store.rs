use crate::error::Result;
use crate::models::{Contact, ContactId, EmailAddress, PhoneNumber};

/// Sort order for [`ContactStore::query_contacts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactOrder {
    /// `display_name COLLATE NOCASE`, ties broken by ascending id.
    /// NOCASE folds ASCII letters only.
    #[default]
    DisplayNameNoCase,
    Id,
}

/// The record store the dedup pipeline reads from and deletes through.
///
/// Every read returns a fully materialized list. `batch_delete` must be
/// all-or-nothing: on error no contact of the batch may have been removed.
pub trait ContactStore {
    fn query_contacts(&self, order: ContactOrder) -> Result<Vec<Contact>>;

    fn query_phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>>;

    fn query_email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>>;

    /// Deletes the given contacts together with their sub-records and returns
    /// the number of contacts removed. Contacts owned by a sync account are
    /// only deleted when `bypass_sync_restriction` is set.
    fn batch_delete(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize>;
}

impl<S: ContactStore + ?Sized> ContactStore for &S {
    fn query_contacts(&self, order: ContactOrder) -> Result<Vec<Contact>> {
        (**self).query_contacts(order)
    }

    fn query_phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>> {
        (**self).query_phone_numbers(contact_id)
    }

    fn query_email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>> {
        (**self).query_email_addresses(contact_id)
    }

    fn batch_delete(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize> {
        (**self).batch_delete(ids, bypass_sync_restriction)
    }
}
