mod connection;
mod migrations;
mod schema;

pub use connection::ContactConnection;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::{SCHEMA_VERSION, init_schema};

use std::path::Path;

use tracing::debug;

use crate::error::{DedupError, Result};
use crate::models::{Contact, ContactId, EmailAddress, NewContact, PhoneNumber};

use super::repositories::{ContactRepository, Repository, SqliteContactRepository};
use super::{ContactOrder, ContactStore};

/// SQLite-backed contact store.
pub struct Database {
    conn: ContactConnection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = ContactConnection::open(path)?;
        debug!(path = %path.display(), "opened contact database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: ContactConnection::open_in_memory()?,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.conn.path()
    }

    fn repo(&self) -> SqliteContactRepository<'_> {
        SqliteContactRepository::new(self.conn.lock())
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    pub fn insert_contact(&self, contact: &NewContact) -> Result<ContactId> {
        self.repo().insert(contact)
    }

    pub fn get_contact(&self, id: ContactId) -> Result<Contact> {
        self.repo()
            .find_by_id(&id)?
            .ok_or(DedupError::ContactNotFound(id))
    }

    /// Inserts all contacts atomically, returning their ids in input order.
    pub fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<ContactId>> {
        self.repo().insert_all(contacts)
    }

    pub fn list_contacts(&self, order: ContactOrder) -> Result<Vec<Contact>> {
        self.repo().list(order)
    }

    pub fn count_contacts(&self) -> Result<usize> {
        self.repo().count()
    }

    pub fn phone_numbers_of(&self, id: ContactId) -> Result<Vec<String>> {
        let phones = self.repo().phone_numbers(id)?;
        Ok(phones.iter().map(|p| p.value().to_string()).collect())
    }

    pub fn email_addresses_of(&self, id: ContactId) -> Result<Vec<String>> {
        let emails = self.repo().email_addresses(id)?;
        Ok(emails.iter().map(|e| e.value().to_string()).collect())
    }

    pub fn schema_versions(&self) -> Result<Vec<u32>> {
        get_applied_versions(&self.conn.lock())
    }
}

impl ContactStore for Database {
    fn query_contacts(&self, order: ContactOrder) -> Result<Vec<Contact>> {
        self.repo().list(order)
    }

    fn query_phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>> {
        self.repo().phone_numbers(contact_id)
    }

    fn query_email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>> {
        self.repo().email_addresses(contact_id)
    }

    fn batch_delete(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize> {
        self.repo().delete_many(ids, bypass_sync_restriction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn seeded() -> (Database, Vec<ContactId>) {
        let db = Database::open_in_memory().unwrap();
        let ids = vec![
            db.insert_contact(&NewContact::new("bob").with_email("b@x.com")).unwrap(),
            db.insert_contact(&NewContact::new("Alice").with_phone("555-1")).unwrap(),
            db.insert_contact(&NewContact::new("alice").with_phone("555-1")).unwrap(),
            db.insert_contact(&NewContact::unnamed().with_phone("555-9")).unwrap(),
        ];
        (db, ids)
    }

    #[test]
    fn test_insert_and_get_contact() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_contact(&NewContact::new("Alice").with_phone("555-1").with_email("a@x.com"))
            .unwrap();

        let contact = db.get_contact(id).unwrap();
        assert_eq!(contact.display_name.as_deref(), Some("Alice"));
        assert!(contact.has_phone_number);
        assert_eq!(db.query_phone_numbers(id).unwrap()[0].value(), "555-1");
        assert_eq!(db.query_email_addresses(id).unwrap()[0].value(), "a@x.com");
    }

    #[test]
    fn test_has_phone_number_is_derived() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_contact(&NewContact::new("Carol").with_email("c@x.com")).unwrap();
        assert!(!db.get_contact(id).unwrap().has_phone_number);
    }

    #[test]
    fn test_nocase_order_breaks_ties_by_id() {
        let (db, ids) = seeded();
        let listed: Vec<ContactId> = db
            .query_contacts(ContactOrder::DisplayNameNoCase)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        // NULL name sorts first, then "Alice"/"alice" by id, then "bob".
        assert_eq!(listed, vec![ids[3], ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_id_order() {
        let (db, ids) = seeded();
        let listed: Vec<ContactId> = db
            .list_contacts(ContactOrder::Id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_batch_delete_cascades_sub_records() {
        let (db, ids) = seeded();
        let deleted = db.batch_delete(&[ids[1], ids[0]], true).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.count_contacts().unwrap(), 2);
        assert!(db.query_phone_numbers(ids[1]).unwrap().is_empty());
        assert!(db.query_email_addresses(ids[0]).unwrap().is_empty());
    }

    #[test]
    fn test_batch_delete_ignores_missing_ids() {
        let (db, ids) = seeded();
        assert_eq!(db.batch_delete(&[ids[0], 9_999], true).unwrap(), 1);
    }

    #[test]
    fn test_sync_restricted_batch_is_rolled_back() {
        let db = Database::open_in_memory().unwrap();
        let plain = db.insert_contact(&NewContact::new("Dan")).unwrap();
        let owned = db
            .insert_contact(&NewContact::new("Dan").with_account("com.example.sync"))
            .unwrap();

        let err = db.batch_delete(&[plain, owned], false).unwrap_err();
        assert!(matches!(err, DedupError::SyncRestricted(id) if id == owned));
        assert_eq!(db.count_contacts().unwrap(), 2);

        assert_eq!(db.batch_delete(&[plain, owned], true).unwrap(), 2);
        assert_eq!(db.count_contacts().unwrap(), 0);
    }

    #[test]
    fn test_insert_contacts_is_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TRIGGER reject_mallory BEFORE INSERT ON contacts
             WHEN NEW.display_name = 'Mallory'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let batch = [
            NewContact::new("Alice").with_phone("555-1"),
            NewContact::new("Mallory"),
        ];
        assert!(db.insert_contacts(&batch).is_err());
        assert_eq!(db.count_contacts().unwrap(), 0);

        let ids = db.insert_contacts(&batch[..1]).unwrap();
        assert_eq!(db.get_contact(ids[0]).unwrap().name(), Some("Alice"));
    }

    #[test]
    fn test_readers_never_see_a_partial_batch_delete() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let batch: Vec<NewContact> = (0..200).map(|i| NewContact::new(format!("c{i}"))).collect();
        let ids = db.insert_contacts(&batch).unwrap();

        let writer = {
            let db = Arc::clone(&db);
            thread::spawn(move || db.batch_delete(&ids[1..], true).unwrap())
        };

        loop {
            let count = db.count_contacts().unwrap();
            assert!(count == 200 || count == 1, "observed {count} contacts mid-delete");
            if count == 1 {
                break;
            }
            thread::yield_now();
        }
        assert_eq!(writer.join().unwrap(), 199);
    }

    #[test]
    fn test_unknown_contact_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_contact(42), Err(DedupError::ContactNotFound(42))));
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_contact(&NewContact::new("Eve")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_contacts().unwrap(), 1);
        assert_eq!(db.schema_versions().unwrap(), vec![1, SCHEMA_VERSION]);
        assert!(db.path().is_some());
    }
}
