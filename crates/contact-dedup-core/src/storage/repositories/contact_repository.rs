use std::sync::MutexGuard;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{DedupError, Result};
use crate::models::{Contact, ContactId, EmailAddress, NewContact, PhoneNumber};
use crate::storage::ContactOrder;

use super::Repository;

const CONTACT_COLUMNS: &str = "c.id, c.display_name, c.account_type,
    EXISTS(SELECT 1 FROM phone_numbers p WHERE p.contact_id = c.id) AS has_phone_number";

pub trait ContactRepository: Repository<Entity = Contact, Id = ContactId> {
    fn insert(&self, contact: &NewContact) -> Result<ContactId>;
    fn insert_all(&self, contacts: &[NewContact]) -> Result<Vec<ContactId>>;
    fn list(&self, order: ContactOrder) -> Result<Vec<Contact>>;
    fn count(&self) -> Result<usize>;
    fn phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>>;
    fn email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>>;
    fn delete_many(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize>;
}

pub struct SqliteContactRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteContactRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
        Ok(Contact {
            id: row.get(0)?,
            display_name: row.get(1)?,
            account_type: row.get(2)?,
            has_phone_number: row.get(3)?,
        })
    }

    fn select_contacts(&self, order: ContactOrder) -> rusqlite::Result<Vec<Contact>> {
        let order_by = match order {
            ContactOrder::DisplayNameNoCase => "c.display_name COLLATE NOCASE, c.id",
            ContactOrder::Id => "c.id",
        };
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts c ORDER BY {order_by}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_contact)?;
        rows.collect()
    }

    fn select_phone_numbers(&self, contact_id: ContactId) -> rusqlite::Result<Vec<PhoneNumber>> {
        let mut stmt = self
            .conn
            .prepare("SELECT contact_id, number FROM phone_numbers WHERE contact_id = ?1")?;
        let rows = stmt.query_map(params![contact_id], |row| {
            Ok(PhoneNumber {
                contact_id: row.get(0)?,
                number: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    fn select_email_addresses(&self, contact_id: ContactId) -> rusqlite::Result<Vec<EmailAddress>> {
        let mut stmt = self
            .conn
            .prepare("SELECT contact_id, address FROM email_addresses WHERE contact_id = ?1")?;
        let rows = stmt.query_map(params![contact_id], |row| {
            Ok(EmailAddress {
                contact_id: row.get(0)?,
                address: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    fn insert_row(conn: &Connection, contact: &NewContact) -> rusqlite::Result<ContactId> {
        conn.execute(
            "INSERT INTO contacts (display_name, account_type, created_at) VALUES (?1, ?2, ?3)",
            params![
                contact.display_name,
                contact.account_type,
                Utc::now().to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();

        for number in &contact.phones {
            conn.execute(
                "INSERT INTO phone_numbers (contact_id, number) VALUES (?1, ?2)",
                params![id, number],
            )?;
        }
        for address in &contact.emails {
            conn.execute(
                "INSERT INTO email_addresses (contact_id, address) VALUES (?1, ?2)",
                params![id, address],
            )?;
        }
        Ok(id)
    }

    fn account_type(&self, id: ContactId) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT account_type FROM contacts WHERE id = ?1",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map(Option::flatten)
    }
}

impl<'a> Repository for SqliteContactRepository<'a> {
    type Entity = Contact;
    type Id = ContactId;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.id = ?1");
        let contact = self
            .conn
            .query_row(&sql, params![id], Self::row_to_contact)
            .optional()
            .map_err(DedupError::query("contacts"))?;
        Ok(contact)
    }
}

impl<'a> ContactRepository for SqliteContactRepository<'a> {
    fn insert(&self, contact: &NewContact) -> Result<ContactId> {
        let tx = self.conn.unchecked_transaction()?;
        let id = Self::insert_row(&tx, contact)?;
        tx.commit()?;
        Ok(id)
    }

    /// Inserts every contact inside one transaction; on failure none of them
    /// are kept.
    fn insert_all(&self, contacts: &[NewContact]) -> Result<Vec<ContactId>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = contacts
            .iter()
            .map(|contact| Self::insert_row(&tx, contact))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
    }

    fn list(&self, order: ContactOrder) -> Result<Vec<Contact>> {
        self.select_contacts(order)
            .map_err(DedupError::query("contacts"))
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
            .map_err(DedupError::query("contacts"))?;
        Ok(count as usize)
    }

    fn phone_numbers(&self, contact_id: ContactId) -> Result<Vec<PhoneNumber>> {
        self.select_phone_numbers(contact_id)
            .map_err(DedupError::query("phone_numbers"))
    }

    fn email_addresses(&self, contact_id: ContactId) -> Result<Vec<EmailAddress>> {
        self.select_email_addresses(contact_id)
            .map_err(DedupError::query("email_addresses"))
    }

    /// Deletes all ids inside one transaction. Any failure, including a
    /// sync-restricted contact without the bypass flag, rolls back the whole
    /// batch.
    fn delete_many(&self, ids: &[ContactId], bypass_sync_restriction: bool) -> Result<usize> {
        let batch_err = |e: rusqlite::Error| DedupError::BatchWriteFailure(e.to_string());

        let tx = self.conn.unchecked_transaction().map_err(batch_err)?;
        let mut deleted = 0;
        for id in ids {
            if !bypass_sync_restriction && self.account_type(*id).map_err(batch_err)?.is_some() {
                return Err(DedupError::SyncRestricted(*id));
            }
            deleted += tx
                .execute("DELETE FROM contacts WHERE id = ?1", params![id])
                .map_err(batch_err)?;
        }
        tx.commit().map_err(batch_err)?;

        Ok(deleted)
    }
}
