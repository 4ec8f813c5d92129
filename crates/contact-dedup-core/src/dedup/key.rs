use std::fmt;

use serde::Serialize;

use crate::error::{DedupError, Result};
use crate::models::ContactId;
use crate::storage::ContactStore;

const PHONES_MARKER: &str = "|phones:";
const EMAILS_MARKER: &str = "|emails:";
const VALUE_SEPARATOR: &str = ",";

/// Comparison key of a contact: lower-cased name, sorted phone numbers and
/// sorted email addresses. Equal fingerprints mean duplicate contacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds fingerprints, looking up sub-records in the store on demand.
pub struct KeyBuilder<'a, S: ContactStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ContactStore + ?Sized> KeyBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Builds the fingerprint for one contact.
    ///
    /// Phone numbers are only queried when `has_phone_number` is set; the
    /// email section is always present, even when empty. A failed sub-query
    /// is returned as an error, never as a shorter key.
    pub fn build_key(
        &self,
        contact_id: ContactId,
        display_name: &str,
        has_phone_number: bool,
    ) -> Result<Fingerprint> {
        if display_name.is_empty() {
            return Err(DedupError::ValidationError(format!(
                "contact {contact_id} has no display name"
            )));
        }

        let mut key = display_name.to_lowercase();

        if has_phone_number {
            let phones = self.store.query_phone_numbers(contact_id)?;
            key.push_str(PHONES_MARKER);
            key.push_str(&join_sorted(phones.iter().map(|p| p.value())));
        }

        let emails = self.store.query_email_addresses(contact_id)?;
        key.push_str(EMAILS_MARKER);
        key.push_str(&join_sorted(emails.iter().map(|e| e.value())));

        Ok(Fingerprint(key))
    }
}

/// Byte-wise sort, then join.
fn join_sorted<'v>(values: impl Iterator<Item = &'v str>) -> String {
    let mut values: Vec<&str> = values.collect();
    values.sort_unstable();
    values.join(VALUE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::testing::FixtureStore;

    #[test]
    fn test_key_with_phones_and_no_emails() {
        let store = FixtureStore::new().contact(1, Some("Alice"), &["555-1"], &[]);
        let key = KeyBuilder::new(&store).build_key(1, "Alice", true).unwrap();
        assert_eq!(key.as_str(), "alice|phones:555-1|emails:");
    }

    #[test]
    fn test_key_without_phone_flag_skips_phone_query() {
        let store = FixtureStore::new().contact(3, Some("Bob"), &["555-3"], &["b@x.com"]);
        let key = KeyBuilder::new(&store).build_key(3, "Bob", false).unwrap();
        assert_eq!(key.as_str(), "bob|emails:b@x.com");
        assert_eq!(store.phone_queries(), 0);
        assert_eq!(store.email_queries(), 1);
    }

    #[test]
    fn test_key_is_independent_of_sub_record_order() {
        let forward = FixtureStore::new().contact(
            1,
            Some("Carol"),
            &["555-2", "555-1", "+1 555"],
            &["z@x.com", "a@x.com"],
        );
        let reversed = FixtureStore::new().contact(
            1,
            Some("Carol"),
            &["+1 555", "555-1", "555-2"],
            &["a@x.com", "z@x.com"],
        );

        let a = KeyBuilder::new(&forward).build_key(1, "Carol", true).unwrap();
        let b = KeyBuilder::new(&reversed).build_key(1, "Carol", true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "carol|phones:+1 555,555-1,555-2|emails:a@x.com,z@x.com");
    }

    #[test]
    fn test_null_values_become_empty_strings() {
        let store = FixtureStore::new()
            .contact(1, Some("Dan"), &["555-1"], &[])
            .with_null_phone(1)
            .with_null_email(1);
        let key = KeyBuilder::new(&store).build_key(1, "Dan", true).unwrap();
        assert_eq!(key.as_str(), "dan|phones:,555-1|emails:");
    }

    #[test]
    fn test_phone_flag_without_rows_gives_empty_phone_section() {
        let store = FixtureStore::new().contact(1, Some("Eve"), &[], &[]);
        let key = KeyBuilder::new(&store).build_key(1, "Eve", true).unwrap();
        assert_eq!(key.as_str(), "eve|phones:|emails:");
    }

    #[test]
    fn test_lowercasing_is_unicode_aware() {
        let store = FixtureStore::new().contact(1, Some("ÉVA"), &[], &[]);
        let key = KeyBuilder::new(&store).build_key(1, "ÉVA", false).unwrap();
        assert_eq!(key.as_str(), "éva|emails:");
    }

    #[test]
    fn test_failed_email_query_is_an_error() {
        let store = FixtureStore::new()
            .contact(1, Some("Frank"), &[], &[])
            .failing_emails_for(1);
        let err = KeyBuilder::new(&store).build_key(1, "Frank", false).unwrap_err();
        assert!(matches!(err, DedupError::QueryFailure { what: "email_addresses", .. }));
    }

    #[test]
    fn test_failed_phone_query_is_an_error() {
        let store = FixtureStore::new()
            .contact(1, Some("Grace"), &["555-1"], &[])
            .failing_phones_for(1);
        let err = KeyBuilder::new(&store).build_key(1, "Grace", true).unwrap_err();
        assert!(matches!(err, DedupError::QueryFailure { what: "phone_numbers", .. }));
        assert_eq!(store.email_queries(), 0);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let store = FixtureStore::new();
        assert!(KeyBuilder::new(&store).build_key(1, "", false).is_err());
    }
}
