use serde::{Deserialize, Serialize};

use super::ContactId;

/// A phone number attached to a contact. The number column is nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub contact_id: ContactId,
    pub number: Option<String>,
}

/// An email address attached to a contact. The address column is nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub contact_id: ContactId,
    pub address: Option<String>,
}

impl PhoneNumber {
    pub fn value(&self) -> &str {
        self.number.as_deref().unwrap_or_default()
    }
}

impl EmailAddress {
    pub fn value(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }
}
