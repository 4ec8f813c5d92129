use serde::{Deserialize, Serialize};

pub type ContactId = i64;

/// One row of the contacts table as seen by the dedup pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub has_phone_number: bool,

    /// Sync account that owns this contact. Owned contacts can only be
    /// deleted with the sync bypass flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

impl Contact {
    /// The display name, or `None` when it is absent or empty.
    pub fn name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn is_sync_restricted(&self) -> bool {
        self.account_type.is_some()
    }
}

/// Input record for creating a contact together with its sub-records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub phones: Vec<Option<String>>,

    #[serde(default)]
    pub emails: Vec<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

impl NewContact {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Default::default()
        }
    }

    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn with_phone(mut self, number: impl Into<String>) -> Self {
        self.phones.push(Some(number.into()));
        self
    }

    pub fn with_email(mut self, address: impl Into<String>) -> Self {
        self.emails.push(Some(address.into()));
        self
    }

    pub fn with_account(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = Some(account_type.into());
        self
    }
}
