use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{DedupError, Result};
use crate::models::{ContactId, NewContact};

use super::database::Database;

/// Load contact records from a JSON file holding an array of [`NewContact`].
pub fn load_contacts(path: &Path) -> Result<Vec<NewContact>> {
    let contents = fs::read_to_string(path)?;
    let contacts: Vec<NewContact> = serde_json::from_str(&contents)?;
    Ok(contacts)
}

/// Import a JSON file of contacts into the database in one transaction.
/// Returns the ids of the inserted contacts in file order; if any record fails
/// to insert, nothing from the file is kept.
pub fn import_contacts(db: &Database, path: &Path) -> Result<Vec<ContactId>> {
    if !path.is_file() {
        return Err(DedupError::ValidationError(format!(
            "import file not found: {}",
            path.display()
        )));
    }

    let contacts = load_contacts(path)?;
    let unnamed = contacts
        .iter()
        .filter(|c| c.display_name.as_deref().is_none_or(str::is_empty))
        .count();
    if unnamed > 0 {
        warn!(unnamed, "importing contacts without a display name; dedup ignores them");
    }

    let ids = db.insert_contacts(&contacts)?;

    info!(count = ids.len(), path = %path.display(), "imported contacts");
    Ok(ids)
}
