use rusqlite::Connection;

use super::Migration;
use crate::error::Result;

pub struct V2SyncAccount;

impl Migration for V2SyncAccount {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Add account_type column marking contacts owned by a sync account"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        let has_account_type: bool = conn
            .prepare("SELECT 1 FROM pragma_table_info('contacts') WHERE name='account_type'")?
            .exists([])?;

        if !has_account_type {
            conn.execute_batch("ALTER TABLE contacts ADD COLUMN account_type TEXT;")?;
        }
        Ok(())
    }
}
