mod contact_repository;

pub use contact_repository::{ContactRepository, SqliteContactRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
}
