pub mod database;
pub mod import;
pub mod repositories;
mod store;

pub use store::{ContactOrder, ContactStore};
