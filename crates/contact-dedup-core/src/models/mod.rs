pub mod contact;
pub mod detail;

pub use contact::*;
pub use detail::*;
