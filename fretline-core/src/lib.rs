pub mod account;
pub mod identity;
pub mod repository;

pub use account::{Account, Tier};
pub use identity::{Principal, Role};
pub use repository::{AccountDirectory, StoreError};
