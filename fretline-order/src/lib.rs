pub mod lifecycle;
pub mod models;
pub mod repository;

pub use lifecycle::{DraftLine, OrderError, OrderLifecycleManager};
pub use models::{Order, OrderLine, OrderStatus, StatusEntry};
pub use repository::OrderRepository;
