pub mod events;
pub mod health;

pub use events::storage_event_handler;
pub use health::health_handler;
