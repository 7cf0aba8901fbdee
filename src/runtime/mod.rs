//! Runtime adapters and API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tick_driver;

pub use api::{health, list_tasks, Health, TaskSnapshot};
#[cfg(feature = "tokio-runtime")]
pub use tick_driver::TickDriver;
