pub mod config;
pub mod coordinator;
pub mod dataset;
pub mod event_bus;
pub mod state;

pub use config::*;
pub use coordinator::*;
pub use dataset::*;
pub use event_bus::*;
pub use state::*;
