pub mod config;
pub mod event_bus;
pub mod input;
pub mod viewer;

pub use config::*;
pub use event_bus::*;
pub use input::*;
pub use viewer::*;
