//! Session state and the loaded region data it refers to.

pub mod feature;
pub mod search;
pub mod view_state;

pub use feature::*;
pub use search::*;
pub use view_state::*;
