pub mod fetch;
pub mod residency;
pub mod source;

pub use fetch::*;
pub use residency::*;
pub use source::*;
