pub mod dataset;
pub mod geojson;
pub mod topology;

pub use dataset::*;
pub use geojson::*;
pub use topology::*;
