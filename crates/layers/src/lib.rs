pub mod clip;
pub mod framing;
pub mod graticule;
pub mod indicatrix;
pub mod layer;
pub mod path;
pub mod renderer;
pub mod symbology;

pub use framing::*;
pub use graticule::Graticule;
pub use layer::*;
pub use path::*;
pub use renderer::*;
pub use symbology::*;
