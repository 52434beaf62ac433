pub mod correlation;
pub mod layer;
pub mod map;
pub mod ranking;
pub mod scale;
pub mod symbology;
pub mod threshold;

pub use correlation::*;
pub use layer::*;
pub use map::*;
pub use ranking::*;
pub use scale::*;
pub use symbology::*;
pub use threshold::*;
