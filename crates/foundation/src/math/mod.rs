pub mod symlog;
pub mod vec;

pub use symlog::*;
pub use vec::*;
