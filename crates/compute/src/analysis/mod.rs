pub mod correlation;
pub mod ranking;
pub mod statistics;
pub mod temporal;

pub use correlation::*;
pub use ranking::*;
pub use statistics::*;
pub use temporal::*;
