pub mod io;
pub mod request;

pub use io::*;
pub use request::*;
