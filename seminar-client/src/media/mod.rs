mod capture;
mod constraints;
mod controller;
mod source;
mod synthetic;

pub use capture::*;
pub use constraints::*;
pub use controller::*;
pub use source::*;
pub use synthetic::*;
