//! Shared data models for the router

mod outcome;
mod target;
mod tool;

pub use outcome::*;
pub use target::*;
pub use tool::*;
