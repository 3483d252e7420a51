#![forbid(unsafe_code)]

pub mod model;
pub mod policy;
pub mod progress;
pub mod time;

pub use policy::{PolicyError, ProgressPolicy};
pub use time::Clock;
