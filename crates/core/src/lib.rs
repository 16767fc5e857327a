#![forbid(unsafe_code)]

pub mod fallback;
pub mod model;
pub mod time;

pub use time::Clock;
