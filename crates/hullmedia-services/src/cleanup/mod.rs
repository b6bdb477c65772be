pub mod service;

pub use service::{SessionSweeper, SweepReport};
