pub mod service;

pub use service::{Download, MediaService, Resolution};
