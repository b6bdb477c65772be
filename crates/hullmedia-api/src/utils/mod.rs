pub mod range;
pub mod tus_metadata;
