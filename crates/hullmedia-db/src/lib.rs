//! Hullmedia DB Library
//!
//! Persistence for the media catalog and the upload completion registry. Each store is a
//! trait with a PostgreSQL repository and an in-process implementation.

pub mod db;

pub use db::*;
