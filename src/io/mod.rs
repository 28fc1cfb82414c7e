//! Input plumbing for ingest runs.

pub mod compression;

pub use compression::open_input;
