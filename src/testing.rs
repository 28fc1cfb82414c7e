//! Helpers for testing code that ingests rosters.
//!
//! - **Fixtures**: ready-made records and measurement maps
//! - **Roster files**: [`RosterFileBuilder`] writes delimited input files,
//!   including deliberately broken rows
//! - **Assertions**: compare a store or an error report against expectations
//!
//! # Quick Start
//!
//! ```no_run
//! use rollcall::ingest::ingest;
//! use rollcall::store::ShardedStore;
//! use rollcall::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let (_dir, path) = RosterFileBuilder::new()
//!     .records(&sample_roster())
//!     .raw_line("Broken,20,Male,A1,002")
//!     .write_temp("roster.csv")?;
//!
//! let store = ShardedStore::new();
//! let report = ingest(&path, &store);
//!
//! assert_error_lines(&report, &[7]);
//! assert_store_contains(&store, &sample_roster());
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
mod roster;

pub use assertions::*;
pub use fixtures::*;
pub use roster::{ROSTER_HEADER, RosterFileBuilder};
