//! tally-core — Core library for the tally project/version bookkeeper.
//!
//! Tally keeps a JSON **ledger** (project -> version -> file/commit
//! mapping) in lockstep with on-disk project directories and, when
//! enabled, with a git repository at the workspace root (one commit and
//! one tag per version). New version files are **seeded** from a prior
//! version, an external file, inline content, or a blank template.

pub mod error;
pub mod fsutil;
pub mod git;
pub mod ledger;
pub mod log;
pub mod report;
pub mod seed;
pub mod store;
pub mod workspace;

pub use error::{TallyError, TallyResult};
pub use workspace::Workspace;
